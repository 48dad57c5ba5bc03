//! Built-in auth provider for the local backend.
//!
//! Accounts live in `auth_users` with a salted PBKDF2-SHA256 password hash; sign-in
//! issues an opaque access/refresh token pair stored in `auth_sessions`.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use sha2::Sha256;

use super::types::{enum_col, ts_col, ts_to_sql};
use super::{DbError, LocalDb};
use crate::types::{AuthUser, Role, Session, SignUpMetadata};

/// Access token lifetime, matching the hosted provider's default.
pub const SESSION_TTL_SECS: i64 = 3600;

/// A row from `auth_users` (without the credential columns).
#[derive(Debug, Clone, PartialEq)]
pub struct DbUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub email_confirmed_at: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DbUser {
    pub fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            email_confirmed_at: self.email_confirmed_at.clone(),
        }
    }
}

/// PBKDF2 iteration count for new hashes. Each hash records its own count.
#[cfg(not(test))]
const PBKDF2_ROUNDS: u32 = 600_000;
#[cfg(test)]
const PBKDF2_ROUNDS: u32 = 1_000;

const HASH_SCHEME: &str = "pbkdf2-sha256";

fn derive_key(salt: &str, password: &str, rounds: u32) -> String {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), rounds, &mut key);
    hex::encode(key)
}

/// Encoded as `pbkdf2-sha256$<rounds>$<hex key>`.
fn hash_password(salt: &str, password: &str) -> String {
    format!(
        "{}${}${}",
        HASH_SCHEME,
        PBKDF2_ROUNDS,
        derive_key(salt, password, PBKDF2_ROUNDS)
    )
}

fn password_matches(stored: &str, salt: &str, password: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(HASH_SCHEME), Some(rounds), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    match rounds.parse::<u32>() {
        Ok(rounds) if rounds > 0 => timing_safe_eq(&derive_key(salt, password, rounds), expected),
        _ => false,
    }
}

fn timing_safe_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut out = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        out |= x ^ y;
    }
    out == 0
}

const USER_COLUMNS: &str = "id, email, full_name, role, email_confirmed_at, created_at";

impl LocalDb {
    // =========================================================================
    // Local auth
    // =========================================================================

    fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DbUser> {
        Ok(DbUser {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            role: enum_col(row, 3)?,
            email_confirmed_at: row.get(4)?,
            created_at: ts_col(row, 5)?,
        })
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<DbUser>, DbError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM auth_users WHERE email = ?1"),
                params![email.trim()],
                Self::map_user_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<DbUser>, DbError> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM auth_users WHERE id = ?1"),
                params![id],
                Self::map_user_row,
            )
            .optional()?;
        Ok(user)
    }

    /// Register an account. Local accounts are confirmed immediately.
    pub fn create_user(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<DbUser, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let salt = uuid::Uuid::new_v4().simple().to_string();
        let now = ts_to_sql(&Utc::now());

        self.conn.execute(
            "INSERT INTO auth_users (id, email, password_hash, salt, full_name, role,
                                     email_confirmed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                id,
                email.trim(),
                hash_password(&salt, password),
                salt,
                metadata.full_name,
                metadata.role.as_str(),
                now,
            ],
        )?;

        self.get_user(&id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Return the account if the password matches.
    pub fn verify_password(&self, email: &str, password: &str) -> Result<Option<DbUser>, DbError> {
        let creds: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT id, password_hash, salt FROM auth_users WHERE email = ?1",
                params![email.trim()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match creds {
            Some((id, stored, salt)) if password_matches(&stored, &salt, password) => {
                self.get_user(&id)
            }
            _ => Ok(None),
        }
    }

    /// Issue a fresh token pair for a user.
    pub fn create_session(&self, user: &DbUser) -> Result<Session, DbError> {
        let now = Utc::now();
        let session = Session {
            access_token: uuid::Uuid::new_v4().simple().to_string(),
            refresh_token: uuid::Uuid::new_v4().simple().to_string(),
            expires_at: (now + Duration::seconds(SESSION_TTL_SECS)).timestamp(),
            user: user.to_auth_user(),
        };
        self.conn.execute(
            "INSERT INTO auth_sessions (access_token, refresh_token, user_id, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.access_token,
                session.refresh_token,
                user.id,
                session.expires_at,
                ts_to_sql(&now),
            ],
        )?;
        Ok(session)
    }

    /// Resolve an unexpired access token to its user.
    pub fn session_user(&self, access_token: &str) -> Result<Option<DbUser>, DbError> {
        let user_id: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM auth_sessions WHERE access_token = ?1 AND expires_at > ?2",
                params![access_token, Utc::now().timestamp()],
                |row| row.get(0),
            )
            .optional()?;
        match user_id {
            Some(id) => self.get_user(&id),
            None => Ok(None),
        }
    }

    /// Exchange a refresh token for a new session. The old pair is revoked.
    pub fn refresh_session(&self, refresh_token: &str) -> Result<Option<Session>, DbError> {
        let user_id: Option<String> = self
            .conn
            .query_row(
                "SELECT user_id FROM auth_sessions WHERE refresh_token = ?1",
                params![refresh_token],
                |row| row.get(0),
            )
            .optional()?;
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        let Some(user) = self.get_user(&user_id)? else {
            return Ok(None);
        };

        self.with_transaction(|db| {
            db.conn.execute(
                "DELETE FROM auth_sessions WHERE refresh_token = ?1",
                params![refresh_token],
            )?;
            db.create_session(&user).map(Some)
        })
    }

    pub fn delete_session(&self, access_token: &str) -> Result<(), DbError> {
        self.conn.execute(
            "DELETE FROM auth_sessions WHERE access_token = ?1",
            params![access_token],
        )?;
        Ok(())
    }

    /// Create the profile row for an account if it does not exist yet,
    /// copying name, e-mail and role from the sign-up metadata.
    pub fn ensure_profile_exists(&self, user_id: &str) -> Result<bool, DbError> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO profiles (id, full_name, email, role, created_at)
             SELECT id, full_name, email, role, created_at FROM auth_users WHERE id = ?1",
            params![user_id],
        )?;
        Ok(inserted > 0)
    }
}
