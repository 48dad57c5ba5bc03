use rusqlite::{params, OptionalExtension};

use super::types::{enum_col, ts_col, ts_to_sql};
use super::{DbError, LocalDb};
use crate::types::{Profile, ProfileUpdate};

impl LocalDb {
    // =========================================================================
    // Profiles
    // =========================================================================

    pub(crate) fn map_profile_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            full_name: row.get(1)?,
            email: row.get(2)?,
            role: enum_col(row, 3)?,
            phone: row.get(4)?,
            avatar_url: row.get(5)?,
            created_at: ts_col(row, 6)?,
        })
    }

    pub fn insert_profile(&self, profile: &Profile) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO profiles (id, full_name, email, role, phone, avatar_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                profile.id,
                profile.full_name,
                profile.email,
                profile.role.as_str(),
                profile.phone,
                profile.avatar_url,
                ts_to_sql(&profile.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn get_profile(&self, id: &str) -> Result<Option<Profile>, DbError> {
        let profile = self
            .conn
            .query_row(
                "SELECT id, full_name, email, role, phone, avatar_url, created_at
                 FROM profiles WHERE id = ?1",
                params![id],
                Self::map_profile_row,
            )
            .optional()?;
        Ok(profile)
    }

    /// Team listing order: newest member first.
    pub fn get_profiles_newest_first(&self) -> Result<Vec<Profile>, DbError> {
        self.query_profiles(
            "SELECT id, full_name, email, role, phone, avatar_url, created_at
             FROM profiles ORDER BY created_at DESC",
        )
    }

    /// Assignee picker order: alphabetical by full name.
    pub fn get_profiles_by_name(&self) -> Result<Vec<Profile>, DbError> {
        self.query_profiles(
            "SELECT id, full_name, email, role, phone, avatar_url, created_at
             FROM profiles ORDER BY full_name COLLATE NOCASE ASC",
        )
    }

    fn query_profiles(&self, sql: &str) -> Result<Vec<Profile>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], Self::map_profile_row)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row?);
        }
        Ok(profiles)
    }

    /// Overwrite the settings-form columns. Returns the number of rows touched.
    pub fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<usize, DbError> {
        let changed = self.conn.execute(
            "UPDATE profiles SET full_name = ?1, avatar_url = ?2 WHERE id = ?3",
            params![update.full_name, update.avatar_url, id],
        )?;
        Ok(changed)
    }
}
