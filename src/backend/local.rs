//! Backend over the embedded SQLite store.
//!
//! Speaks the same contract as the hosted service, including its built-in
//! auth: every data call first resolves the session's access token and fails
//! with `NotAuthenticated` when it is unknown or expired.

use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Backend, ProfileOrder};
use crate::db::LocalDb;
use crate::error::DeskError;
use crate::types::{
    Lead, LeadStatus, NewLead, NewReminder, Profile, ProfileUpdate, Reminder, Session,
    SignUpMetadata, SignUpOutcome,
};

/// Same floor the hosted auth provider enforces.
const MIN_PASSWORD_LEN: usize = 6;

pub struct LocalBackend {
    db: Mutex<LocalDb>,
}

impl LocalBackend {
    pub fn new(db: LocalDb) -> Self {
        Self { db: Mutex::new(db) }
    }

    /// Open the database at `path`, or the default location when `None`.
    pub fn open(path: Option<PathBuf>) -> Result<Self, DeskError> {
        let db = match path {
            Some(path) => LocalDb::open_at(path)?,
            None => LocalDb::open()?,
        };
        Ok(Self::new(db))
    }

    /// Run `f` against the store on behalf of a signed-in user.
    fn with_user<T>(
        &self,
        session: &Session,
        f: impl FnOnce(&LocalDb) -> Result<T, DeskError>,
    ) -> Result<T, DeskError> {
        let db = self.db.lock();
        if db.session_user(&session.access_token)?.is_none() {
            return Err(DeskError::NotAuthenticated);
        }
        f(&db)
    }
}

fn invalid_credentials() -> DeskError {
    DeskError::Api {
        status: 400,
        message: "Invalid login credentials".into(),
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DeskError> {
        let db = self.db.lock();
        let user = db
            .verify_password(email, password)?
            .ok_or_else(invalid_credentials)?;
        log::info!("Local sign-in for {}", user.email);
        Ok(db.create_session(&user)?)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpOutcome, DeskError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DeskError::Api {
                status: 422,
                message: format!("Password should be at least {} characters", MIN_PASSWORD_LEN),
            });
        }

        let db = self.db.lock();
        if db.find_user_by_email(email)?.is_some() {
            return Err(DeskError::Api {
                status: 422,
                message: "User already registered".into(),
            });
        }

        let user = db.create_user(email, password, metadata)?;
        let session = db.create_session(&user)?;
        Ok(SignUpOutcome {
            user: user.to_auth_user(),
            session: Some(session),
        })
    }

    async fn sign_out(&self, session: &Session) -> Result<(), DeskError> {
        self.db.lock().delete_session(&session.access_token)?;
        Ok(())
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, DeskError> {
        self.db
            .lock()
            .refresh_session(&session.refresh_token)?
            .ok_or(DeskError::Api {
                status: 400,
                message: "Invalid Refresh Token".into(),
            })
    }

    async fn ensure_profile_exists(
        &self,
        session: Option<&Session>,
        user_id: &str,
    ) -> Result<(), DeskError> {
        let db = self.db.lock();
        if let Some(session) = session {
            if db.session_user(&session.access_token)?.is_none() {
                return Err(DeskError::NotAuthenticated);
            }
        }
        if db.ensure_profile_exists(user_id)? {
            log::info!("Created profile for {}", user_id);
        }
        Ok(())
    }

    async fn get_profile(&self, session: &Session, id: &str) -> Result<Option<Profile>, DeskError> {
        self.with_user(session, |db| Ok(db.get_profile(id)?))
    }

    async fn list_profiles(
        &self,
        session: &Session,
        order: ProfileOrder,
    ) -> Result<Vec<Profile>, DeskError> {
        self.with_user(session, |db| {
            let profiles = match order {
                ProfileOrder::NewestFirst => db.get_profiles_newest_first()?,
                ProfileOrder::ByName => db.get_profiles_by_name()?,
            };
            Ok(profiles)
        })
    }

    async fn update_profile(
        &self,
        session: &Session,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), DeskError> {
        self.with_user(session, |db| match db.update_profile(id, update)? {
            0 => Err(DeskError::NotFound(format!("profile {}", id))),
            _ => Ok(()),
        })
    }

    async fn list_leads(&self, session: &Session) -> Result<Vec<Lead>, DeskError> {
        self.with_user(session, |db| Ok(db.get_leads_newest_first()?))
    }

    async fn get_lead(&self, session: &Session, id: &str) -> Result<Option<Lead>, DeskError> {
        self.with_user(session, |db| Ok(db.get_lead(id)?))
    }

    async fn insert_lead(&self, session: &Session, lead: &NewLead) -> Result<(), DeskError> {
        self.with_user(session, |db| {
            let id = uuid::Uuid::new_v4().to_string();
            db.insert_lead(&id, lead)?;
            log::debug!("Inserted lead {}", id);
            Ok(())
        })
    }

    async fn assign_leads(
        &self,
        session: &Session,
        ids: &[String],
        assignee: &str,
    ) -> Result<(), DeskError> {
        self.with_user(session, |db| {
            let changed = db.assign_leads(ids, assignee)?;
            log::debug!("Assigned {} of {} leads to {}", changed, ids.len(), assignee);
            Ok(())
        })
    }

    async fn update_lead_status(
        &self,
        session: &Session,
        id: &str,
        status: LeadStatus,
    ) -> Result<(), DeskError> {
        self.with_user(session, |db| match db.update_lead_status(id, status)? {
            0 => Err(DeskError::NotFound(format!("lead {}", id))),
            _ => Ok(()),
        })
    }

    async fn count_leads(
        &self,
        session: &Session,
        assignee: &str,
        status: Option<LeadStatus>,
    ) -> Result<usize, DeskError> {
        self.with_user(session, |db| Ok(db.count_leads(assignee, status)?))
    }

    async fn list_reminders(&self, session: &Session) -> Result<Vec<Reminder>, DeskError> {
        self.with_user(session, |db| Ok(db.get_reminders_by_due_date()?))
    }

    async fn get_reminder(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Option<Reminder>, DeskError> {
        self.with_user(session, |db| Ok(db.get_reminder(id)?))
    }

    async fn insert_reminder(
        &self,
        session: &Session,
        reminder: &NewReminder,
    ) -> Result<(), DeskError> {
        self.with_user(session, |db| {
            let id = uuid::Uuid::new_v4().to_string();
            db.insert_reminder(&id, reminder)?;
            Ok(())
        })
    }

    async fn set_reminder_completed(
        &self,
        session: &Session,
        id: &str,
        completed: bool,
    ) -> Result<(), DeskError> {
        self.with_user(session, |db| {
            match db.set_reminder_completed(id, completed)? {
                0 => Err(DeskError::NotFound(format!("reminder {}", id))),
                _ => Ok(()),
            }
        })
    }
}

#[cfg(test)]
pub mod test_utils {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::LocalBackend;
    use crate::backend::{Backend, ProfileOrder};
    use crate::db::test_utils::test_db;
    use crate::db::LocalDb;
    use crate::error::DeskError;
    use crate::types::{
        Lead, LeadStatus, NewLead, NewReminder, Profile, ProfileUpdate, Reminder, Role, Session,
        SignUpMetadata, SignUpOutcome,
    };

    pub fn test_backend() -> LocalBackend {
        LocalBackend::new(test_db())
    }

    /// Reach past the auth check, for seeding and corrupting fixtures.
    pub fn with_db<T>(backend: &LocalBackend, f: impl FnOnce(&LocalDb) -> T) -> T {
        f(&backend.db.lock())
    }

    /// Register a user with a profile and return their session.
    pub async fn signed_in(backend: &LocalBackend, email: &str, name: &str, role: Role) -> Session {
        let outcome = backend
            .sign_up(
                email,
                "password123",
                &SignUpMetadata {
                    full_name: name.to_string(),
                    role,
                },
            )
            .await
            .expect("sign up");
        let session = outcome.session.expect("local sign-up signs in");
        backend
            .ensure_profile_exists(Some(&session), &session.user.id)
            .await
            .expect("profile");
        session
    }

    /// Which calls [`FlakyBackend`] fails.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Faults {
        pub list_profiles: bool,
        pub count_leads: bool,
    }

    /// Delegates to a local backend, except for the calls named in `faults`,
    /// which fail with a server error.
    pub struct FlakyBackend {
        pub inner: Arc<LocalBackend>,
        pub faults: Faults,
    }

    fn server_error(what: &str) -> DeskError {
        DeskError::Api {
            status: 500,
            message: format!("{} failed", what),
        }
    }

    #[async_trait]
    impl Backend for FlakyBackend {
        async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DeskError> {
            self.inner.sign_in(email, password).await
        }

        async fn sign_up(
            &self,
            email: &str,
            password: &str,
            metadata: &SignUpMetadata,
        ) -> Result<SignUpOutcome, DeskError> {
            self.inner.sign_up(email, password, metadata).await
        }

        async fn sign_out(&self, session: &Session) -> Result<(), DeskError> {
            self.inner.sign_out(session).await
        }

        async fn refresh_session(&self, session: &Session) -> Result<Session, DeskError> {
            self.inner.refresh_session(session).await
        }

        async fn ensure_profile_exists(
            &self,
            session: Option<&Session>,
            user_id: &str,
        ) -> Result<(), DeskError> {
            self.inner.ensure_profile_exists(session, user_id).await
        }

        async fn get_profile(
            &self,
            session: &Session,
            id: &str,
        ) -> Result<Option<Profile>, DeskError> {
            self.inner.get_profile(session, id).await
        }

        async fn list_profiles(
            &self,
            session: &Session,
            order: ProfileOrder,
        ) -> Result<Vec<Profile>, DeskError> {
            if self.faults.list_profiles {
                return Err(server_error("profiles"));
            }
            self.inner.list_profiles(session, order).await
        }

        async fn update_profile(
            &self,
            session: &Session,
            id: &str,
            update: &ProfileUpdate,
        ) -> Result<(), DeskError> {
            self.inner.update_profile(session, id, update).await
        }

        async fn list_leads(&self, session: &Session) -> Result<Vec<Lead>, DeskError> {
            self.inner.list_leads(session).await
        }

        async fn get_lead(&self, session: &Session, id: &str) -> Result<Option<Lead>, DeskError> {
            self.inner.get_lead(session, id).await
        }

        async fn insert_lead(&self, session: &Session, lead: &NewLead) -> Result<(), DeskError> {
            self.inner.insert_lead(session, lead).await
        }

        async fn assign_leads(
            &self,
            session: &Session,
            ids: &[String],
            assignee: &str,
        ) -> Result<(), DeskError> {
            self.inner.assign_leads(session, ids, assignee).await
        }

        async fn update_lead_status(
            &self,
            session: &Session,
            id: &str,
            status: LeadStatus,
        ) -> Result<(), DeskError> {
            self.inner.update_lead_status(session, id, status).await
        }

        async fn count_leads(
            &self,
            session: &Session,
            assignee: &str,
            status: Option<LeadStatus>,
        ) -> Result<usize, DeskError> {
            if self.faults.count_leads {
                return Err(server_error("count"));
            }
            self.inner.count_leads(session, assignee, status).await
        }

        async fn list_reminders(&self, session: &Session) -> Result<Vec<Reminder>, DeskError> {
            self.inner.list_reminders(session).await
        }

        async fn get_reminder(
            &self,
            session: &Session,
            id: &str,
        ) -> Result<Option<Reminder>, DeskError> {
            self.inner.get_reminder(session, id).await
        }

        async fn insert_reminder(
            &self,
            session: &Session,
            reminder: &NewReminder,
        ) -> Result<(), DeskError> {
            self.inner.insert_reminder(session, reminder).await
        }

        async fn set_reminder_completed(
            &self,
            session: &Session,
            id: &str,
            completed: bool,
        ) -> Result<(), DeskError> {
            self.inner.set_reminder_completed(session, id, completed).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::{signed_in, test_backend};
    use super::*;
    use crate::db::test_utils::sample_lead;
    use crate::types::Role;

    #[tokio::test]
    async fn test_sign_in_rejects_bad_password() {
        let backend = test_backend();
        signed_in(&backend, "amy@company.com", "Amy", Role::SalesAssociate).await;

        let err = backend
            .sign_in("amy@company.com", "nope")
            .await
            .expect_err("bad password");
        assert_eq!(err.to_string(), "Invalid login credentials");

        let session = backend
            .sign_in("amy@company.com", "password123")
            .await
            .expect("sign in");
        assert_eq!(session.user.email.as_deref(), Some("amy@company.com"));
    }

    #[tokio::test]
    async fn test_sign_up_rules() {
        let backend = test_backend();
        let metadata = SignUpMetadata {
            full_name: "Amy".into(),
            role: Role::SalesAssociate,
        };
        let short = backend
            .sign_up("amy@company.com", "abc", &metadata)
            .await
            .expect_err("short password");
        assert!(short.to_string().contains("at least 6"));

        backend
            .sign_up("amy@company.com", "password123", &metadata)
            .await
            .expect("first");
        let dup = backend
            .sign_up("amy@company.com", "password123", &metadata)
            .await
            .expect_err("duplicate");
        assert_eq!(dup.to_string(), "User already registered");
    }

    #[tokio::test]
    async fn test_data_calls_require_live_session() {
        let backend = test_backend();
        let session = signed_in(&backend, "amy@company.com", "Amy", Role::Admin).await;
        assert!(backend.list_leads(&session).await.expect("list").is_empty());

        backend.sign_out(&session).await.expect("sign out");
        let err = backend.list_leads(&session).await.expect_err("signed out");
        assert!(matches!(err, DeskError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_refresh_issues_new_tokens() {
        let backend = test_backend();
        let session = signed_in(&backend, "amy@company.com", "Amy", Role::Admin).await;
        let refreshed = backend.refresh_session(&session).await.expect("refresh");
        assert_ne!(refreshed.access_token, session.access_token);
        assert!(backend.get_profile(&refreshed, &refreshed.user.id).await.is_ok());
        assert!(backend.refresh_session(&session).await.is_err());
    }

    #[tokio::test]
    async fn test_lead_status_and_counts() {
        let backend = test_backend();
        let session = signed_in(&backend, "amy@company.com", "Amy", Role::Admin).await;
        let me = session.user.id.clone();

        let mut lead = sample_lead("Acme", &me);
        lead.assigned_to = Some(me.clone());
        backend.insert_lead(&session, &lead).await.expect("insert");
        let id = backend.list_leads(&session).await.expect("list")[0].id.clone();

        backend
            .update_lead_status(&session, &id, LeadStatus::Converted)
            .await
            .expect("status");
        assert_eq!(
            backend
                .count_leads(&session, &me, Some(LeadStatus::Converted))
                .await
                .expect("count"),
            1
        );

        let missing = backend
            .update_lead_status(&session, "missing", LeadStatus::Hot)
            .await
            .expect_err("unknown id");
        assert!(matches!(missing, DeskError::NotFound(_)));
    }
}
