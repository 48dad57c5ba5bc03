//! Data backends.
//!
//! Every page command talks to a [`Backend`]: the hosted auth + REST service
//! ([`remote::RemoteBackend`]) or the embedded SQLite file
//! ([`local::LocalBackend`]). Both enforce the same contract, so commands hold
//! a single `Arc<dyn Backend>` and never branch on which one is configured.

use async_trait::async_trait;

use crate::error::DeskError;
use crate::types::{
    Lead, LeadStatus, NewLead, NewReminder, Profile, ProfileUpdate, Reminder, Session,
    SignUpMetadata, SignUpOutcome,
};

pub mod local;
pub mod postgrest;
pub mod remote;

pub use local::LocalBackend;
pub use remote::RemoteBackend;

/// Sort order for profile listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOrder {
    /// Team grid: most recently created first.
    NewestFirst,
    /// Assignee pickers: alphabetical by full name.
    ByName,
}

/// Auth provider plus the three tables the desk reads and writes.
///
/// Data calls take the caller's session; the backend rejects a stale or
/// unknown token with [`DeskError::NotAuthenticated`] or an API error.
#[async_trait]
pub trait Backend: Send + Sync {
    // -- Auth ---------------------------------------------------------------

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DeskError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpOutcome, DeskError>;

    async fn sign_out(&self, session: &Session) -> Result<(), DeskError>;

    /// Trade the session's refresh token for a new session.
    async fn refresh_session(&self, session: &Session) -> Result<Session, DeskError>;

    /// Create the caller's profile row from sign-up metadata if it is missing.
    /// Without a session the call is made with anonymous credentials.
    async fn ensure_profile_exists(
        &self,
        session: Option<&Session>,
        user_id: &str,
    ) -> Result<(), DeskError>;

    // -- Profiles -----------------------------------------------------------

    async fn get_profile(&self, session: &Session, id: &str) -> Result<Option<Profile>, DeskError>;

    async fn list_profiles(
        &self,
        session: &Session,
        order: ProfileOrder,
    ) -> Result<Vec<Profile>, DeskError>;

    async fn update_profile(
        &self,
        session: &Session,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), DeskError>;

    // -- Leads --------------------------------------------------------------

    /// All leads, newest first, with the assignee's name joined in.
    async fn list_leads(&self, session: &Session) -> Result<Vec<Lead>, DeskError>;

    async fn get_lead(&self, session: &Session, id: &str) -> Result<Option<Lead>, DeskError>;

    async fn insert_lead(&self, session: &Session, lead: &NewLead) -> Result<(), DeskError>;

    /// Bulk `assigned_to = assignee where id in (ids)`.
    async fn assign_leads(
        &self,
        session: &Session,
        ids: &[String],
        assignee: &str,
    ) -> Result<(), DeskError>;

    async fn update_lead_status(
        &self,
        session: &Session,
        id: &str,
        status: LeadStatus,
    ) -> Result<(), DeskError>;

    /// Number of leads assigned to `assignee`, optionally with one status.
    async fn count_leads(
        &self,
        session: &Session,
        assignee: &str,
        status: Option<LeadStatus>,
    ) -> Result<usize, DeskError>;

    // -- Reminders ----------------------------------------------------------

    /// All reminders, soonest due first, with the linked lead joined in.
    async fn list_reminders(&self, session: &Session) -> Result<Vec<Reminder>, DeskError>;

    async fn get_reminder(&self, session: &Session, id: &str)
        -> Result<Option<Reminder>, DeskError>;

    async fn insert_reminder(
        &self,
        session: &Session,
        reminder: &NewReminder,
    ) -> Result<(), DeskError>;

    async fn set_reminder_completed(
        &self,
        session: &Session,
        id: &str,
        completed: bool,
    ) -> Result<(), DeskError>;
}
