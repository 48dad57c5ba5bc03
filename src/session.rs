//! Session and profile gate, plus the sign-in, sign-up and sign-out flows.
//!
//! Every page command starts with [`gate`]: it loads the stored session,
//! refreshes it once if the access token has expired, fetches the caller's
//! profile and checks the requested route against the role's navigation.

use chrono::Utc;

use crate::error::DeskError;
use crate::helpers::is_valid_email;
use crate::navigation::{can_access, Route};
use crate::state::AppState;
use crate::types::{Profile, Role, Session, SignUpMetadata};

/// A signed-in caller with a profile row.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewer {
    pub session: Session,
    pub profile: Profile,
}

impl Viewer {
    pub fn user_id(&self) -> &str {
        &self.session.user.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Profile e-mail, falling back to the auth account's.
    pub fn email(&self) -> Option<&str> {
        self.profile
            .email
            .as_deref()
            .or(self.session.user.email.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    Allowed(Viewer),
    Redirect(Route),
}

/// Resolve the caller for a page, or say where to send them instead.
pub async fn gate(state: &AppState, route: Route) -> Result<Gate, DeskError> {
    let Some(mut session) = state.sessions.load()? else {
        return Ok(Gate::Redirect(Route::Auth));
    };

    if session.is_expired(Utc::now()) {
        match state.backend.refresh_session(&session).await {
            Ok(fresh) => {
                state.sessions.save(&fresh)?;
                session = fresh;
            }
            Err(e) => {
                log::info!("Session refresh failed: {}", e);
                state.sessions.clear()?;
                return Ok(Gate::Redirect(Route::Auth));
            }
        }
    }

    let profile = match state.backend.get_profile(&session, &session.user.id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            log::warn!("No profile row for user {}", session.user.id);
            end_session(state, &session).await?;
            return Ok(Gate::Redirect(Route::Auth));
        }
        Err(e) => {
            log::warn!("Failed to load profile for {}: {}", session.user.id, e);
            end_session(state, &session).await?;
            return Ok(Gate::Redirect(Route::Auth));
        }
    };

    if !can_access(profile.role, route) {
        log::debug!("{} may not open {}", profile.role, route.path());
        return Ok(Gate::Redirect(Route::Dashboard));
    }

    Ok(Gate::Allowed(Viewer { session, profile }))
}

/// Revoke the session with the provider (best effort) and forget it locally.
async fn end_session(state: &AppState, session: &Session) -> Result<(), DeskError> {
    if let Err(e) = state.backend.sign_out(session).await {
        log::warn!("Sign-out call failed: {}", e);
    }
    state.sessions.clear()
}

async fn ensure_profile(state: &AppState, session: Option<&Session>, user_id: &str) {
    if let Err(e) = state.backend.ensure_profile_exists(session, user_id).await {
        log::error!("Error ensuring profile exists: {}", e);
    }
}

/// Password sign-in. Stores the session only once the profile is confirmed.
pub async fn sign_in(state: &AppState, email: &str, password: &str) -> Result<Viewer, DeskError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(DeskError::Validation(
            "Email and password are required".into(),
        ));
    }

    let session = state.backend.sign_in(email, password).await?;
    ensure_profile(state, Some(&session), &session.user.id).await;

    match state.backend.get_profile(&session, &session.user.id).await {
        Ok(Some(profile)) => {
            state.sessions.save(&session)?;
            log::info!("Signed in as {}", session.user.id);
            Ok(Viewer { session, profile })
        }
        Ok(None) | Err(_) => {
            if let Err(e) = state.backend.sign_out(&session).await {
                log::warn!("Sign-out call failed: {}", e);
            }
            Err(DeskError::ProfileMissing)
        }
    }
}

pub const SIGNED_UP_CONFIRMED: &str = "Account created successfully! You can now sign in.";
pub const SIGNED_UP_UNCONFIRMED: &str =
    "Account created! Please check your email for verification, then you can sign in.";

/// Self-registration always creates a sales associate. Returns the message
/// for the login form; the caller still signs in afterwards.
pub async fn sign_up(
    state: &AppState,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<&'static str, DeskError> {
    if full_name.trim().is_empty() {
        return Err(DeskError::Validation("Full name is required".into()));
    }
    if !is_valid_email(email) {
        return Err(DeskError::Validation(format!(
            "Invalid email address: {}",
            email.trim()
        )));
    }

    let metadata = SignUpMetadata {
        full_name: full_name.trim().to_string(),
        role: Role::SalesAssociate,
    };
    let outcome = state.backend.sign_up(email, password, &metadata).await?;
    ensure_profile(state, outcome.session.as_ref(), &outcome.user.id).await;

    // The form flips back to sign-in, so a session issued at sign-up is not kept.
    if let Some(session) = &outcome.session {
        if let Err(e) = state.backend.sign_out(session).await {
            log::debug!("Discarding sign-up session failed: {}", e);
        }
    }

    Ok(if outcome.email_confirmed() {
        SIGNED_UP_CONFIRMED
    } else {
        SIGNED_UP_UNCONFIRMED
    })
}

/// Sign out of the stored session, if any.
pub async fn sign_out(state: &AppState) -> Result<(), DeskError> {
    match state.sessions.load()? {
        Some(session) => end_session(state, &session).await,
        None => Ok(()),
    }
}
