use serde::{Deserialize, Serialize};

use super::optional_field;
use crate::error::DeskError;
use crate::session::{self, Viewer};
use crate::state::AppState;
use crate::types::{ProfileUpdate, Role};

pub const PROFILE_UPDATED: &str = "Profile updated successfully!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPage {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub role_display: &'static str,
    pub avatar_url: Option<String>,
}

pub fn settings_page(viewer: &Viewer) -> SettingsPage {
    SettingsPage {
        full_name: viewer.profile.full_name.clone(),
        email: viewer.email().map(str::to_string),
        role: viewer.role(),
        role_display: viewer.role().display_name(),
        avatar_url: viewer.profile.avatar_url.clone(),
    }
}

/// Editable profile fields. Blank values clear the column.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub full_name: String,
    pub avatar_url: String,
}

impl From<ProfileForm> for ProfileUpdate {
    fn from(form: ProfileForm) -> Self {
        ProfileUpdate {
            full_name: optional_field(&form.full_name),
            avatar_url: optional_field(&form.avatar_url),
        }
    }
}

pub async fn update_profile(
    state: &AppState,
    viewer: &Viewer,
    form: ProfileForm,
) -> Result<&'static str, DeskError> {
    let update = ProfileUpdate::from(form);
    state
        .backend
        .update_profile(&viewer.session, viewer.user_id(), &update)
        .await?;
    log::info!("Profile {} updated", viewer.user_id());
    Ok(PROFILE_UPDATED)
}

/// Sign-out from the settings page reports failures inline.
pub async fn sign_out(state: &AppState) -> Result<(), String> {
    session::sign_out(state)
        .await
        .map_err(|e| format!("Error signing out: {}", e))
}
