//! Page commands: one entry point per front-end action.
//!
//! Each command gates the caller, runs the page's service and folds the
//! outcome into a serializable result. Nothing here returns `Err`; failures
//! become inline `Error: ...` messages or redirects.

use std::future::Future;

use serde::Serialize;

use crate::assistant::Assistant;
use crate::error::{DeskError, ErrorView};
use crate::filters::{LeadFilter, ReminderFilter, TeamFilter};
use crate::navigation::{Route, Shell, ShellView};
use crate::services::dashboard::{self, DashboardPage};
use crate::services::leads::{self, AddLeadForm, AssignPage, AssigneeOption, LeadDetail, LeadSelection, LeadsPage};
use crate::services::reminders::{self, ReminderForm, RemindersPage};
use crate::services::settings::{self, ProfileForm, SettingsPage};
use crate::services::team::{self, TeamPage, TEAM_LOAD_ERROR};
use crate::session::{self, gate, Gate, Viewer};
use crate::state::AppState;
use crate::types::LeadStatus;

/// Result type for a gated page
#[derive(Debug, Serialize)]
#[allow(clippy::large_enum_variant)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PageResult<T> {
    Success { shell: ShellView, data: T },
    Redirect { to: Route, path: &'static str },
    Error { message: String, error: ErrorView },
}

impl<T> PageResult<T> {
    fn error(err: &DeskError) -> Self {
        PageResult::Error {
            message: err.inline_message(),
            error: ErrorView::from(err),
        }
    }

    fn redirect(to: Route) -> Self {
        PageResult::Redirect {
            to,
            path: to.path(),
        }
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            PageResult::Success { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Result type for the auth forms, which run without a gate
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ActionResult {
    Success { message: String },
    Error { message: String },
}

/// Gate `route`, then build its data for the signed-in viewer.
async fn page<T, F, Fut>(state: &AppState, route: Route, shell: Shell, load: F) -> PageResult<T>
where
    F: FnOnce(Viewer) -> Fut,
    Fut: Future<Output = Result<T, DeskError>>,
{
    let viewer = match gate(state, route).await {
        Ok(Gate::Allowed(viewer)) => viewer,
        Ok(Gate::Redirect(to)) => {
            log::debug!("{} redirected to {}", route.path(), to.path());
            return PageResult::redirect(to);
        }
        Err(e) => return PageResult::error(&e),
    };

    let view = ShellView::new(&viewer.profile, route, shell);
    match load(viewer).await {
        Ok(data) => PageResult::Success { shell: view, data },
        Err(e) => {
            log::warn!("{} failed: {}", route.path(), e);
            PageResult::error(&e)
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

pub async fn login(state: &AppState, email: &str, password: &str) -> ActionResult {
    match session::sign_in(state, email, password).await {
        Ok(viewer) => ActionResult::Success {
            message: format!("Signed in as {}", viewer.profile.display_name()),
        },
        Err(e) => ActionResult::Error {
            message: e.inline_message(),
        },
    }
}

pub async fn signup(state: &AppState, email: &str, password: &str, full_name: &str) -> ActionResult {
    match session::sign_up(state, email, password, full_name).await {
        Ok(message) => ActionResult::Success {
            message: message.to_string(),
        },
        Err(e) => ActionResult::Error {
            message: e.inline_message(),
        },
    }
}

pub async fn logout(state: &AppState) -> ActionResult {
    match settings::sign_out(state).await {
        Ok(()) => ActionResult::Success {
            message: "Signed out".to_string(),
        },
        Err(message) => ActionResult::Error { message },
    }
}

// =============================================================================
// Pages
// =============================================================================

pub async fn get_dashboard(state: &AppState, shell: Shell) -> PageResult<DashboardPage> {
    page(state, Route::Dashboard, shell, |viewer| async move {
        dashboard::dashboard_page(state, &viewer).await
    })
    .await
}

/// Shell only: sidebar entries and header for the caller's role.
pub async fn get_navigation(state: &AppState, shell: Shell) -> PageResult<()> {
    page(state, Route::Dashboard, shell, |_| async { Ok(()) }).await
}

pub async fn get_leads(state: &AppState, shell: Shell, filter: &LeadFilter) -> PageResult<LeadsPage> {
    page(state, Route::Leads, shell, |viewer| async move {
        leads::leads_page(state, &viewer, filter).await
    })
    .await
}

pub async fn get_lead(state: &AppState, shell: Shell, id: &str) -> PageResult<LeadDetail> {
    page(state, Route::Leads, shell, |viewer| async move {
        leads::lead_detail(state, &viewer, id).await
    })
    .await
}

pub async fn update_lead_status(
    state: &AppState,
    shell: Shell,
    id: &str,
    status: LeadStatus,
) -> PageResult<String> {
    page(state, Route::Leads, shell, |viewer| async move {
        leads::set_status(state, &viewer, id, status).await
    })
    .await
}

pub async fn get_assignee_options(state: &AppState, shell: Shell) -> PageResult<Vec<AssigneeOption>> {
    page(state, Route::AddLead, shell, |viewer| async move {
        leads::assignee_options(state, &viewer).await
    })
    .await
}

pub async fn create_lead(state: &AppState, shell: Shell, form: AddLeadForm) -> PageResult<String> {
    page(state, Route::AddLead, shell, |viewer| async move {
        leads::add_lead(state, &viewer, form).await.map(String::from)
    })
    .await
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignView {
    #[serde(flatten)]
    pub page: AssignPage,
    /// Set after a bulk assignment actually ran.
    pub message: Option<String>,
    /// Leads still selected (cleared after a successful assignment).
    pub selected: LeadSelection,
}

/// Assign the selected leads, then reload the assignment page.
pub async fn assign_leads(
    state: &AppState,
    shell: Shell,
    mut selection: LeadSelection,
    assignee: &str,
) -> PageResult<AssignView> {
    page(state, Route::AssignLeads, shell, |viewer| async move {
        let message = leads::assign_selected(state, &viewer, &mut selection, assignee).await?;
        let page = leads::assign_page(state, &viewer).await?;
        Ok(AssignView {
            page,
            message,
            selected: selection,
        })
    })
    .await
}

pub async fn get_reminders(
    state: &AppState,
    shell: Shell,
    filter: &ReminderFilter,
) -> PageResult<RemindersPage> {
    page(state, Route::Reminders, shell, |viewer| async move {
        reminders::reminders_page(state, &viewer, filter).await
    })
    .await
}

pub async fn create_reminder(state: &AppState, shell: Shell, form: ReminderForm) -> PageResult<String> {
    page(state, Route::Reminders, shell, |viewer| async move {
        reminders::create_reminder(state, &viewer, form)
            .await
            .map(String::from)
    })
    .await
}

/// Flip a reminder and show the list again. A failed toggle is only logged.
pub async fn toggle_reminder(
    state: &AppState,
    shell: Shell,
    id: &str,
    filter: &ReminderFilter,
) -> PageResult<RemindersPage> {
    page(state, Route::Reminders, shell, |viewer| async move {
        if let Err(e) = reminders::toggle_reminder(state, &viewer, id).await {
            log::error!("Error updating reminder {}: {}", id, e);
        }
        reminders::reminders_page(state, &viewer, filter).await
    })
    .await
}

pub async fn get_team(state: &AppState, shell: Shell, filter: &TeamFilter) -> PageResult<TeamPage> {
    let result = page(state, Route::Team, shell, |viewer| async move {
        team::team_page(state, &viewer, filter).await
    })
    .await;
    match result {
        PageResult::Error { error, .. } => PageResult::Error {
            message: TEAM_LOAD_ERROR.to_string(),
            error,
        },
        other => other,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    #[serde(flatten)]
    pub page: SettingsPage,
    pub message: Option<String>,
}

/// Show settings, applying `form` first when one was submitted.
pub async fn settings_page(
    state: &AppState,
    shell: Shell,
    form: Option<ProfileForm>,
) -> PageResult<SettingsView> {
    page(state, Route::Settings, shell, |mut viewer| async move {
        let Some(form) = form else {
            return Ok(SettingsView {
                page: settings::settings_page(&viewer),
                message: None,
            });
        };

        let message = settings::update_profile(state, &viewer, form).await?;
        if let Some(profile) = state
            .backend
            .get_profile(&viewer.session, viewer.user_id())
            .await?
        {
            viewer.profile = profile;
        }
        Ok(SettingsView {
            page: settings::settings_page(&viewer),
            message: Some(message.to_string()),
        })
    })
    .await
}

/// Assistant panel inputs for one invocation.
#[derive(Debug, Clone, Default)]
pub struct AssistantInput {
    pub quick_action: Option<usize>,
    pub message: Option<String>,
}

/// Open the assistant panel over the dashboard and run one exchange.
pub async fn assistant(state: &AppState, mut shell: Shell, input: AssistantInput) -> PageResult<Assistant> {
    if !shell.assistant_open {
        shell.toggle_assistant();
    }
    page(state, Route::Dashboard, shell, |_| async move {
        let mut chat = Assistant::new();
        if let Some(index) = input.quick_action {
            chat.choose_quick_action(index);
        }
        if let Some(text) = &input.message {
            chat.set_draft(text);
        }
        chat.send();
        Ok(chat)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::local::test_utils::Faults;
    use crate::session::test_utils::viewer_with_role;
    use crate::state::test_utils::{flaky_state, test_state};
    use crate::types::Role;

    #[tokio::test]
    async fn test_pages_redirect_without_session() {
        let (state, _) = test_state();
        let result = get_leads(&state, Shell::default(), &LeadFilter::default()).await;
        assert!(matches!(
            result,
            PageResult::Redirect {
                to: Route::Auth,
                path: "/auth"
            }
        ));
    }

    #[tokio::test]
    async fn test_associate_team_page_redirects_to_dashboard() {
        let (state, local) = test_state();
        viewer_with_role(&state, &local, "amy@company.com", "Amy", Role::SalesAssociate).await;
        let result = get_team(&state, Shell::default(), &TeamFilter::default()).await;
        assert!(matches!(
            result,
            PageResult::Redirect {
                to: Route::Dashboard,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_inline_error_for_bad_form() {
        let (state, local) = test_state();
        viewer_with_role(&state, &local, "amy@company.com", "Amy", Role::SalesAssociate).await;
        let result = create_lead(&state, Shell::default(), AddLeadForm::default()).await;
        match result {
            PageResult::Error { message, .. } => assert_eq!(message, "Error: Name is required"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_toggle_failure_is_not_shown() {
        let (state, local) = test_state();
        viewer_with_role(&state, &local, "amy@company.com", "Amy", Role::SalesAssociate).await;
        let result =
            toggle_reminder(&state, Shell::default(), "missing", &ReminderFilter::default()).await;
        let page = result.data().expect("page still renders");
        assert!(page.reminders.is_empty());
    }

    #[tokio::test]
    async fn test_empty_assignment_is_a_no_op() {
        let (state, local) = test_state();
        let viewer =
            viewer_with_role(&state, &local, "dana@company.com", "Dana", Role::SalesManager).await;
        let result = assign_leads(&state, Shell::default(), LeadSelection::default(), viewer.user_id()).await;
        let view = result.data().expect("assign page");
        assert!(view.message.is_none());
        assert!(view.selected.is_empty());
    }

    #[tokio::test]
    async fn test_assistant_reply_and_open_panel() {
        let (state, local) = test_state();
        viewer_with_role(&state, &local, "amy@company.com", "Amy", Role::SalesAssociate).await;
        let result = assistant(
            &state,
            Shell::default(),
            AssistantInput {
                quick_action: None,
                message: Some("show hot leads".into()),
            },
        )
        .await;
        match result {
            PageResult::Success { shell, data } => {
                assert!(shell.shell.assistant_open);
                assert_eq!(data.messages.len(), 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_failure_is_inline() {
        let (state, _) = test_state();
        match login(&state, "nobody@company.com", "password123").await {
            ActionResult::Error { message } => {
                assert_eq!(message, "Error: Invalid login credentials")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_page_result_serialization_tag() {
        let redirect: PageResult<()> = PageResult::redirect(Route::Auth);
        let json = serde_json::to_value(&redirect).expect("serialize");
        assert_eq!(json["status"], "redirect");
        assert_eq!(json["path"], "/auth");
    }

    #[tokio::test]
    async fn test_team_page_error_uses_load_message() {
        let (state, local) = test_state();
        viewer_with_role(&state, &local, "dana@company.com", "Dana", Role::SalesManager).await;
        let flaky = flaky_state(
            &state,
            &local,
            Faults {
                list_profiles: true,
                ..Faults::default()
            },
        );
        match get_team(&flaky, Shell::default(), &TeamFilter::default()).await {
            PageResult::Error { message, .. } => assert_eq!(message, "Error loading team members"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
