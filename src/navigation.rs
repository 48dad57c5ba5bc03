//! Route table, role filtering and the shell's panel toggles.

use serde::Serialize;

use crate::helpers::initials;
use crate::types::{Profile, Role};

/// Every page the desk can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Auth,
    Dashboard,
    Leads,
    AddLead,
    AssignLeads,
    Team,
    Reminders,
    Settings,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Auth => "/auth",
            Route::Dashboard => "/",
            Route::Leads => "/leads",
            Route::AddLead => "/add-lead",
            Route::AssignLeads => "/assign-leads",
            Route::Team => "/team",
            Route::Reminders => "/reminders",
            Route::Settings => "/settings",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        [Route::Auth]
            .into_iter()
            .chain(NAVIGATION.iter().map(|item| item.route))
            .find(|route| route.path() == path)
    }
}

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: &'static str,
    pub route: Route,
    pub roles: &'static [Role],
}

const EVERYONE: &[Role] = &[Role::Admin, Role::SalesManager, Role::SalesAssociate];
const MANAGERS: &[Role] = &[Role::Admin, Role::SalesManager];

pub const NAVIGATION: [NavItem; 7] = [
    NavItem { name: "Dashboard", route: Route::Dashboard, roles: EVERYONE },
    NavItem { name: "Leads", route: Route::Leads, roles: EVERYONE },
    NavItem { name: "Add Lead", route: Route::AddLead, roles: EVERYONE },
    NavItem { name: "Assign Leads", route: Route::AssignLeads, roles: MANAGERS },
    NavItem { name: "Team", route: Route::Team, roles: MANAGERS },
    NavItem { name: "Reminders", route: Route::Reminders, roles: EVERYONE },
    NavItem { name: "Settings", route: Route::Settings, roles: EVERYONE },
];

/// Sidebar entries the role may see, in table order.
pub fn visible_navigation(role: Role) -> Vec<NavItem> {
    NAVIGATION
        .iter()
        .filter(|item| item.roles.contains(&role))
        .copied()
        .collect()
}

/// The login view is always reachable; other routes follow the table.
pub fn can_access(role: Role, route: Route) -> bool {
    route == Route::Auth
        || NAVIGATION
            .iter()
            .any(|item| item.route == route && item.roles.contains(&role))
}

/// Sidebar and assistant panel visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shell {
    pub sidebar_open: bool,
    pub assistant_open: bool,
}

impl Default for Shell {
    fn default() -> Self {
        Self {
            sidebar_open: true,
            assistant_open: false,
        }
    }
}

impl Shell {
    pub fn toggle_sidebar(&mut self) {
        self.sidebar_open = !self.sidebar_open;
    }

    pub fn toggle_assistant(&mut self) {
        self.assistant_open = !self.assistant_open;
    }
}

/// Everything the sidebar and header need for one signed-in user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellView {
    pub user_name: String,
    pub user_email: Option<String>,
    pub initials: String,
    pub role_badge: String,
    pub active: Route,
    pub items: Vec<NavItem>,
    pub shell: Shell,
}

impl ShellView {
    pub fn new(profile: &Profile, active: Route, shell: Shell) -> Self {
        let user_name = profile.display_name().to_string();
        Self {
            initials: initials(profile.full_name.as_deref().unwrap_or_default()),
            user_name,
            user_email: profile.email.clone(),
            role_badge: profile.role.badge(),
            active,
            items: visible_navigation(profile.role),
            shell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(role: Role) -> Vec<&'static str> {
        visible_navigation(role).into_iter().map(|i| i.name).collect()
    }

    #[test]
    fn test_associates_do_not_see_manager_pages() {
        assert_eq!(
            names(Role::SalesAssociate),
            vec!["Dashboard", "Leads", "Add Lead", "Reminders", "Settings"]
        );
        assert!(!can_access(Role::SalesAssociate, Route::Team));
        assert!(!can_access(Role::SalesAssociate, Route::AssignLeads));
        assert!(can_access(Role::SalesAssociate, Route::Auth));
    }

    #[test]
    fn test_managers_and_admins_see_everything() {
        for role in [Role::Admin, Role::SalesManager] {
            assert_eq!(names(role).len(), 7);
            assert!(can_access(role, Route::AssignLeads));
        }
    }

    #[test]
    fn test_route_paths_round_trip() {
        assert_eq!(Route::from_path("/add-lead"), Some(Route::AddLead));
        assert_eq!(Route::from_path("/auth"), Some(Route::Auth));
        assert_eq!(Route::from_path("/"), Some(Route::Dashboard));
        assert_eq!(Route::from_path("/nope"), None);
    }

    #[test]
    fn test_shell_toggles_independently() {
        let mut shell = Shell::default();
        assert!(shell.sidebar_open);
        assert!(!shell.assistant_open);

        shell.toggle_assistant();
        assert!(shell.sidebar_open);
        assert!(shell.assistant_open);

        shell.toggle_sidebar();
        shell.toggle_sidebar();
        assert!(shell.sidebar_open);
    }
}
