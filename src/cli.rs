//! Command-line front end.
//!
//! Each subcommand maps onto one page command; output is the rendered page,
//! or the raw page result with `--json`.

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::commands::{self, ActionResult, AssistantInput, PageResult};
use crate::filters::{CompletionFilter, LeadFilter, ReminderFilter, Selection, TeamFilter};
use crate::navigation::Shell;
use crate::render;
use crate::services::leads::{AddLeadForm, LeadSelection};
use crate::services::reminders::ReminderForm;
use crate::services::settings::ProfileForm;
use crate::state::AppState;
use crate::types::{LeadStatus, Priority, Role};

/// Sales lead desk for the terminal.
#[derive(Parser, Debug)]
#[command(name = "leaddesk", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Print the page result as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Hide the navigation bar above each page.
    #[arg(long, global = true)]
    pub no_sidebar: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with e-mail and password.
    Login {
        email: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create an account (always a sales associate).
    Signup {
        email: String,
        #[arg(short, long)]
        password: String,
        #[arg(short = 'n', long = "name")]
        full_name: String,
    },

    /// Forget the stored session.
    Logout,

    /// Stats, recent leads and today's reminders.
    Dashboard,

    /// Show the pages available to your role.
    Nav,

    /// List leads.
    Leads {
        /// Matches name, company or e-mail.
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        status: Selection<LeadStatus>,
    },

    /// Show one lead.
    Lead { id: String },

    /// Create a lead. Without a name, lists the possible assignees.
    AddLead {
        name: Option<String>,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        status: String,
        #[arg(long, default_value = "")]
        value: String,
        #[arg(long, default_value = "")]
        source: String,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long = "assign-to", default_value = "")]
        assigned_to: String,
    },

    /// Change a lead's status.
    SetStatus { id: String, status: LeadStatus },

    /// Assign leads in bulk. Without ids, shows the assignment page.
    Assign {
        /// Profile id of the assignee.
        #[arg(long = "to", default_value = "")]
        assignee: String,
        ids: Vec<String>,
    },

    /// List reminders.
    Reminders {
        #[arg(long, default_value = "all")]
        priority: Selection<Priority>,
        /// all, pending or completed
        #[arg(long, default_value = "all")]
        show: CompletionFilter,
    },

    /// Schedule a reminder.
    AddReminder {
        title: String,
        /// RFC 3339 or YYYY-MM-DDTHH:MM (local time).
        #[arg(long)]
        due: String,
        #[arg(long, default_value = "")]
        priority: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Lead id to link.
        #[arg(long, default_value = "")]
        lead: String,
    },

    /// Mark a reminder done, or open again.
    ToggleReminder { id: String },

    /// Team members with their lead counts.
    Team {
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long, default_value = "all")]
        role: Selection<Role>,
    },

    /// Show or edit your profile.
    Settings {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },

    /// Talk to the assistant panel.
    Assistant {
        /// Quick action number (1-3) to copy into the message box.
        #[arg(short, long)]
        quick: Option<usize>,
        message: Option<String>,
    },
}

/// Printed output plus whether the command succeeded.
pub struct Output {
    pub text: String,
    pub ok: bool,
}

fn emit_page<T: Serialize>(
    result: &PageResult<T>,
    json: bool,
    body: impl Fn(&T) -> String,
) -> Output {
    let ok = matches!(result, PageResult::Success { .. });
    let text = if json {
        to_json(result)
    } else {
        render::page(result, body)
    };
    Output { text, ok }
}

fn emit_action(result: &ActionResult, json: bool) -> Output {
    let ok = matches!(result, ActionResult::Success { .. });
    let text = if json {
        to_json(result)
    } else {
        render::action(result)
    };
    Output { text, ok }
}

fn to_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => format!("{}\n", json),
        Err(e) => format!("{{\"status\":\"error\",\"message\":\"{}\"}}\n", e),
    }
}

pub async fn run(state: &AppState, cli: Cli) -> Output {
    let mut shell = Shell::default();
    if cli.no_sidebar {
        shell.toggle_sidebar();
    }
    let json = cli.json;

    match cli.command {
        Command::Login { email, password } => {
            emit_action(&commands::login(state, &email, &password).await, json)
        }
        Command::Signup {
            email,
            password,
            full_name,
        } => emit_action(
            &commands::signup(state, &email, &password, &full_name).await,
            json,
        ),
        Command::Logout => emit_action(&commands::logout(state).await, json),
        Command::Dashboard => emit_page(
            &commands::get_dashboard(state, shell).await,
            json,
            render::dashboard,
        ),
        Command::Nav => {
            let result = commands::get_navigation(state, shell).await;
            match &result {
                PageResult::Success { shell, .. } if !json => Output {
                    text: render::navigation(shell),
                    ok: true,
                },
                _ => emit_page(&result, json, |_| String::new()),
            }
        }
        Command::Leads { search, status } => {
            let filter = LeadFilter { search, status };
            emit_page(
                &commands::get_leads(state, shell, &filter).await,
                json,
                render::leads,
            )
        }
        Command::Lead { id } => emit_page(
            &commands::get_lead(state, shell, &id).await,
            json,
            render::lead_detail,
        ),
        Command::AddLead {
            name: None, ..
        } => emit_page(
            &commands::get_assignee_options(state, shell).await,
            json,
            render::assignees,
        ),
        Command::AddLead {
            name: Some(name),
            email,
            phone,
            company,
            status,
            value,
            source,
            notes,
            assigned_to,
        } => {
            let form = AddLeadForm {
                name,
                email,
                phone,
                company,
                status,
                value,
                source,
                notes,
                assigned_to,
            };
            emit_page(
                &commands::create_lead(state, shell, form).await,
                json,
                render::message,
            )
        }
        Command::SetStatus { id, status } => emit_page(
            &commands::update_lead_status(state, shell, &id, status).await,
            json,
            render::message,
        ),
        Command::Assign { assignee, ids } => emit_page(
            &commands::assign_leads(state, shell, LeadSelection::from_ids(ids), &assignee).await,
            json,
            render::assign,
        ),
        Command::Reminders { priority, show } => {
            let filter = ReminderFilter {
                priority,
                completion: show,
            };
            emit_page(
                &commands::get_reminders(state, shell, &filter).await,
                json,
                render::reminders,
            )
        }
        Command::AddReminder {
            title,
            due,
            priority,
            description,
            lead,
        } => {
            let form = ReminderForm {
                title,
                description,
                due_date: due,
                priority,
                lead_id: lead,
            };
            emit_page(
                &commands::create_reminder(state, shell, form).await,
                json,
                render::message,
            )
        }
        Command::ToggleReminder { id } => emit_page(
            &commands::toggle_reminder(state, shell, &id, &ReminderFilter::default()).await,
            json,
            render::reminders,
        ),
        Command::Team { search, role } => {
            let filter = TeamFilter { search, role };
            emit_page(
                &commands::get_team(state, shell, &filter).await,
                json,
                render::team,
            )
        }
        Command::Settings {
            full_name,
            avatar_url,
        } => {
            let current = commands::settings_page(state, shell, None).await;
            let form = match (&current, full_name, avatar_url) {
                (_, None, None) | (PageResult::Redirect { .. } | PageResult::Error { .. }, _, _) => {
                    return emit_page(&current, json, render::settings);
                }
                (PageResult::Success { data, .. }, full_name, avatar_url) => ProfileForm {
                    full_name: full_name
                        .or_else(|| data.page.full_name.clone())
                        .unwrap_or_default(),
                    avatar_url: avatar_url
                        .or_else(|| data.page.avatar_url.clone())
                        .unwrap_or_default(),
                },
            };
            emit_page(
                &commands::settings_page(state, shell, Some(form)).await,
                json,
                render::settings,
            )
        }
        Command::Assistant { quick, message } => {
            let input = AssistantInput {
                quick_action: quick.and_then(|n| n.checked_sub(1)),
                message,
            };
            emit_page(
                &commands::assistant(state, shell, input).await,
                json,
                render::assistant,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_utils::viewer_with_role;
    use crate::state::test_utils::test_state;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("leaddesk").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn test_filter_arguments_parse() {
        let cli = parse(&["leads", "--status", "hot", "-s", "acme"]);
        match cli.command {
            Command::Leads { search, status } => {
                assert_eq!(search, "acme");
                assert_eq!(status, Selection::Only(LeadStatus::Hot));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["leaddesk", "leads", "--status", "warmish"]).is_err());

        let cli = parse(&["reminders", "--show", "pending"]);
        assert!(matches!(
            cli.command,
            Command::Reminders {
                show: CompletionFilter::Pending,
                priority: Selection::All
            }
        ));
    }

    #[tokio::test]
    async fn test_add_lead_then_list() {
        let (state, local) = test_state();
        viewer_with_role(&state, &local, "amy@company.com", "Amy", Role::SalesAssociate).await;

        let out = run(&state, parse(&["add-lead", "Sarah Johnson", "--company", "Acme Corp"])).await;
        assert!(out.ok);
        assert_eq!(out.text.lines().last(), Some("Lead created successfully!"));

        let out = run(&state, parse(&["--json", "leads", "-s", "acme"])).await;
        assert!(out.ok);
        let value: serde_json::Value = serde_json::from_str(&out.text).expect("json");
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["leads"][0]["status"], "cold");
    }

    #[tokio::test]
    async fn test_settings_keeps_unchanged_fields() {
        let (state, local) = test_state();
        viewer_with_role(&state, &local, "amy@company.com", "Amy Lee", Role::Admin).await;

        let out = run(
            &state,
            parse(&["settings", "--avatar-url", "https://cdn.example.com/a.png"]),
        )
        .await;
        assert!(out.ok);
        assert!(out.text.contains("Profile updated successfully!"));
        assert!(out.text.contains("Full name   Amy Lee"));
    }

    #[tokio::test]
    async fn test_signed_out_command_fails() {
        let (state, _) = test_state();
        let out = run(&state, parse(&["dashboard"])).await;
        assert!(!out.ok);
        assert!(out.text.contains("leaddesk login"));
    }
}
