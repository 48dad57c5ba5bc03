//! Plain-text rendering of page results for the terminal.

use std::fmt::Write;

use crate::assistant::{Assistant, Speaker, QUICK_ACTIONS};
use crate::commands::{ActionResult, AssignView, PageResult, SettingsView};
use crate::navigation::ShellView;
use crate::services::dashboard::{DashboardPage, Trend};
use crate::services::leads::{AssigneeOption, LeadCard, LeadDetail, LeadsPage};
use crate::services::reminders::{ReminderCard, RemindersPage};
use crate::services::team::TeamPage;

/// Render a page result, delegating the success body to `body`.
pub fn page<T>(result: &PageResult<T>, body: impl Fn(&T) -> String) -> String {
    match result {
        PageResult::Success { shell, data } => {
            let mut out = header(shell);
            out.push_str(&body(data));
            out
        }
        PageResult::Redirect { path, .. } => match *path {
            "/auth" => "Not signed in. Run `leaddesk login` first.\n".to_string(),
            other => format!("Redirected to {}\n", other),
        },
        PageResult::Error { message, error } => {
            format!("{}\n{}\n", message, error.recovery_suggestion)
        }
    }
}

pub fn action(result: &ActionResult) -> String {
    match result {
        ActionResult::Success { message } | ActionResult::Error { message } => {
            format!("{}\n", message)
        }
    }
}

#[allow(clippy::ptr_arg)]
pub fn message(text: &String) -> String {
    format!("{}\n", text)
}

fn header(shell: &ShellView) -> String {
    let mut out = format!(
        "[{}] {} ({})\n",
        shell.initials, shell.user_name, shell.role_badge
    );
    if shell.shell.sidebar_open {
        let items: Vec<String> = shell
            .items
            .iter()
            .map(|item| {
                if item.route == shell.active {
                    format!("*{}*", item.name)
                } else {
                    item.name.to_string()
                }
            })
            .collect();
        let _ = writeln!(out, "{}", items.join(" | "));
    }
    out.push('\n');
    out
}

/// Sidebar listing with paths, for the `nav` command.
pub fn navigation(shell: &ShellView) -> String {
    let mut out = String::new();
    for item in &shell.items {
        let _ = writeln!(out, "{:<14} {}", item.name, item.route.path());
    }
    if let Some(email) = &shell.user_email {
        let _ = writeln!(out, "\nSigned in as {}", email);
    }
    out
}

fn lead_line(lead: &LeadCard) -> String {
    let mut line = format!("{:<38} {:<22} {:<10}", lead.id, lead.name, lead.status.as_str());
    if let Some(company) = &lead.company {
        let _ = write!(line, " {}", company);
    }
    if let Some(value) = &lead.value_display {
        let _ = write!(line, " {}", value);
    }
    if let Some(assignee) = &lead.assignee_name {
        let _ = write!(line, " -> {}", assignee);
    }
    line
}

fn reminder_line(reminder: &ReminderCard) -> String {
    let mark = if reminder.completed { "x" } else { " " };
    let mut line = format!(
        "[{}] {:<38} {:<6} {} {}",
        mark, reminder.id, reminder.priority.as_str(), reminder.due_display, reminder.title
    );
    if reminder.overdue {
        line.push_str(" (overdue)");
    }
    if let Some(lead) = &reminder.lead_name {
        let _ = write!(line, " - {}", lead);
        if let Some(company) = &reminder.lead_company {
            let _ = write!(line, ", {}", company);
        }
    }
    line
}

pub fn dashboard(data: &DashboardPage) -> String {
    let mut out = format!(
        "Welcome back, {}\nHere's what's happening with your leads today.\n\n",
        data.welcome_name
    );
    for stat in &data.stats {
        let arrow = match stat.trend {
            Trend::Up => "up",
            Trend::Down => "down",
        };
        let _ = writeln!(out, "{:<12} {:>12}  {} {}", stat.title, stat.value, stat.change, arrow);
    }

    out.push_str("\nRecent Leads\n");
    if data.recent_leads.is_empty() {
        out.push_str("  No leads yet\n");
    }
    for lead in &data.recent_leads {
        let _ = writeln!(out, "  {}", lead_line(lead));
    }

    out.push_str("\nToday's Reminders\n");
    if data.todays_reminders.is_empty() {
        out.push_str("  Nothing due today\n");
    }
    for reminder in &data.todays_reminders {
        let _ = writeln!(out, "  {}", reminder_line(reminder));
    }
    out
}

pub fn leads(data: &LeadsPage) -> String {
    let mut out = String::new();
    if let Some(empty) = data.empty_message {
        let _ = writeln!(out, "{}", empty);
        return out;
    }
    for lead in &data.leads {
        let _ = writeln!(out, "{}", lead_line(lead));
    }
    let _ = writeln!(out, "\n{} of {} leads", data.leads.len(), data.total);
    out
}

pub fn lead_detail(data: &LeadDetail) -> String {
    let card = &data.card;
    let mut out = format!("{} [{}]\n", card.name, card.status);
    let rows = [
        ("Company", card.company.as_deref()),
        ("Email", card.email.as_deref()),
        ("Phone", card.phone.as_deref()),
        ("Value", card.value_display.as_deref()),
        ("Assigned to", card.assignee_name.as_deref()),
        ("Source", data.source.as_deref()),
        ("Notes", data.notes.as_deref()),
    ];
    for (label, value) in rows {
        if let Some(value) = value {
            let _ = writeln!(out, "  {:<12} {}", label, value);
        }
    }
    let _ = writeln!(out, "  {:<12} {}", "Created", card.created_at.format("%Y-%m-%d"));
    out
}

#[allow(clippy::ptr_arg)]
pub fn assignees(options: &Vec<AssigneeOption>) -> String {
    let mut out = String::new();
    for option in options {
        let _ = writeln!(out, "{:<38} {} ({})", option.id, option.name, option.role.display_name());
    }
    out
}

pub fn assign(data: &AssignView) -> String {
    let mut out = String::new();
    if let Some(message) = &data.message {
        let _ = writeln!(out, "{}\n", message);
    }
    out.push_str("Leads\n");
    for lead in &data.page.leads {
        let mark = if data.selected.contains(&lead.id) { "x" } else { " " };
        let _ = writeln!(out, "  [{}] {}", mark, lead_line(lead));
    }
    out.push_str("\nAssignees\n");
    for option in &data.page.assignees {
        let _ = writeln!(out, "  {:<38} {}", option.id, option.name);
    }
    out
}

pub fn reminders(data: &RemindersPage) -> String {
    let mut out = format!(
        "{} reminders, {} pending, {} overdue\n\n",
        data.total, data.pending, data.overdue
    );
    if let Some(empty) = data.empty_message {
        let _ = writeln!(out, "{}", empty);
        return out;
    }
    for reminder in &data.reminders {
        let _ = writeln!(out, "{}", reminder_line(reminder));
    }
    out
}

pub fn team(data: &TeamPage) -> String {
    let stats = &data.stats;
    let mut out = format!(
        "Total {}  Admins {}  Managers {}  Associates {}\n\n",
        stats.total, stats.admins, stats.managers, stats.associates
    );
    if let Some(empty) = data.empty_message {
        let _ = writeln!(out, "{}", empty);
        return out;
    }
    for member in &data.members {
        let _ = writeln!(
            out,
            "[{}] {:<22} {:<16} {:>3} leads {:>3} converted  joined {}",
            member.initials,
            member.display_name,
            member.role_display,
            member.leads_count,
            member.converted_count,
            member.joined_display
        );
    }
    out
}

pub fn settings(data: &SettingsView) -> String {
    let page = &data.page;
    let mut out = String::new();
    if let Some(message) = &data.message {
        let _ = writeln!(out, "{}\n", message);
    }
    let _ = writeln!(out, "Full name   {}", page.full_name.as_deref().unwrap_or(""));
    let _ = writeln!(out, "Email       {}", page.email.as_deref().unwrap_or(""));
    let _ = writeln!(out, "Role        {}", page.role_display);
    if let Some(avatar) = &page.avatar_url {
        let _ = writeln!(out, "Avatar      {}", avatar);
    }
    out
}

pub fn assistant(chat: &Assistant) -> String {
    let mut out = String::new();
    for message in &chat.messages {
        let who = match message.speaker {
            Speaker::User => "You",
            Speaker::Assistant => "Assistant",
        };
        let _ = writeln!(out, "{}: {}", who, message.content);
        for action in &message.actions {
            let _ = writeln!(out, "    > {} ({})", action.label, action.action);
        }
    }
    if chat.messages.len() == 1 {
        out.push_str("\nQuick actions:\n");
        for (i, label) in QUICK_ACTIONS.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, label);
        }
    }
    out
}
