use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::optional_field;
use crate::error::DeskError;
use crate::filters::ReminderFilter;
use crate::helpers::{format_date_time, parse_due_date};
use crate::session::Viewer;
use crate::state::AppState;
use crate::types::{NewReminder, Priority, Reminder};

pub const REMINDER_CREATED: &str = "Reminder created successfully!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderCard {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub due_display: String,
    pub priority: Priority,
    pub completed: bool,
    pub overdue: bool,
    pub lead_name: Option<String>,
    pub lead_company: Option<String>,
}

impl ReminderCard {
    pub fn from_reminder(reminder: &Reminder, now: DateTime<Utc>) -> Self {
        Self {
            id: reminder.id.clone(),
            title: reminder.title.clone(),
            description: reminder.description.clone(),
            due_date: reminder.due_date,
            due_display: format_date_time(&reminder.due_date),
            priority: reminder.priority,
            completed: reminder.completed,
            overdue: reminder.is_overdue(now),
            lead_name: reminder.lead.as_ref().map(|l| l.name.clone()),
            lead_company: reminder.lead.as_ref().and_then(|l| l.company.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemindersPage {
    pub reminders: Vec<ReminderCard>,
    pub total: usize,
    pub pending: usize,
    pub overdue: usize,
    pub empty_message: Option<&'static str>,
}

pub async fn reminders_page(
    state: &AppState,
    viewer: &Viewer,
    filter: &ReminderFilter,
) -> Result<RemindersPage, DeskError> {
    let reminders = state.backend.list_reminders(&viewer.session).await?;
    let now = Utc::now();
    let filtered = filter.apply(&reminders);

    Ok(RemindersPage {
        total: reminders.len(),
        pending: reminders.iter().filter(|r| !r.completed).count(),
        overdue: reminders.iter().filter(|r| r.is_overdue(now)).count(),
        empty_message: filtered.is_empty().then(|| filter.empty_message()),
        reminders: filtered
            .iter()
            .map(|r| ReminderCard::from_reminder(r, now))
            .collect(),
    })
}

/// Raw reminder form values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReminderForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub priority: String,
    pub lead_id: String,
}

impl ReminderForm {
    /// The caller becomes both assignee and creator.
    pub fn into_new_reminder(self, user_id: &str) -> Result<NewReminder, DeskError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(DeskError::Validation("Title is required".into()));
        }
        let due_date = parse_due_date(&self.due_date).map_err(DeskError::Validation)?;
        let priority = match self.priority.trim() {
            "" => Priority::default(),
            raw => raw.parse().map_err(DeskError::Validation)?,
        };

        Ok(NewReminder {
            title: title.to_string(),
            description: optional_field(&self.description),
            due_date,
            priority,
            lead_id: optional_field(&self.lead_id),
            assigned_to: user_id.to_string(),
            created_by: user_id.to_string(),
        })
    }
}

pub async fn create_reminder(
    state: &AppState,
    viewer: &Viewer,
    form: ReminderForm,
) -> Result<&'static str, DeskError> {
    let reminder = form.into_new_reminder(viewer.user_id())?;
    state
        .backend
        .insert_reminder(&viewer.session, &reminder)
        .await?;
    Ok(REMINDER_CREATED)
}

/// Flip a reminder's completed flag. Returns the new value.
pub async fn toggle_reminder(
    state: &AppState,
    viewer: &Viewer,
    id: &str,
) -> Result<bool, DeskError> {
    let reminder = state
        .backend
        .get_reminder(&viewer.session, id)
        .await?
        .ok_or_else(|| DeskError::NotFound(format!("reminder {}", id)))?;
    let completed = !reminder.completed;
    state
        .backend
        .set_reminder_completed(&viewer.session, id, completed)
        .await?;
    Ok(completed)
}
