use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::optional_field;
use crate::backend::ProfileOrder;
use crate::error::DeskError;
use crate::filters::LeadFilter;
use crate::helpers::{format_currency, initials, is_valid_email, parse_amount};
use crate::session::Viewer;
use crate::state::AppState;
use crate::types::{Lead, LeadStatus, NewLead, Profile, Role};

pub const LEAD_CREATED: &str = "Lead created successfully!";

/// One row in a lead table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadCard {
    pub id: String,
    pub name: String,
    pub initials: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: LeadStatus,
    pub value: Option<f64>,
    pub value_display: Option<String>,
    pub assigned_to: Option<String>,
    pub assignee_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LeadCard {
    pub fn from_lead(lead: &Lead, currency: &str) -> Self {
        Self {
            id: lead.id.clone(),
            name: lead.name.clone(),
            initials: initials(&lead.name),
            company: lead.company.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            status: lead.status,
            value: lead.value,
            value_display: lead.value.map(|v| format_currency(v, currency)),
            assigned_to: lead.assigned_to.clone(),
            assignee_name: lead.assignee_name.clone(),
            created_at: lead.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadsPage {
    pub leads: Vec<LeadCard>,
    /// Row count before filtering.
    pub total: usize,
    /// Set when the filtered list is empty.
    pub empty_message: Option<&'static str>,
}

pub async fn leads_page(
    state: &AppState,
    viewer: &Viewer,
    filter: &LeadFilter,
) -> Result<LeadsPage, DeskError> {
    let leads = state.backend.list_leads(&viewer.session).await?;
    let filtered = filter.apply(&leads);
    let currency = &state.config.currency;

    Ok(LeadsPage {
        total: leads.len(),
        empty_message: filtered.is_empty().then(|| filter.empty_message()),
        leads: filtered
            .iter()
            .map(|lead| LeadCard::from_lead(lead, currency))
            .collect(),
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadDetail {
    #[serde(flatten)]
    pub card: LeadCard,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
}

pub async fn lead_detail(
    state: &AppState,
    viewer: &Viewer,
    id: &str,
) -> Result<LeadDetail, DeskError> {
    let lead = state
        .backend
        .get_lead(&viewer.session, id)
        .await?
        .ok_or_else(|| DeskError::NotFound(format!("lead {}", id)))?;

    Ok(LeadDetail {
        card: LeadCard::from_lead(&lead, &state.config.currency),
        source: lead.source,
        notes: lead.notes,
        created_by: lead.created_by,
    })
}

pub async fn set_status(
    state: &AppState,
    viewer: &Viewer,
    id: &str,
    status: LeadStatus,
) -> Result<String, DeskError> {
    state
        .backend
        .update_lead_status(&viewer.session, id, status)
        .await?;
    log::info!("Lead {} set to {}", id, status);
    Ok(format!("Lead status updated to {}", status))
}

// =============================================================================
// Add lead
// =============================================================================

/// Raw add-lead form values. Every field arrives as text.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddLeadForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub status: String,
    pub value: String,
    pub source: String,
    pub notes: String,
    pub assigned_to: String,
}

impl AddLeadForm {
    /// Validate and normalise into an insert payload.
    pub fn into_new_lead(self, created_by: &str) -> Result<NewLead, DeskError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DeskError::Validation("Name is required".into()));
        }

        let email = optional_field(&self.email);
        if let Some(email) = &email {
            if !is_valid_email(email) {
                return Err(DeskError::Validation(format!(
                    "Invalid email address: {}",
                    email
                )));
            }
        }

        let status = match self.status.trim() {
            "" => LeadStatus::default(),
            raw => raw.parse().map_err(DeskError::Validation)?,
        };

        Ok(NewLead {
            name: name.to_string(),
            email,
            phone: optional_field(&self.phone),
            company: optional_field(&self.company),
            status,
            value: parse_amount(&self.value).map_err(DeskError::Validation)?,
            source: optional_field(&self.source),
            notes: optional_field(&self.notes),
            assigned_to: optional_field(&self.assigned_to),
            created_by: created_by.to_string(),
        })
    }
}

/// Entry in an assignee picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeOption {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl From<&Profile> for AssigneeOption {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.display_name().to_string(),
            role: profile.role,
        }
    }
}

pub async fn assignee_options(
    state: &AppState,
    viewer: &Viewer,
) -> Result<Vec<AssigneeOption>, DeskError> {
    let profiles = state
        .backend
        .list_profiles(&viewer.session, ProfileOrder::ByName)
        .await?;
    Ok(profiles.iter().map(AssigneeOption::from).collect())
}

pub async fn add_lead(
    state: &AppState,
    viewer: &Viewer,
    form: AddLeadForm,
) -> Result<&'static str, DeskError> {
    let lead = form.into_new_lead(viewer.user_id())?;
    state.backend.insert_lead(&viewer.session, &lead).await?;
    log::info!("{} created lead {:?}", viewer.user_id(), lead.name);
    Ok(LEAD_CREATED)
}

// =============================================================================
// Bulk assignment
// =============================================================================

/// Leads ticked on the assignment page, in the order they were ticked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeadSelection {
    ids: Vec<String>,
}

impl LeadSelection {
    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        let mut selection = Self::default();
        for id in ids {
            if !selection.contains(&id) {
                selection.ids.push(id);
            }
        }
        selection
    }

    /// Tick an unticked lead, untick a ticked one.
    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.ids.iter().position(|x| x == id) {
            self.ids.remove(pos);
        } else {
            self.ids.push(id.to_string());
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|x| x == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPage {
    pub leads: Vec<LeadCard>,
    pub assignees: Vec<AssigneeOption>,
}

pub async fn assign_page(state: &AppState, viewer: &Viewer) -> Result<AssignPage, DeskError> {
    let (leads, profiles) = tokio::try_join!(
        state.backend.list_leads(&viewer.session),
        state
            .backend
            .list_profiles(&viewer.session, ProfileOrder::ByName)
    )?;
    let currency = &state.config.currency;
    Ok(AssignPage {
        leads: leads
            .iter()
            .map(|lead| LeadCard::from_lead(lead, currency))
            .collect(),
        assignees: profiles.iter().map(AssigneeOption::from).collect(),
    })
}

/// Point every selected lead at `assignee` in one update.
///
/// Returns `None` without writing when nothing is selected or no assignee is
/// chosen. On success the selection is cleared.
pub async fn assign_selected(
    state: &AppState,
    viewer: &Viewer,
    selection: &mut LeadSelection,
    assignee: &str,
) -> Result<Option<String>, DeskError> {
    let assignee = assignee.trim();
    if assignee.is_empty() || selection.is_empty() {
        return Ok(None);
    }

    state
        .backend
        .assign_leads(&viewer.session, selection.ids(), assignee)
        .await?;

    let message = format!("Successfully assigned {} leads!", selection.len());
    log::info!("{} assigned {} leads to {}", viewer.user_id(), selection.len(), assignee);
    selection.clear();
    Ok(Some(message))
}
