use serde::Serialize;

use crate::backend::ProfileOrder;
use crate::error::DeskError;
use crate::filters::TeamFilter;
use crate::helpers::{format_date, initials};
use crate::session::Viewer;
use crate::state::AppState;
use crate::types::{LeadStatus, Profile, Role};

/// Shown in place of the grid when the profile listing fails.
pub const TEAM_LOAD_ERROR: &str = "Error loading team members";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(flatten)]
    pub profile: Profile,
    pub display_name: String,
    pub initials: String,
    pub role_display: &'static str,
    pub joined_display: String,
    pub leads_count: usize,
    pub converted_count: usize,
}

impl TeamMember {
    fn new(profile: Profile, leads_count: usize, converted_count: usize) -> Self {
        let display_name = profile.display_name().to_string();
        Self {
            initials: initials(&display_name),
            role_display: profile.role.display_name(),
            joined_display: format_date(&profile.created_at),
            display_name,
            profile,
            leads_count,
            converted_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamStats {
    pub total: usize,
    pub admins: usize,
    pub managers: usize,
    pub associates: usize,
}

impl TeamStats {
    pub fn from_profiles<'a>(profiles: impl IntoIterator<Item = &'a Profile>) -> Self {
        let mut stats = TeamStats::default();
        for profile in profiles {
            stats.total += 1;
            match profile.role {
                Role::Admin => stats.admins += 1,
                Role::SalesManager => stats.managers += 1,
                Role::SalesAssociate => stats.associates += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPage {
    /// Computed over the whole team, not the filtered grid.
    pub stats: TeamStats,
    pub members: Vec<TeamMember>,
    pub empty_message: Option<&'static str>,
}

/// Assigned and converted lead counts for one member, fetched together.
/// A failed count is logged and reads as zero.
async fn member_counts(state: &AppState, viewer: &Viewer, member_id: &str) -> (usize, usize) {
    let (assigned, converted) = tokio::join!(
        state.backend.count_leads(&viewer.session, member_id, None),
        state
            .backend
            .count_leads(&viewer.session, member_id, Some(LeadStatus::Converted))
    );
    let or_zero = |count: Result<usize, DeskError>, what: &str| {
        count.unwrap_or_else(|e| {
            log::warn!("Failed to count {} leads for {}: {}", what, member_id, e);
            0
        })
    };
    (or_zero(assigned, "assigned"), or_zero(converted, "converted"))
}

pub async fn team_page(
    state: &AppState,
    viewer: &Viewer,
    filter: &TeamFilter,
) -> Result<TeamPage, DeskError> {
    let profiles = state
        .backend
        .list_profiles(&viewer.session, ProfileOrder::NewestFirst)
        .await?;
    let stats = TeamStats::from_profiles(&profiles);

    let mut members = Vec::with_capacity(profiles.len());
    for profile in profiles {
        let (leads_count, converted_count) = member_counts(state, viewer, &profile.id).await;
        members.push(TeamMember::new(profile, leads_count, converted_count));
    }
    log::debug!("Loaded {} team members", members.len());

    let members = filter.apply(&members, |m| &m.profile);
    Ok(TeamPage {
        stats,
        empty_message: members.is_empty().then(|| filter.empty_message()),
        members,
    })
}
