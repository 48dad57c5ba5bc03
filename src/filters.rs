//! In-memory filters for the list pages.
//!
//! Each filter keeps the input order and returns the rows that match every
//! active predicate. Text search is a case-insensitive substring match.

use std::str::FromStr;

use serde::Serialize;

use crate::types::{Lead, LeadStatus, Priority, Profile, Reminder, Role};

/// `all` or exactly one enumeration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn allows(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl<T: FromStr<Err = String>> FromStr for Selection<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            s.parse().map(Selection::Only)
        }
    }
}

fn contains_ci(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle_lower))
}

fn apply<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().filter(|row| keep(row)).cloned().collect()
}

// =============================================================================
// Leads
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub search: String,
    pub status: Selection<LeadStatus>,
}

impl LeadFilter {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || !self.status.is_all()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        let text_ok = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            contains_ci(Some(&lead.name), &needle)
                || contains_ci(lead.company.as_deref(), &needle)
                || contains_ci(lead.email.as_deref(), &needle)
        };
        text_ok && self.status.allows(&lead.status)
    }

    pub fn apply(&self, leads: &[Lead]) -> Vec<Lead> {
        apply(leads, |lead| self.matches(lead))
    }

    pub fn empty_message(&self) -> &'static str {
        if self.is_active() {
            "No leads match your filters"
        } else {
            "No leads found. Create your first lead!"
        }
    }
}

// =============================================================================
// Reminders
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl FromStr for CompletionFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(CompletionFilter::All),
            "pending" => Ok(CompletionFilter::Pending),
            "completed" => Ok(CompletionFilter::Completed),
            _ => Err(format!("Unknown completion filter: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFilter {
    pub priority: Selection<Priority>,
    pub completion: CompletionFilter,
}

impl ReminderFilter {
    pub fn matches(&self, reminder: &Reminder) -> bool {
        let completion_ok = match self.completion {
            CompletionFilter::All => true,
            CompletionFilter::Pending => !reminder.completed,
            CompletionFilter::Completed => reminder.completed,
        };
        completion_ok && self.priority.allows(&reminder.priority)
    }

    pub fn apply(&self, reminders: &[Reminder]) -> Vec<Reminder> {
        apply(reminders, |r| self.matches(r))
    }

    pub fn empty_message(&self) -> &'static str {
        "No reminders found"
    }
}

// =============================================================================
// Team
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamFilter {
    pub search: String,
    pub role: Selection<Role>,
}

impl TeamFilter {
    pub fn is_active(&self) -> bool {
        !self.search.is_empty() || !self.role.is_all()
    }

    pub fn matches(&self, profile: &Profile) -> bool {
        let text_ok = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            contains_ci(profile.full_name.as_deref(), &needle)
                || contains_ci(profile.email.as_deref(), &needle)
        };
        text_ok && self.role.allows(&profile.role)
    }

    pub fn apply<T: Clone>(&self, rows: &[T], profile_of: impl Fn(&T) -> &Profile) -> Vec<T> {
        apply(rows, |row| self.matches(profile_of(row)))
    }

    pub fn empty_message(&self) -> &'static str {
        if self.is_active() {
            "No team members match your filters"
        } else {
            "No team members found"
        }
    }
}
