//! Dashboard service: headline stats, recent leads and today's reminders.

use chrono::{DateTime, Duration, Local, Utc};
use serde::Serialize;

use super::leads::LeadCard;
use super::reminders::ReminderCard;
use crate::error::DeskError;
use crate::helpers::{format_count, format_currency, percent_change};
use crate::session::Viewer;
use crate::state::AppState;
use crate::types::{Lead, LeadStatus, Reminder};

/// Length of the comparison window behind each stat card's change figure.
pub const TREND_WINDOW_DAYS: i64 = 30;
pub const RECENT_LEADS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCard {
    pub title: &'static str,
    pub value: String,
    /// "+12%" / "-4%"
    pub change: String,
    pub trend: Trend,
}

impl StatCard {
    fn new(title: &'static str, value: String, current: f64, previous: f64) -> Self {
        let pct = percent_change(current, previous);
        Self {
            title,
            value,
            change: format!("{:+}%", pct),
            trend: if pct < 0 { Trend::Down } else { Trend::Up },
        }
    }
}

/// Which of the two trailing windows a creation timestamp falls in.
enum Window {
    Current,
    Previous,
    Older,
}

fn window_of(created_at: DateTime<Utc>, now: DateTime<Utc>) -> Window {
    let span = Duration::days(TREND_WINDOW_DAYS);
    if created_at > now - span {
        Window::Current
    } else if created_at > now - span - span {
        Window::Previous
    } else {
        Window::Older
    }
}

/// Sum `measure` over leads created in the current and previous windows.
fn windowed(leads: &[Lead], now: DateTime<Utc>, measure: impl Fn(&Lead) -> f64) -> (f64, f64) {
    leads
        .iter()
        .fold((0.0, 0.0), |(cur, prev), lead| match window_of(lead.created_at, now) {
            Window::Current => (cur + measure(lead), prev),
            Window::Previous => (cur, prev + measure(lead)),
            Window::Older => (cur, prev),
        })
}

/// Total leads, hot leads, converted leads and converted revenue.
pub fn compute_stats(leads: &[Lead], now: DateTime<Utc>, currency: &str) -> Vec<StatCard> {
    let count_where = |status: Option<LeadStatus>| {
        move |lead: &Lead| match status {
            Some(s) if lead.status != s => 0.0,
            _ => 1.0,
        }
    };
    let revenue = |lead: &Lead| match lead.status {
        LeadStatus::Converted => lead.value.unwrap_or(0.0),
        _ => 0.0,
    };

    let hot = leads.iter().filter(|l| l.status == LeadStatus::Hot).count();
    let converted = leads
        .iter()
        .filter(|l| l.status == LeadStatus::Converted)
        .count();
    let total_revenue: f64 = leads.iter().map(revenue).sum();

    let (all_cur, all_prev) = windowed(leads, now, count_where(None));
    let (hot_cur, hot_prev) = windowed(leads, now, count_where(Some(LeadStatus::Hot)));
    let (conv_cur, conv_prev) = windowed(leads, now, count_where(Some(LeadStatus::Converted)));
    let (rev_cur, rev_prev) = windowed(leads, now, revenue);

    vec![
        StatCard::new("Total Leads", format_count(leads.len()), all_cur, all_prev),
        StatCard::new("Hot Leads", format_count(hot), hot_cur, hot_prev),
        StatCard::new("Converted", format_count(converted), conv_cur, conv_prev),
        StatCard::new(
            "Revenue",
            format_currency(total_revenue, currency),
            rev_cur,
            rev_prev,
        ),
    ]
}

/// Open reminders due on the local calendar day of `now`, earliest first.
fn due_today(reminders: &[Reminder], now: DateTime<Utc>) -> Vec<ReminderCard> {
    let today = now.with_timezone(&Local).date_naive();
    reminders
        .iter()
        .filter(|r| !r.completed && r.due_date.with_timezone(&Local).date_naive() == today)
        .map(|r| ReminderCard::from_reminder(r, now))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPage {
    pub welcome_name: String,
    pub stats: Vec<StatCard>,
    pub recent_leads: Vec<LeadCard>,
    pub todays_reminders: Vec<ReminderCard>,
}

pub async fn dashboard_page(state: &AppState, viewer: &Viewer) -> Result<DashboardPage, DeskError> {
    let (leads, reminders) = tokio::try_join!(
        state.backend.list_leads(&viewer.session),
        state.backend.list_reminders(&viewer.session)
    )?;
    let now = Utc::now();
    let currency = &state.config.currency;

    Ok(DashboardPage {
        welcome_name: viewer.profile.display_name().to_string(),
        stats: compute_stats(&leads, now, currency),
        recent_leads: leads
            .iter()
            .take(RECENT_LEADS)
            .map(|lead| LeadCard::from_lead(lead, currency))
            .collect(),
        todays_reminders: due_today(&reminders, now),
    })
}
