use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration stored in ~/.leaddesk/config.json
///
/// Accepts `url`/`key` as aliases so a project's dashboard snippet can be
/// pasted in unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    #[serde(default, alias = "key", skip_serializing_if = "Option::is_none")]
    pub anon_key: Option<String>,
    /// Path to the SQLite file used by the local backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_db_path: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            supabase_url: None,
            anon_key: None,
            local_db_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            currency: default_currency(),
        }
    }
}

/// Which store the desk talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted auth + REST tables
    Remote,
    /// Embedded SQLite file
    #[default]
    Local,
}

// =============================================================================
// Enumerations
// =============================================================================

/// Team member role. Controls navigation and permitted pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    SalesManager,
    SalesAssociate,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::SalesManager, Role::SalesAssociate];

    /// Wire value stored in the `profiles.role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SalesManager => "sales_manager",
            Role::SalesAssociate => "sales_associate",
        }
    }

    /// "Sales Manager"
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::SalesManager => "Sales Manager",
            Role::SalesAssociate => "Sales Associate",
        }
    }

    /// Sidebar badge text: the wire value with `_` replaced by a space.
    pub fn badge(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "sales_manager" | "manager" => Ok(Role::SalesManager),
            "sales_associate" | "associate" => Ok(Role::SalesAssociate),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Sales status of a lead
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    Hot,
    Warm,
    #[default]
    Cold,
    Converted,
    Lost,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::Hot,
        LeadStatus::Warm,
        LeadStatus::Cold,
        LeadStatus::Converted,
        LeadStatus::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Hot => "hot",
            LeadStatus::Warm => "warm",
            LeadStatus::Cold => "cold",
            LeadStatus::Converted => "converted",
            LeadStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hot" => Ok(LeadStatus::Hot),
            "warm" => Ok(LeadStatus::Warm),
            "cold" => Ok(LeadStatus::Cold),
            "converted" => Ok(LeadStatus::Converted),
            "lost" => Ok(LeadStatus::Lost),
            _ => Err(format!("Unknown lead status: {}", s)),
        }
    }
}

/// Reminder priority level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

// =============================================================================
// Records
// =============================================================================

/// An application user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Name to show on cards; falls back like the team grid does.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Unnamed User",
        }
    }
}

/// A prospective customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: LeadStatus,
    pub value: Option<f64>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
    /// Joined from the assignee's profile row.
    pub assignee_name: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A scheduled follow-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub completed: bool,
    pub lead_id: Option<String>,
    /// Joined lead name and company, if the reminder is linked to one.
    pub lead: Option<LeadRef>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    /// Overdue means still open and due strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date < now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadRef {
    pub name: String,
    pub company: Option<String>,
}

// =============================================================================
// Writes
// =============================================================================

/// Insert payload for the `leads` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: LeadStatus,
    pub value: Option<f64>,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub assigned_to: Option<String>,
    pub created_by: String,
}

/// Insert payload for the `reminders` table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReminder {
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub lead_id: Option<String>,
    pub assigned_to: String,
    pub created_by: String,
}

/// Columns the settings form may overwrite
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Signed-in user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<String>,
}

/// Persisted auth session (token grant response shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds
    pub expires_at: i64,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now.timestamp()
    }
}

/// User metadata attached at sign-up and copied into the profile row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    pub full_name: String,
    pub role: Role,
}

/// Result of a sign-up call
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpOutcome {
    pub user: AuthUser,
    /// Present when the provider confirms and signs in immediately.
    pub session: Option<Session>,
}

impl SignUpOutcome {
    pub fn email_confirmed(&self) -> bool {
        self.user.email_confirmed_at.is_some()
    }
}
