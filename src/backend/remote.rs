//! Client for the hosted backend: GoTrue auth under `/auth/v1` and PostgREST
//! tables under `/rest/v1`.
//!
//! Every request carries the project's anon key in `apikey` and a bearer
//! token: the caller's access token once signed in, the anon key before.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::postgrest::{parse_content_range_total, Direction, TableQuery};
use super::{Backend, ProfileOrder};
use crate::error::DeskError;
use crate::types::{
    AuthUser, Lead, LeadRef, LeadStatus, NewLead, NewReminder, Priority, Profile, ProfileUpdate,
    Reminder, Role, Session, SignUpMetadata, SignUpOutcome,
};

const LEAD_SELECT: &str = "*,profiles:assigned_to(full_name)";
const REMINDER_SELECT: &str = "*,leads(name,company)";

pub struct RemoteBackend {
    client: reqwest::Client,
    base: Url,
    anon_key: String,
    timeout_secs: u64,
}

impl RemoteBackend {
    pub fn new(project_url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self, DeskError> {
        let base = normalize_base(project_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DeskError::ConfigurationError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base,
            anon_key: anon_key.to_string(),
            timeout_secs,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DeskError> {
        self.base
            .join(path)
            .map_err(|e| DeskError::ConfigurationError(format!("Bad endpoint {}: {}", path, e)))
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        session: Option<&Session>,
    ) -> Result<RequestBuilder, DeskError> {
        let token = session
            .map(|s| s.access_token.as_str())
            .unwrap_or(&self.anon_key);
        Ok(self
            .client
            .request(method, self.endpoint(path)?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token))
    }

    /// Send and turn transport failures and non-2xx answers into `DeskError`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, DeskError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                DeskError::Timeout(self.timeout_secs)
            } else {
                DeskError::from(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        log::debug!("Backend answered {}: {}", status, body);
        Err(api_error(status, &body))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        session: &Session,
        query: &TableQuery,
    ) -> Result<Vec<T>, DeskError> {
        let request = self
            .request(Method::GET, &query.path(), Some(session))?
            .query(query.params());
        let rows = self.send(request).await?.json::<Vec<T>>().await?;
        Ok(rows)
    }

    /// PATCH rows matching `query`, failing with `NotFound` if none matched.
    async fn patch_one(
        &self,
        session: &Session,
        query: &TableQuery,
        body: &serde_json::Value,
        what: &str,
    ) -> Result<(), DeskError> {
        let request = self
            .request(Method::PATCH, &query.path(), Some(session))?
            .query(query.params())
            .header("Prefer", "return=representation")
            .json(body);
        let rows: Vec<serde_json::Value> = self.send(request).await?.json().await?;
        if rows.is_empty() {
            return Err(DeskError::NotFound(what.to_string()));
        }
        Ok(())
    }

    async fn insert<B: serde::Serialize + Sync>(
        &self,
        session: &Session,
        table: &'static str,
        body: &B,
    ) -> Result<(), DeskError> {
        let request = self
            .request(Method::POST, &TableQuery::new(table).path(), Some(session))?
            .header("Prefer", "return=minimal")
            .json(body);
        self.send(request).await?;
        Ok(())
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, DeskError> {
        let request = self
            .request(Method::POST, "auth/v1/token", None)?
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let grant: TokenGrant = self.send(request).await?.json().await?;
        Ok(grant.into_session(Utc::now()))
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, DeskError> {
        self.token_grant(
            "password",
            serde_json::json!({ "email": email.trim(), "password": password }),
        )
        .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpOutcome, DeskError> {
        let request = self
            .request(Method::POST, "auth/v1/signup", None)?
            .json(&serde_json::json!({
                "email": email.trim(),
                "password": password,
                "data": metadata,
            }));
        let body: serde_json::Value = self.send(request).await?.json().await?;
        parse_sign_up(body, Utc::now())
    }

    async fn sign_out(&self, session: &Session) -> Result<(), DeskError> {
        let request = self.request(Method::POST, "auth/v1/logout", Some(session))?;
        self.send(request).await?;
        Ok(())
    }

    async fn refresh_session(&self, session: &Session) -> Result<Session, DeskError> {
        self.token_grant(
            "refresh_token",
            serde_json::json!({ "refresh_token": session.refresh_token }),
        )
        .await
    }

    async fn ensure_profile_exists(
        &self,
        session: Option<&Session>,
        user_id: &str,
    ) -> Result<(), DeskError> {
        let request = self
            .request(Method::POST, "rest/v1/rpc/ensure_profile_exists", session)?
            .json(&serde_json::json!({ "user_id": user_id }));
        self.send(request).await?;
        Ok(())
    }

    async fn get_profile(&self, session: &Session, id: &str) -> Result<Option<Profile>, DeskError> {
        let query = TableQuery::new("profiles").select("*").eq("id", id).limit(1);
        let rows: Vec<ProfileRow> = self.select(session, &query).await?;
        Ok(rows.into_iter().next().map(Profile::from))
    }

    async fn list_profiles(
        &self,
        session: &Session,
        order: ProfileOrder,
    ) -> Result<Vec<Profile>, DeskError> {
        let query = TableQuery::new("profiles").select("*");
        let query = match order {
            ProfileOrder::NewestFirst => query.order("created_at", Direction::Desc),
            ProfileOrder::ByName => query.order("full_name", Direction::Asc),
        };
        let rows: Vec<ProfileRow> = self.select(session, &query).await?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }

    async fn update_profile(
        &self,
        session: &Session,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<(), DeskError> {
        let query = TableQuery::new("profiles").eq("id", id).select("id");
        let body = serde_json::to_value(update)?;
        self.patch_one(session, &query, &body, &format!("profile {}", id))
            .await
    }

    async fn list_leads(&self, session: &Session) -> Result<Vec<Lead>, DeskError> {
        let query = TableQuery::new("leads")
            .select(LEAD_SELECT)
            .order("created_at", Direction::Desc);
        let rows: Vec<LeadRow> = self.select(session, &query).await?;
        Ok(rows.into_iter().map(Lead::from).collect())
    }

    async fn get_lead(&self, session: &Session, id: &str) -> Result<Option<Lead>, DeskError> {
        let query = TableQuery::new("leads")
            .select(LEAD_SELECT)
            .eq("id", id)
            .limit(1);
        let rows: Vec<LeadRow> = self.select(session, &query).await?;
        Ok(rows.into_iter().next().map(Lead::from))
    }

    async fn insert_lead(&self, session: &Session, lead: &NewLead) -> Result<(), DeskError> {
        self.insert(session, "leads", lead).await
    }

    async fn assign_leads(
        &self,
        session: &Session,
        ids: &[String],
        assignee: &str,
    ) -> Result<(), DeskError> {
        if ids.is_empty() {
            return Ok(());
        }
        let query = TableQuery::new("leads").in_list("id", ids);
        let request = self
            .request(Method::PATCH, &query.path(), Some(session))?
            .query(query.params())
            .header("Prefer", "return=minimal")
            .json(&serde_json::json!({ "assigned_to": assignee }));
        self.send(request).await?;
        Ok(())
    }

    async fn update_lead_status(
        &self,
        session: &Session,
        id: &str,
        status: LeadStatus,
    ) -> Result<(), DeskError> {
        let query = TableQuery::new("leads").eq("id", id).select("id");
        let body = serde_json::json!({ "status": status.as_str() });
        self.patch_one(session, &query, &body, &format!("lead {}", id))
            .await
    }

    async fn count_leads(
        &self,
        session: &Session,
        assignee: &str,
        status: Option<LeadStatus>,
    ) -> Result<usize, DeskError> {
        let mut query = TableQuery::new("leads")
            .select("id")
            .eq("assigned_to", assignee);
        if let Some(status) = status {
            query = query.eq("status", status.as_str());
        }

        let request = self
            .request(Method::HEAD, &query.path(), Some(session))?
            .query(query.params())
            .header("Prefer", "count=exact");
        let response = self.send(request).await?;

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| DeskError::ParseError("missing Content-Range count".into()))
    }

    async fn list_reminders(&self, session: &Session) -> Result<Vec<Reminder>, DeskError> {
        let query = TableQuery::new("reminders")
            .select(REMINDER_SELECT)
            .order("due_date", Direction::Asc);
        let rows: Vec<ReminderRow> = self.select(session, &query).await?;
        Ok(rows.into_iter().map(Reminder::from).collect())
    }

    async fn get_reminder(
        &self,
        session: &Session,
        id: &str,
    ) -> Result<Option<Reminder>, DeskError> {
        let query = TableQuery::new("reminders")
            .select(REMINDER_SELECT)
            .eq("id", id)
            .limit(1);
        let rows: Vec<ReminderRow> = self.select(session, &query).await?;
        Ok(rows.into_iter().next().map(Reminder::from))
    }

    async fn insert_reminder(
        &self,
        session: &Session,
        reminder: &NewReminder,
    ) -> Result<(), DeskError> {
        self.insert(session, "reminders", reminder).await
    }

    async fn set_reminder_completed(
        &self,
        session: &Session,
        id: &str,
        completed: bool,
    ) -> Result<(), DeskError> {
        let query = TableQuery::new("reminders").eq("id", id).select("id");
        let body = serde_json::json!({ "completed": completed });
        self.patch_one(session, &query, &body, &format!("reminder {}", id))
            .await
    }
}

// =============================================================================
// Wire formats
// =============================================================================

/// Project URLs are joined against, so they must end in `/`.
fn normalize_base(project_url: &str) -> Result<Url, DeskError> {
    let trimmed = project_url.trim();
    if trimmed.is_empty() {
        return Err(DeskError::ConfigurationError(
            "supabaseUrl is required for the remote backend".into(),
        ));
    }
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash)
        .map_err(|e| DeskError::ConfigurationError(format!("Invalid supabaseUrl: {}", e)))
}

/// Pull the human-readable message out of a PostgREST or GoTrue error body.
fn api_error(status: StatusCode, body: &str) -> DeskError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            ["message", "error_description", "msg", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_str()).map(String::from))
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    if status == StatusCode::UNAUTHORIZED {
        log::warn!("Backend rejected credentials: {}", message);
    }

    DeskError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenGrant {
    fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .unwrap_or_else(|| now.timestamp() + self.expires_in.unwrap_or(3600));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Sign-up answers with a full token grant when the project auto-confirms,
/// otherwise with the bare user (older servers wrap it in `user`).
fn parse_sign_up(body: serde_json::Value, now: DateTime<Utc>) -> Result<SignUpOutcome, DeskError> {
    if body.get("access_token").is_some() {
        let grant: TokenGrant = serde_json::from_value(body)?;
        let session = grant.into_session(now);
        return Ok(SignUpOutcome {
            user: session.user.clone(),
            session: Some(session),
        });
    }

    let user_value = match body.get("user") {
        Some(user) if user.is_object() => user.clone(),
        _ => body,
    };
    let user: AuthUser = serde_json::from_value(user_value)?;
    Ok(SignUpOutcome {
        user,
        session: None,
    })
}

#[derive(Debug, Deserialize)]
struct ProfileRow {
    id: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    role: Role,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            role: row.role,
            phone: row.phone,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AssigneeRef {
    #[serde(default)]
    full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeadRow {
    id: String,
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    company: Option<String>,
    status: LeadStatus,
    #[serde(default)]
    value: Option<f64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
    #[serde(default)]
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    profiles: Option<AssigneeRef>,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Lead {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            company: row.company,
            status: row.status,
            value: row.value,
            source: row.source,
            notes: row.notes,
            assigned_to: row.assigned_to,
            assignee_name: row.profiles.and_then(|p| p.full_name),
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReminderRow {
    id: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    due_date: DateTime<Utc>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    lead_id: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
    #[serde(default)]
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    leads: Option<LeadRef>,
}

impl From<ReminderRow> for Reminder {
    fn from(row: ReminderRow) -> Self {
        Reminder {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            priority: row.priority,
            completed: row.completed,
            lead_id: row.lead_id,
            lead: row.leads,
            assigned_to: row.assigned_to,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Answers a single request with `response` and hands back the raw
    /// request text.
    fn serve_once(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&raw) {
                let n = stream.read(&mut buf).expect("read request");
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
            }
            stream
                .write_all(response.as_bytes())
                .expect("write response");
            String::from_utf8_lossy(&raw).into_owned()
        });
        (format!("http://{}", addr), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = header_in(head, "content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= length
    }

    fn header_in(head: &str, name: &str) -> Option<String> {
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    struct Captured {
        method: String,
        url: Url,
        head: String,
        body: String,
    }

    impl Captured {
        fn parse(raw: &str) -> Self {
            let (head, body) = raw.split_once("\r\n\r\n").expect("request head");
            let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
            let method = request_line.next().unwrap_or_default().to_string();
            let target = request_line.next().unwrap_or_default();
            Self {
                method,
                url: Url::parse(&format!("http://localhost{}", target)).expect("target"),
                head: head.to_string(),
                body: body.to_string(),
            }
        }

        fn header(&self, name: &str) -> Option<String> {
            header_in(&self.head, name)
        }

        fn query(&self, key: &str) -> Option<String> {
            self.url
                .query_pairs()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.into_owned())
        }

        fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).expect("json body")
        }
    }

    fn session() -> Session {
        Session {
            access_token: "user-token".into(),
            refresh_token: "rt".into(),
            expires_at: 1_900_000_000,
            user: AuthUser {
                id: "u1".into(),
                email: Some("jane@company.com".into()),
                email_confirmed_at: None,
            },
        }
    }

    #[tokio::test]
    async fn test_count_leads_asks_for_exact_count() {
        let (base, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Range: 0-2/3\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let backend = RemoteBackend::new(&base, "anon-key", 5).expect("backend");
        let count = backend
            .count_leads(&session(), "p1", Some(LeadStatus::Converted))
            .await
            .expect("count");
        assert_eq!(count, 3);

        let request = Captured::parse(&server.join().expect("server"));
        assert_eq!(request.method, "HEAD");
        assert_eq!(request.url.path(), "/rest/v1/leads");
        assert_eq!(request.query("select").as_deref(), Some("id"));
        assert_eq!(request.query("assigned_to").as_deref(), Some("eq.p1"));
        assert_eq!(request.query("status").as_deref(), Some("eq.converted"));
        assert_eq!(request.header("apikey").as_deref(), Some("anon-key"));
        assert_eq!(
            request.header("authorization").as_deref(),
            Some("Bearer user-token")
        );
        assert_eq!(request.header("prefer").as_deref(), Some("count=exact"));
    }

    #[tokio::test]
    async fn test_assign_leads_patches_id_list() {
        let (base, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n");
        let backend = RemoteBackend::new(&base, "anon-key", 5).expect("backend");
        backend
            .assign_leads(&session(), &["l1".to_string(), "l2".to_string()], "p9")
            .await
            .expect("assign");

        let request = Captured::parse(&server.join().expect("server"));
        assert_eq!(request.method, "PATCH");
        assert_eq!(request.url.path(), "/rest/v1/leads");
        assert_eq!(request.query("id").as_deref(), Some("in.(l1,l2)"));
        assert_eq!(request.header("prefer").as_deref(), Some("return=minimal"));
        assert_eq!(request.json(), serde_json::json!({ "assigned_to": "p9" }));
    }

    #[tokio::test]
    async fn test_anonymous_profile_rpc_uses_anon_key() {
        let (base, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n");
        let backend = RemoteBackend::new(&base, "anon-key", 5).expect("backend");
        backend
            .ensure_profile_exists(None, "u1")
            .await
            .expect("rpc");

        let request = Captured::parse(&server.join().expect("server"));
        assert_eq!(request.method, "POST");
        assert_eq!(request.url.path(), "/rest/v1/rpc/ensure_profile_exists");
        assert_eq!(request.header("apikey").as_deref(), Some("anon-key"));
        assert_eq!(
            request.header("authorization").as_deref(),
            Some("Bearer anon-key")
        );
        assert_eq!(request.json(), serde_json::json!({ "user_id": "u1" }));
    }

    #[tokio::test]
    async fn test_rejected_request_becomes_api_error() {
        let (base, server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Type: application/json\r\nContent-Length: 25\r\nConnection: close\r\n\r\n{\"message\":\"JWT expired\"}",
        );
        let backend = RemoteBackend::new(&base, "anon-key", 5).expect("backend");
        let err = backend.list_leads(&session()).await.expect_err("rejected");
        assert!(matches!(err, DeskError::Api { status: 401, .. }));
        assert_eq!(err.to_string(), "JWT expired");

        let request = Captured::parse(&server.join().expect("server"));
        assert_eq!(request.method, "GET");
        assert_eq!(
            request.query("select").as_deref(),
            Some("*,profiles:assigned_to(full_name)")
        );
        assert_eq!(request.query("order").as_deref(), Some("created_at.desc"));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let base = normalize_base("https://abc.supabase.co").expect("valid");
        assert_eq!(
            base.join("rest/v1/leads").expect("join").as_str(),
            "https://abc.supabase.co/rest/v1/leads"
        );

        let proxied = normalize_base("https://proxy.example.com/project").expect("valid");
        assert_eq!(
            proxied.join("auth/v1/token").expect("join").as_str(),
            "https://proxy.example.com/project/auth/v1/token"
        );

        assert!(matches!(
            normalize_base("  "),
            Err(DeskError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_api_error_message_sources() {
        let postgrest = api_error(
            StatusCode::CONFLICT,
            r#"{"code":"23505","message":"duplicate key value","details":null}"#,
        );
        assert_eq!(postgrest.to_string(), "duplicate key value");

        let gotrue = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(gotrue.to_string(), "Invalid login credentials");

        let newer_gotrue = api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"code":422,"msg":"User already registered"}"#,
        );
        assert_eq!(newer_gotrue.to_string(), "User already registered");

        let plain = api_error(StatusCode::BAD_GATEWAY, "");
        assert!(matches!(plain, DeskError::Api { status: 502, .. }));
        assert_eq!(plain.to_string(), "Bad Gateway");
    }

    #[test]
    fn test_token_grant_computes_expiry() {
        let now = Utc::now();
        let grant: TokenGrant = serde_json::from_value(serde_json::json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": { "id": "u1", "email": "jane@company.com" }
        }))
        .expect("parse");
        let session = grant.into_session(now);
        assert_eq!(session.expires_at, now.timestamp() + 3600);
        assert_eq!(session.user.email.as_deref(), Some("jane@company.com"));
    }

    #[test]
    fn test_sign_up_without_confirmation() {
        let outcome = parse_sign_up(
            serde_json::json!({
                "id": "u1",
                "email": "jane@company.com",
                "email_confirmed_at": null,
                "user_metadata": { "full_name": "Jane", "role": "sales_associate" }
            }),
            Utc::now(),
        )
        .expect("parse");
        assert!(outcome.session.is_none());
        assert!(!outcome.email_confirmed());
    }

    #[test]
    fn test_sign_up_auto_confirmed() {
        let outcome = parse_sign_up(
            serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_at": 1_900_000_000,
                "user": {
                    "id": "u1",
                    "email": "jane@company.com",
                    "email_confirmed_at": "2026-10-18T09:00:00Z"
                }
            }),
            Utc::now(),
        )
        .expect("parse");
        assert!(outcome.email_confirmed());
        assert_eq!(outcome.session.map(|s| s.expires_at), Some(1_900_000_000));
    }

    #[test]
    fn test_lead_row_with_joined_assignee() {
        let row: LeadRow = serde_json::from_value(serde_json::json!({
            "id": "l1",
            "name": "Sarah Johnson",
            "email": "sarah@acme.com",
            "phone": null,
            "company": "Acme Corp",
            "status": "hot",
            "value": 25000,
            "assigned_to": "p1",
            "created_by": "p2",
            "created_at": "2026-10-01T12:30:00.123456+00:00",
            "profiles": { "full_name": "Rajeev Menon" }
        }))
        .expect("parse");
        let lead = Lead::from(row);
        assert_eq!(lead.status, LeadStatus::Hot);
        assert_eq!(lead.value, Some(25_000.0));
        assert_eq!(lead.assignee_name.as_deref(), Some("Rajeev Menon"));
        assert_eq!(lead.source, None);
    }

    #[test]
    fn test_reminder_row_without_lead() {
        let row: ReminderRow = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "title": "Follow up",
            "due_date": "2026-10-20T15:00:00+00:00",
            "priority": "high",
            "completed": false,
            "lead_id": null,
            "created_at": "2026-10-18T09:00:00+00:00",
            "leads": null
        }))
        .expect("parse");
        let reminder = Reminder::from(row);
        assert_eq!(reminder.priority, Priority::High);
        assert!(reminder.lead.is_none());
    }

    #[test]
    fn test_unknown_role_fails_to_decode() {
        let result = serde_json::from_value::<ProfileRow>(serde_json::json!({
            "id": "p1",
            "role": "sales_rep",
            "created_at": "2026-10-18T09:00:00+00:00"
        }));
        assert!(result.is_err());
    }
}
