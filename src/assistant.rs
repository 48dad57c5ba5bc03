//! Scripted assistant panel.
//!
//! No model is called: the greeting, quick actions and reply are fixed text.
//! Suggested actions carry an action key but do nothing when chosen.

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const GREETING: &str = "Hi! I'm your AI assistant. I can help you manage leads, assign tasks, and answer questions about your sales pipeline.";

pub const QUICK_ACTIONS: [&str; 3] = [
    "Show hot leads from last 7 days",
    "Assign this lead to Rajeev",
    "What's pending for today?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedAction {
    pub label: &'static str,
    pub action: &'static str,
}

const REPLY_ACTIONS: [SuggestedAction; 2] = [
    SuggestedAction {
        label: "View Hot Leads",
        action: "view_hot_leads",
    },
    SuggestedAction {
        label: "Create Reminder",
        action: "create_reminder",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<SuggestedAction>,
}

impl ChatMessage {
    fn new(speaker: Speaker, content: String, actions: Vec<SuggestedAction>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            speaker,
            content,
            timestamp: Utc::now(),
            actions,
        }
    }
}

/// Conversation log plus the draft in the input box.
#[derive(Debug, Clone, Serialize)]
pub struct Assistant {
    pub messages: Vec<ChatMessage>,
    pub draft: String,
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new()
    }
}

impl Assistant {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(
                Speaker::Assistant,
                GREETING.to_string(),
                Vec::new(),
            )],
            draft: String::new(),
        }
    }

    /// Copy a quick action's label into the draft. Unknown indexes are ignored.
    pub fn choose_quick_action(&mut self, index: usize) {
        if let Some(label) = QUICK_ACTIONS.get(index) {
            self.draft = label.to_string();
        }
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    /// Send the draft. Blank drafts are dropped without a reply.
    /// Returns true when messages were appended.
    pub fn send(&mut self) -> bool {
        if self.draft.trim().is_empty() {
            return false;
        }
        let text = std::mem::take(&mut self.draft);
        let reply = format!(
            "I understand you want to \"{}\". Here are some relevant actions you can take:",
            text
        );
        self.messages
            .push(ChatMessage::new(Speaker::User, text, Vec::new()));
        self.messages
            .push(ChatMessage::new(Speaker::Assistant, reply, REPLY_ACTIONS.to_vec()));
        true
    }
}
