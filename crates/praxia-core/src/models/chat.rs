//! Chat session and message bodies.

use serde::{Deserialize, Serialize};

/// Title given to chat sessions created without one.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Icon shown next to a cited source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceIcon {
    #[serde(rename = "who-logo")]
    Who,
    #[serde(rename = "cdc-logo")]
    Cdc,
    #[serde(rename = "nih-logo")]
    Nih,
    #[serde(rename = "mayo-logo")]
    Mayo,
    #[serde(rename = "pubmed-logo")]
    Pubmed,
    #[serde(rename = "journal-icon")]
    Journal,
    #[default]
    #[serde(rename = "source-icon")]
    Generic,
}

impl SourceIcon {
    /// Pick an icon from a publisher or journal name.
    pub fn for_source(name: &str) -> Self {
        if name.is_empty() {
            return SourceIcon::Generic;
        }

        let name = name.to_lowercase();
        let has = |needle: &str| name.contains(needle);

        if has("who") || has("world health") {
            SourceIcon::Who
        } else if has("cdc") || has("centers for disease") {
            SourceIcon::Cdc
        } else if has("nih") || has("national institutes") {
            SourceIcon::Nih
        } else if has("mayo") {
            SourceIcon::Mayo
        } else if has("pubmed") {
            SourceIcon::Pubmed
        } else {
            SourceIcon::Journal
        }
    }
}

/// Publisher of a cited reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSource {
    pub name: String,
    pub icon: SourceIcon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A reference cited by an assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReference {
    pub source: HealthSource,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<HealthReference>,
}

/// A chat session with its messages.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// A chat session as listed by `chat-sessions/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSessionSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub last_message: Option<ChatMessage>,
}

/// Request body for creating or renaming a chat session.
#[derive(Debug, Serialize)]
pub struct ChatTitleRequest<'a> {
    pub title: &'a str,
}

/// Request body for a text-only chat message.
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
}

/// Response from posting a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_mapping() {
        assert_eq!(SourceIcon::for_source("World Health Organization"), SourceIcon::Who);
        assert_eq!(SourceIcon::for_source("CDC MMWR"), SourceIcon::Cdc);
        assert_eq!(SourceIcon::for_source("NIH News"), SourceIcon::Nih);
        assert_eq!(SourceIcon::for_source("Mayo Clinic Proceedings"), SourceIcon::Mayo);
        assert_eq!(SourceIcon::for_source("PubMed Central"), SourceIcon::Pubmed);
        assert_eq!(SourceIcon::for_source("The Lancet"), SourceIcon::Journal);
        assert_eq!(SourceIcon::for_source(""), SourceIcon::Generic);
    }

    #[test]
    fn icon_wire_names() {
        assert_eq!(
            serde_json::to_value(SourceIcon::Journal).unwrap(),
            serde_json::json!("journal-icon")
        );
    }
}
