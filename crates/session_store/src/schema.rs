use std::fmt;

use chat_provider::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stop sequence sent with every request and checked on every reply.
pub const DEFAULT_STOP_SEQUENCE: &str = "##END##";

/// Sampling temperature used when a record does not carry one.
pub const DEFAULT_TEMPERATURE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    #[default]
    Chat,
    Shell,
}

impl SessionKind {
    pub const ALL: [Self; 2] = [Self::Chat, Self::Shell];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Shell => "shell",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    #[serde(rename = "ACTIVE", alias = "NEW", alias = "active")]
    Active,
    #[serde(rename = "FINISHED", alias = "DONE", alias = "finished")]
    Finished,
}

/// Persisted snapshot of one conversation.
///
/// Every field has a default so partially written or older records still
/// deserialize; [`SessionRecord::normalized`] repairs the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    pub identity: String,
    #[serde(alias = "type")]
    pub kind: SessionKind,
    #[serde(alias = "system")]
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    #[serde(alias = "totalTokens")]
    pub total_tokens: u64,
    #[serde(alias = "stopToken")]
    pub stop_sequence: String,
    pub status: SessionStatus,
    pub transient: bool,
    #[serde(
        default,
        alias = "createdAt",
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<OffsetDateTime>,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            identity: String::new(),
            kind: SessionKind::Chat,
            system_prompt: String::new(),
            messages: Vec::new(),
            temperature: DEFAULT_TEMPERATURE,
            total_tokens: 0,
            stop_sequence: DEFAULT_STOP_SEQUENCE.to_string(),
            status: SessionStatus::Active,
            transient: false,
            created_at: None,
        }
    }
}

impl SessionRecord {
    /// Builds a fresh record whose transcript is the single system turn.
    #[must_use]
    pub fn fresh(
        identity: impl Into<String>,
        kind: SessionKind,
        system_prompt: impl Into<String>,
        temperature: f64,
        created_at: OffsetDateTime,
    ) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            identity: identity.into(),
            kind,
            messages: vec![ChatMessage::system(system_prompt.clone())],
            system_prompt,
            temperature: clamp_temperature(temperature),
            created_at: Some(created_at),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    /// Repairs a loaded record so the transcript invariants hold: the first
    /// turn is the system prompt, the temperature is within `[0, 1]`, and the
    /// stop sequence is non-empty.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let starts_with_system = self
            .messages
            .first()
            .is_some_and(|message| message.role == Role::System);
        if !starts_with_system {
            self.messages
                .insert(0, ChatMessage::system(self.system_prompt.clone()));
        }

        self.temperature = clamp_temperature(self.temperature);

        if self.stop_sequence.is_empty() {
            self.stop_sequence = DEFAULT_STOP_SEQUENCE.to_string();
        }

        self
    }
}

fn clamp_temperature(temperature: f64) -> f64 {
    if temperature.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    temperature.clamp(0.0, 1.0)
}
