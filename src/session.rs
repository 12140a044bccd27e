//! Conversation entity: one persisted transcript plus its accounting.
//!
//! Every CLI invocation restores (or creates) a [`ChatSession`], applies one
//! mutation, and writes the whole record back through the [`SessionStore`].

use chat_provider::{ChatMessage, CompletionGateway, CompletionRequest, Role};
use session_store::{SessionKind, SessionRecord, SessionStatus, SessionStore};
use time::OffsetDateTime;

use crate::commands::{parse_reserved_prompt, ReservedPrompt};

pub const CHAT_TEMPERATURE: f64 = 0.8;
pub const SHELL_TEMPERATURE: f64 = 0.2;

pub const DEFAULT_CHAT_SYSTEM_PROMPT: &str = "NEVER SAY YOU ARE AN AI LANGUAGE MODEL.";
pub const SHELL_SYSTEM_PROMPT: &str = "Output BASH commands.";

pub const SESSION_FINISHED_NOTICE: &str = "Session finished";
pub const FRESH_SESSION_NOTICE: &str = "Fresh session started";
pub const BIAS_UPDATED_NOTICE: &str = "System prompt updated";

/// One-off user turn sent by [`ChatSession::explain_last`].
pub const EXPLAIN_LAST_PROMPT: &str = "Explain the command";

const DOLLARS_PER_THOUSAND_TOKENS: f64 = 0.002;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    record: SessionRecord,
}

impl ChatSession {
    /// Creates a fresh, active session whose transcript is the system turn.
    #[must_use]
    pub fn start_new(
        store: &SessionStore,
        system_prompt: impl Into<String>,
        temperature: f64,
        kind: SessionKind,
    ) -> Self {
        Self {
            record: SessionRecord::fresh(
                store.identity(kind),
                kind,
                system_prompt,
                temperature,
                OffsetDateTime::now_utc(),
            ),
        }
    }

    /// Restores the persisted session of `kind`, or starts a fresh one when
    /// nothing usable is stored.
    #[must_use]
    pub fn restore_or_new(
        store: &SessionStore,
        system_prompt: impl Into<String>,
        temperature: f64,
        kind: SessionKind,
    ) -> Self {
        match store.load(kind) {
            Ok(record) => Self::from_record(record),
            Err(error) => {
                tracing::debug!(%error, "starting a fresh {kind} session");
                Self::start_new(store, system_prompt, temperature, kind)
            }
        }
    }

    #[must_use]
    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            record: record.normalized(),
        }
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    #[must_use]
    pub fn into_record(self) -> SessionRecord {
        self.record
    }

    pub fn identity(&self) -> &str {
        &self.record.identity
    }

    pub fn kind(&self) -> SessionKind {
        self.record.kind
    }

    pub fn system_prompt(&self) -> &str {
        &self.record.system_prompt
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.record.messages
    }

    pub fn temperature(&self) -> f64 {
        self.record.temperature
    }

    pub fn total_tokens(&self) -> u64 {
        self.record.total_tokens
    }

    pub fn status(&self) -> SessionStatus {
        self.record.status
    }

    pub fn is_finished(&self) -> bool {
        self.record.is_finished()
    }

    pub fn is_transient(&self) -> bool {
        self.record.transient
    }

    /// A transient session keeps working in memory but is never written.
    pub fn set_transient(&mut self, transient: bool) {
        self.record.transient = transient;
    }

    pub fn last_assistant_content(&self) -> Option<&str> {
        self.record
            .messages
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant)
            .map(|message| message.content.as_str())
    }

    /// Clears the transcript back to the system turn and zeroes the token
    /// count, keeping the prompt, temperature, kind and transient flag.
    pub fn reset(&mut self, store: &SessionStore) -> String {
        let transient = self.record.transient;
        let mut fresh = SessionRecord::fresh(
            self.record.identity.clone(),
            self.record.kind,
            self.record.system_prompt.clone(),
            self.record.temperature,
            OffsetDateTime::now_utc(),
        );
        fresh.stop_sequence = self.record.stop_sequence.clone();
        fresh.transient = transient;
        self.record = fresh;

        self.persist(store);
        FRESH_SESSION_NOTICE.to_string()
    }

    #[must_use]
    pub fn report_cost(&self) -> String {
        let tokens = self.record.total_tokens;
        let cost = tokens as f64 / 1000.0 * DOLLARS_PER_THOUSAND_TOKENS;
        format!("{cost:.4} $  ({tokens} tokens)")
    }

    /// Replaces the system prompt in place. History and accounting are kept.
    pub fn apply_bias(&mut self, store: &SessionStore, text: impl Into<String>) -> String {
        let text = text.into();
        self.record.system_prompt = text.clone();
        match self.record.messages.first_mut() {
            Some(first) if first.role == Role::System => first.content = text,
            _ => self.record.messages.insert(0, ChatMessage::system(text)),
        }

        self.persist(store);
        BIAS_UPDATED_NOTICE.to_string()
    }

    /// Runs one exchange and returns the text to show the user.
    ///
    /// Reserved prompts are handled locally. A failed request leaves the
    /// session exactly as it was before the call.
    pub fn converse(
        &mut self,
        gateway: &dyn CompletionGateway,
        store: &SessionStore,
        prompt: &str,
    ) -> String {
        if self.is_finished() {
            return SESSION_FINISHED_NOTICE.to_string();
        }

        match parse_reserved_prompt(prompt) {
            Some(ReservedPrompt::Restart) => return self.reset(store),
            Some(ReservedPrompt::Costs) => return self.report_cost(),
            None => {}
        }

        self.record.messages.push(ChatMessage::user(prompt));
        let request = self.request_for(self.record.messages.clone());

        match gateway.complete(request) {
            Ok(completion) => {
                self.record.total_tokens = self
                    .record
                    .total_tokens
                    .saturating_add(completion.tokens_used);
                if completion.content.contains(&self.record.stop_sequence) {
                    tracing::info!(identity = %self.record.identity, "stop sequence received");
                    self.record.status = SessionStatus::Finished;
                }
                self.record
                    .messages
                    .push(ChatMessage::assistant(completion.content.clone()));

                self.persist(store);
                completion.content
            }
            Err(error) => {
                tracing::warn!(%error, identity = %self.record.identity, "completion request failed");
                self.record.messages.pop();
                format!("Request failed: {error}")
            }
        }
    }

    /// Asks the assistant to explain its last reply without recording the
    /// question or the answer.
    pub fn explain_last(&mut self, gateway: &dyn CompletionGateway) -> String {
        if self.is_finished() {
            return SESSION_FINISHED_NOTICE.to_string();
        }

        let mut messages = self.record.messages.clone();
        messages.push(ChatMessage::user(EXPLAIN_LAST_PROMPT));

        match gateway.complete(self.request_for(messages)) {
            Ok(completion) => {
                self.record.total_tokens = self
                    .record
                    .total_tokens
                    .saturating_add(completion.tokens_used);
                completion.content
            }
            Err(error) => {
                tracing::warn!(%error, identity = %self.record.identity, "explain request failed");
                format!("Request failed: {error}")
            }
        }
    }

    fn request_for(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        CompletionRequest {
            messages,
            temperature: self.record.temperature,
            stop: self.record.stop_sequence.clone(),
        }
    }

    fn persist(&self, store: &SessionStore) {
        if let Err(error) = store.save(&self.record) {
            tracing::warn!(%error, identity = %self.record.identity, "failed to store session");
        }
    }
}

#[cfg(test)]
mod tests {
    use chat_provider::GatewayError;
    use chat_provider_mock::MockGateway;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, SessionStore) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = SessionStore::new(dir.path(), Some("tty-1".to_string()));
        (dir, store)
    }

    fn chat(store: &SessionStore) -> ChatSession {
        ChatSession::start_new(store, "be helpful", CHAT_TEMPERATURE, SessionKind::Chat)
    }

    #[test]
    fn start_new_begins_with_system_turn() {
        let (_dir, store) = store();
        let session = chat(&store);

        assert_eq!(session.messages(), &[ChatMessage::system("be helpful")]);
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.total_tokens(), 0);
        assert_eq!(session.identity(), "tty-1-chat");
    }

    #[test]
    fn report_cost_formats_four_decimals() {
        let (_dir, store) = store();
        let mut session = chat(&store);
        assert_eq!(session.report_cost(), "0.0000 $  (0 tokens)");

        session.record.total_tokens = 2000;
        assert_eq!(session.report_cost(), "0.0040 $  (2000 tokens)");
    }

    #[test]
    fn converse_appends_both_turns_and_counts_tokens() {
        let (_dir, store) = store();
        let gateway = MockGateway::replying("hello there", 17);
        let mut session = chat(&store);

        let reply = session.converse(&gateway, &store, "hi");

        assert_eq!(reply, "hello there");
        assert_eq!(
            session.messages(),
            &[
                ChatMessage::system("be helpful"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello there"),
            ]
        );
        assert_eq!(session.total_tokens(), 17);

        let request = gateway.last_request().expect("request recorded");
        assert_eq!(request.temperature, CHAT_TEMPERATURE);
        assert_eq!(request.stop, "##END##");
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn stop_sequence_in_reply_finishes_session() {
        let (_dir, store) = store();
        let gateway = MockGateway::replying("goodbye ##END##", 5);
        let mut session = chat(&store);

        session.converse(&gateway, &store, "bye");
        assert!(session.is_finished());

        let reply = session.converse(&gateway, &store, "still there?");
        assert_eq!(reply, SESSION_FINISHED_NOTICE);
        assert_eq!(gateway.call_count(), 1);
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn gateway_error_leaves_transcript_unchanged() {
        let (_dir, store) = store();
        let gateway = MockGateway::new();
        gateway.push_error(GatewayError::status(500, "server exploded"));
        let mut session = chat(&store);
        let before = session.clone();

        let reply = session.converse(&gateway, &store, "hi");

        assert_eq!(reply, "Request failed: status=500: server exploded");
        assert_eq!(session, before);
        assert!(!store.resolve_location(SessionKind::Chat).exists());
    }

    #[test]
    fn apply_bias_rewrites_system_turn_only() {
        let (_dir, store) = store();
        let gateway = MockGateway::replying("ok", 3);
        let mut session = chat(&store);
        session.converse(&gateway, &store, "hi");

        let notice = session.apply_bias(&store, "answer in French");

        assert_eq!(notice, BIAS_UPDATED_NOTICE);
        assert_eq!(session.system_prompt(), "answer in French");
        assert_eq!(session.messages()[0], ChatMessage::system("answer in French"));
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.total_tokens(), 3);
    }

    #[test]
    fn explain_last_does_not_record_the_question() {
        let (_dir, store) = store();
        let gateway = MockGateway::new();
        gateway.push_reply("ls -la", 4);
        gateway.push_reply("lists all files", 6);
        let mut session = ChatSession::start_new(
            &store,
            SHELL_SYSTEM_PROMPT,
            SHELL_TEMPERATURE,
            SessionKind::Shell,
        );
        session.converse(&gateway, &store, "list files");

        let explanation = session.explain_last(&gateway);

        assert_eq!(explanation, "lists all files");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.last_assistant_content(), Some("ls -la"));
        let request = gateway.last_request().expect("request recorded");
        assert_eq!(
            request.messages.last(),
            Some(&ChatMessage::user(EXPLAIN_LAST_PROMPT))
        );
    }

    #[test]
    fn last_assistant_content_is_none_for_fresh_session() {
        let (_dir, store) = store();
        assert_eq!(chat(&store).last_assistant_content(), None);
    }
}
