mod support;

use chat_provider::{ChatMessage, GatewayError, Role};
use chat_provider_mock::MockGateway;
use mastermind::session::{
    ChatSession, CHAT_TEMPERATURE, FRESH_SESSION_NOTICE, SESSION_FINISHED_NOTICE,
    SHELL_SYSTEM_PROMPT, SHELL_TEMPERATURE,
};
use session_store::{NotFoundReason, SessionKind, SessionStatus, SessionStore};
use support::temp_store;
use time::OffsetDateTime;

fn restore_chat(store: &SessionStore) -> ChatSession {
    ChatSession::restore_or_new(store, "be helpful", CHAT_TEMPERATURE, SessionKind::Chat)
}

#[test]
fn conversation_continues_across_invocations() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::new();
    gateway.push_reply("Paris", 20);
    gateway.push_reply("About two million", 30);

    let mut first = restore_chat(&store);
    assert_eq!(first.converse(&gateway, &store, "capital of France?"), "Paris");

    let mut second = restore_chat(&store);
    assert_eq!(
        second.converse(&gateway, &store, "population?"),
        "About two million"
    );

    let request = gateway.last_request().expect("request recorded");
    assert_eq!(
        request.messages,
        vec![
            ChatMessage::system("be helpful"),
            ChatMessage::user("capital of France?"),
            ChatMessage::assistant("Paris"),
            ChatMessage::user("population?"),
        ]
    );
    assert_eq!(restore_chat(&store).total_tokens(), 50);
}

#[test]
fn reset_always_leaves_only_the_system_turn() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::replying("sure", 5);
    let mut session = restore_chat(&store);
    session.converse(&gateway, &store, "one");
    session.converse(&gateway, &store, "two");

    let first = session.reset(&store);
    let after_first = session.clone();
    let second = session.reset(&store);

    assert_eq!(first, FRESH_SESSION_NOTICE);
    assert_eq!(second, first);
    let mut first_record = after_first.into_record();
    let mut second_record = session.record().clone();
    assert!(first_record.created_at.is_some());
    assert!(second_record.created_at >= first_record.created_at);
    first_record.created_at = None;
    second_record.created_at = None;
    assert_eq!(second_record, first_record);
    assert_eq!(session.total_tokens(), 0);
    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.messages()[0].role, Role::System);

    let restored = restore_chat(&store);
    assert_eq!(restored.messages(), &[ChatMessage::system("be helpful")]);
}

#[test]
fn restart_prompt_resets_without_a_request() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::replying("ok", 2);
    let mut session = restore_chat(&store);
    for prompt in ["a", "b", "c"] {
        session.converse(&gateway, &store, prompt);
    }
    assert_eq!(session.messages().len(), 7);

    let reply = session.converse(&gateway, &store, "restart");

    assert_eq!(reply, FRESH_SESSION_NOTICE);
    assert_eq!(session.messages().len(), 1);
    assert_eq!(gateway.call_count(), 3);
    assert_eq!(restore_chat(&store).messages().len(), 1);
}

#[test]
fn costs_prompt_reports_without_a_request() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::replying("ok", 2000);
    let mut session = restore_chat(&store);
    session.converse(&gateway, &store, "hi");

    let reply = session.converse(&gateway, &store, "costs");

    assert_eq!(reply, "0.0040 $  (2000 tokens)");
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(session.messages().len(), 3);
}

#[test]
fn finished_session_stays_finished_after_restore() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::replying("Farewell. ##END##", 8);
    let mut session = restore_chat(&store);
    session.converse(&gateway, &store, "goodbye");

    let mut restored = restore_chat(&store);
    assert!(restored.is_finished());

    let reply = restored.converse(&gateway, &store, "are you there?");
    assert_eq!(reply, SESSION_FINISHED_NOTICE);
    assert_eq!(reply, restored.converse(&gateway, &store, "restart"));
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(restored.messages().len(), 3);
}

#[test]
fn failed_request_is_not_persisted() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::new();
    gateway.push_reply("first", 3);
    gateway.push_error(GatewayError::transport("connection refused"));

    let mut session = restore_chat(&store);
    session.converse(&gateway, &store, "hello");
    let reply = session.converse(&gateway, &store, "again");

    assert_eq!(reply, "Request failed: connection refused");
    let restored = restore_chat(&store);
    assert_eq!(restored.messages().len(), 3);
    assert_eq!(restored.total_tokens(), 3);
    assert_eq!(restored, session);
}

#[test]
fn transient_session_is_never_stored() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::replying("ok", 1);
    let mut session = restore_chat(&store);
    session.set_transient(true);

    session.converse(&gateway, &store, "hi");
    session.reset(&store);

    let error = store
        .load(SessionKind::Chat)
        .expect_err("nothing should be stored");
    assert_eq!(error.not_found_reason(), Some(&NotFoundReason::Missing));
}

#[test]
fn expired_session_is_replaced_by_a_fresh_one() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::replying("ok", 1);
    let mut session = restore_chat(&store);
    session.converse(&gateway, &store, "hi");

    let mut record = session.into_record();
    record.created_at = Some(OffsetDateTime::now_utc() - time::Duration::hours(2));
    store.save(&record).expect("record should be saved");

    let restored = restore_chat(&store);
    assert_eq!(restored.messages(), &[ChatMessage::system("be helpful")]);
    assert_eq!(restored.total_tokens(), 0);
}

#[test]
fn saved_session_round_trips() {
    let (_dir, store) = temp_store();
    let gateway = MockGateway::replying("echo hi", 11);
    let mut session = ChatSession::start_new(
        &store,
        SHELL_SYSTEM_PROMPT,
        SHELL_TEMPERATURE,
        SessionKind::Shell,
    );
    session.converse(&gateway, &store, "print hi");

    let loaded = store.load(SessionKind::Shell).expect("record should load");
    assert_eq!(&loaded, session.record());
}

#[test]
fn persistence_failure_does_not_lose_the_reply() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blocker = dir.path().join("not-a-directory");
    std::fs::write(&blocker, "file").expect("blocker written");
    let store = SessionStore::new(&blocker, Some("tty".to_string()));
    let gateway = MockGateway::replying("still answered", 4);

    let mut session = restore_chat(&store);
    let reply = session.converse(&gateway, &store, "hi");

    assert_eq!(reply, "still answered");
    assert_eq!(session.messages().len(), 3);
}
