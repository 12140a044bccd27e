use openai_api::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};
use serde_json::{json, Value};

#[test]
fn payload_serialization_omits_unset_optional_fields() {
    let request = ChatCompletionRequest::new("gpt-3.5-turbo", vec![WireMessage::new("user", "hi")]);
    let body = serde_json::to_value(&request).expect("serialize payload");

    assert_eq!(body["model"], Value::String("gpt-3.5-turbo".to_string()));
    assert_eq!(body["messages"], json!([{"role": "user", "content": "hi"}]));
    assert!(body.get("temperature").is_none());
    assert!(body.get("stop").is_none());
}

#[test]
fn payload_serialization_includes_temperature_and_stop() {
    let request = ChatCompletionRequest::new(
        "gpt-3.5-turbo",
        vec![
            WireMessage::new("system", ""),
            WireMessage::new("user", "hi"),
        ],
    )
    .with_temperature(0.2)
    .with_stop("##END##");

    let body = serde_json::to_value(&request).expect("serialize payload");
    assert_eq!(body["temperature"], json!(0.2));
    assert_eq!(body["stop"], json!("##END##"));
    assert_eq!(body["messages"][0]["role"], json!("system"));
}

#[test]
fn blank_stop_sequence_is_not_sent() {
    let request = ChatCompletionRequest::new("m", vec![WireMessage::new("user", "hi")]).with_stop("");
    assert!(request.stop.is_none());
}

#[test]
fn response_deserializes_first_choice_and_usage() {
    let response: ChatCompletionResponse = serde_json::from_value(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "gpt-3.5-turbo",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": "ls -la"}, "finish_reason": "stop"}
        ],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    }))
    .expect("deserialize response");

    assert_eq!(response.first_content(), Some("ls -la"));
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.choices[0].finish_reason.as_deref(), Some("stop"));
}

#[test]
fn response_tolerates_missing_usage_and_null_content() {
    let response: ChatCompletionResponse = serde_json::from_value(json!({
        "choices": [{"message": {"role": "assistant", "content": null}}]
    }))
    .expect("deserialize response");

    assert_eq!(response.first_content(), Some(""));
    assert_eq!(response.usage.total_tokens, 0);
}
