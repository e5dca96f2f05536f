use std::collections::BTreeMap;

use super::*;

#[test]
fn flow_error_displays_code_and_message() {
    let error = FlowError::new("ENGINE_X", "boom");
    assert_eq!(error.to_string(), "ENGINE_X: boom");
    assert!(error.span.is_none());

    let spanned = FlowError::with_span("XML_PARSE_ERROR", "bad", SourceSpan::synthetic());
    assert_eq!(spanned.span, Some(SourceSpan::synthetic()));
}

#[test]
fn invalid_block_error_uses_fixed_message() {
    let error = FlowError::invalid_block();
    assert_eq!(error.code, "ENGINE_BLOCK_INVALID");
    assert_eq!(error.message, "Block is not valid.");
}

#[test]
fn flow_value_accessors_and_truthiness() {
    assert_eq!(FlowValue::from("a").as_string(), Some("a"));
    assert_eq!(FlowValue::from(2.0).as_number(), Some(2.0));
    assert_eq!(FlowValue::from(true).as_bool(), Some(true));
    assert!(FlowValue::Null.is_null());
    assert!(!FlowValue::Null.is_truthy());
    assert!(!FlowValue::from("").is_truthy());
    assert!(!FlowValue::Number(f64::NAN).is_truthy());
    assert!(!FlowValue::Number(0.0).is_truthy());
    assert!(FlowValue::Array(Vec::new()).is_truthy());
    assert_eq!(FlowValue::Map(BTreeMap::new()).type_name(), "map");
}

#[test]
fn flow_value_converts_from_json_and_renders_text() {
    let value = FlowValue::from_json(serde_json::json!({
        "title": "Card",
        "count": 3,
        "tags": ["a", null]
    }));
    assert_eq!(value.get("title").and_then(FlowValue::as_string), Some("Card"));
    assert_eq!(value.get("count").map(FlowValue::to_text), Some("3".to_string()));
    assert_eq!(
        value.get("tags"),
        Some(&FlowValue::Array(vec![FlowValue::from("a"), FlowValue::Null]))
    );
    assert_eq!(FlowValue::Number(1.5).to_text(), "1.5");
    assert_eq!(
        FlowValue::from(vec!["x", "y"]).to_text(),
        r#"["x","y"]"#.to_string()
    );
}

#[test]
fn message_content_serializes_with_type_tag() {
    let json = serde_json::to_value(MessageContent::text("hi")).expect("serialize should pass");
    assert_eq!(json, serde_json::json!({"type": "text", "text": "hi"}));

    let prompt = MessageContent::Options(OptionsPrompt {
        items: vec!["a".to_string()],
        send_output: None,
        reusable: false,
    });
    let json = serde_json::to_value(prompt).expect("serialize should pass");
    assert_eq!(
        json,
        serde_json::json!({"type": "options", "items": ["a"], "reusable": false})
    );
}

#[test]
fn settings_default_when_fields_absent() {
    let settings = Settings::from_json_str("{}").expect("settings should parse");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.bot_delivery, BotDelivery::Inject);

    let settings = Settings::from_json_str(r#"{"botDelivery":"stream","sendOptionOutput":false}"#)
        .expect("settings should parse");
    assert_eq!(settings.bot_delivery, BotDelivery::Stream);
    assert!(!settings.send_option_output);
    assert!(settings.send_checkbox_output);
}

#[test]
fn settings_reject_zero_capacity_and_bad_json() {
    let error =
        Settings::from_json_str(r#"{"eventCapacity":0}"#).expect_err("capacity should fail");
    assert_eq!(error.code, "CONFIG_EVENT_CAPACITY");

    let error = Settings::from_json_str("{").expect_err("json should fail");
    assert_eq!(error.code, "CONFIG_SETTINGS_INVALID");
}

#[test]
fn flow_value_to_json_keeps_integers_integral() {
    let value = FlowValue::from_json(serde_json::json!({"total": 12, "ratio": 0.5}));
    assert_eq!(value.to_json(), serde_json::json!({"total": 12, "ratio": 0.5}));
    assert_eq!(FlowValue::Number(f64::NAN).to_json(), serde_json::Value::Null);
}
