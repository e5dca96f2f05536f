use std::collections::BTreeMap;

use cf_core::{FlowValue, MessageContent, Sender, Settings, SourceSpan};
use cf_runtime::testing::{recording_params, HostCall, RecordingHost, RecordingNavigator};
use cf_runtime::{ChatSession, SessionHandle};
use rhai::Dynamic;

use super::bridge::{dynamic_to_flow_value, flow_value_to_dynamic};
use super::convert::{to_checkboxes, to_transition};
use super::*;

fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

async fn run_flow(source: &str) -> (std::sync::Arc<RecordingHost>, SessionHandle) {
    let flow = compile_flow_from_xml(source).expect("flow should compile");
    let host = RecordingHost::new();
    let (session, handle) =
        ChatSession::new(flow, host.clone(), Settings::default()).expect("session should build");
    tokio::spawn(session.run());
    handle.flush().await.expect("flush should pass");
    (host, handle)
}

#[test]
fn compiles_static_blocks_across_files() {
    let files = map(&[
        (
            "a.flow.xml",
            r#"<flow>
  <block path="start">
    <message>
      Hello there
    </message>
    <options reusable="true"><option>Yes</option><option> No </option></options>
    <path>next</path>
  </block>
</flow>"#,
        ),
        (
            "b.flow.xml",
            r#"<flow><block path="next"><transition duration="250" interruptable="true"/><path>start</path></block></flow>"#,
        ),
    ]);
    let flow = compile_flow_from_xml_map(&files).expect("flow should compile");
    assert_eq!(flow.len(), 2);
    assert_eq!(flow.paths().collect::<Vec<_>>(), vec!["next", "start"]);

    let start = flow.block("start").expect("start should exist");
    assert!(matches!(
        &start.message,
        Some(cf_runtime::Attribute::Value(text)) if text == "Hello there"
    ));
    assert!(matches!(
        &start.options,
        Some(cf_runtime::Attribute::Value(spec))
            if spec.items == vec!["Yes", "No"] && spec.reusable == Some(true)
    ));
    let next = flow.block("next").expect("next should exist");
    assert!(matches!(
        &next.transition,
        Some(cf_runtime::Attribute::Value(spec))
            if spec.duration == Some(250.0) && spec.interruptable == Some(true)
    ));
}

#[test]
fn rejects_malformed_documents() {
    let cases = [
        (r#"<script/>"#, "FLOW_ROOT_INVALID"),
        (r#"<flow><step path="start"/></flow>"#, "FLOW_UNKNOWN_ELEMENT"),
        (r#"<flow><block><message>x</message></block></flow>"#, "FLOW_BLOCK_PATH_MISSING"),
        (r#"<flow><block path="start"/></flow>"#, "FLOW_BLOCK_EMPTY"),
        (
            r#"<flow><block path="start"><message>a</message><message>b</message></block></flow>"#,
            "FLOW_DUPLICATE_ATTRIBUTE",
        ),
        (
            r#"<flow><block path="start"><colour>red</colour></block></flow>"#,
            "FLOW_UNKNOWN_ELEMENT",
        ),
        (
            r#"<flow><block path="start"><options reusable="maybe"><option>a</option></options></block></flow>"#,
            "FLOW_ATTRIBUTE_INVALID",
        ),
        (
            r#"<flow><block path="start"><component kind="card">{oops</component></block></flow>"#,
            "FLOW_COMPONENT_PROPS_INVALID",
        ),
        (
            r#"<flow><block path="start"><transition/></block></flow>"#,
            "FLOW_ATTRIBUTE_MISSING",
        ),
        (
            r#"<flow><block path="start"><path script="if ("/></block></flow>"#,
            "FLOW_SCRIPT_SYNTAX",
        ),
        (
            r#"<flow><block path="other"><message>x</message></block></flow>"#,
            "FLOW_START_MISSING",
        ),
        (r#"<flow><block path="start">"#, "XML_PARSE_ERROR"),
    ];
    for (source, code) in cases {
        let error = compile_flow_from_xml(source).expect_err("flow should fail");
        assert_eq!(error.code, code, "source: {}", source);
    }
}

#[test]
fn rejects_duplicate_paths_across_files() {
    let files = map(&[
        ("a.flow.xml", r#"<flow><block path="start"><message>a</message></block></flow>"#),
        ("b.flow.xml", r#"<flow><block path="start"><message>b</message></block></flow>"#),
    ]);
    let error = compile_flow_from_xml_map(&files).expect_err("flow should fail");
    assert_eq!(error.code, "FLOW_DUPLICATE_PATH");
    assert!(error.message.contains("a.flow.xml"));
    assert!(error.message.contains("b.flow.xml"));
}

#[tokio::test]
async fn template_message_reads_user_input() {
    let (host, handle) = run_flow(
        r#"<flow>
  <block path="start"><message>Name?</message><path>greet</path></block>
  <block path="greet"><message>Hello, ${userInput}! You came from ${prevPath}.</message></block>
</flow>"#,
    )
    .await;
    handle.send_input("Ada").expect("send should pass");
    handle.flush().await.expect("flush should pass");
    assert_eq!(
        host.bot_texts(),
        vec![
            "Name?".to_string(),
            "Hello, Ada! You came from start.".to_string()
        ]
    );
}

#[tokio::test]
async fn scripted_options_and_checkboxes_are_normalized() {
    let (host, _handle) = run_flow(
        r##"<flow>
  <block path="start">
    <options script='#{items: ["a", "b"], reusable: true}'/>
    <checkboxes script='#{items: ["x", "y", "z"], min: 5, max: 2}'/>
  </block>
</flow>"##,
    )
    .await;
    let calls = host.calls();
    assert!(matches!(
        &calls[0],
        HostCall::Inject { content: MessageContent::Options(prompt), .. }
            if prompt.items == vec!["a", "b"] && prompt.reusable
    ));
    assert!(matches!(
        &calls[1],
        HostCall::Inject { content: MessageContent::Checkboxes(prompt), .. }
            if prompt.min == 2 && prompt.max == 2
    ));
}

#[tokio::test]
async fn function_effects_run_in_order_then_navigate() {
    let (host, handle) = run_flow(
        r#"<flow>
  <block path="start">
    <message>Go</message>
    <function>
      inject("you typed " + userInput);
      show_toast("saved", 500);
      set_text("");
      go_to("next");
    </function>
  </block>
  <block path="next"><message>Next</message></block>
</flow>"#,
    )
    .await;
    host.take_calls();
    handle.send_input("hi").expect("send should pass");
    handle.flush().await.expect("flush should pass");

    let calls = host.calls();
    assert_eq!(
        calls[..3],
        [
            HostCall::Inject {
                content: MessageContent::text("you typed hi"),
                sender: Sender::Bot
            },
            HostCall::ShowToast {
                content: "saved".to_string(),
                timeout_ms: Some(500)
            },
            HostCall::SetTextAreaValue {
                value: String::new()
            },
        ]
    );
    assert_eq!(handle.current_path(), Some("next".to_string()));
    assert!(host.bot_texts().contains(&"Next".to_string()));
}

#[tokio::test]
async fn path_script_branches_on_input() {
    let source = r#"<flow>
  <block path="start">
    <options><option>yes</option><option>no</option></options>
    <path script='if userInput == "yes" { "accepted" } else { "declined" }'/>
  </block>
  <block path="accepted"><message>Great</message></block>
  <block path="declined"><message>Maybe later</message></block>
</flow>"#;
    let (_host, handle) = run_flow(source).await;
    handle.send_input("no").expect("send should pass");
    handle.flush().await.expect("flush should pass");
    assert_eq!(handle.current_path(), Some("declined".to_string()));
}

#[tokio::test]
async fn flags_and_transition_from_scripts() {
    let (host, handle) = run_flow(
        r##"<flow>
  <block path="start">
    <chat-disabled script="()"/>
    <sensitive>true</sensitive>
    <transition script="#{interruptable: true}"/>
  </block>
</flow>"##,
    )
    .await;
    let calls = host.calls();
    assert!(calls.contains(&HostCall::SetDisabled { disabled: false }));
    assert!(calls.contains(&HostCall::SetSensitive { sensitive: true }));
    assert_eq!(handle.timer_phase(), cf_runtime::TimerPhase::Idle);
}

#[test]
fn script_errors_surface_as_eval_errors() {
    let host = RecordingHost::new();
    let navigator = RecordingNavigator::new();
    let params = recording_params(&host, &navigator, "start");
    let script =
        ScriptFn::compile("undefined_variable + 1", &SourceSpan::synthetic()).expect("compile");
    let error = script.evaluate(&params).expect_err("eval should fail");
    assert_eq!(error.code, "SCRIPT_EVAL_ERROR");

    let script = ScriptFn::compile("let x = 1;", &SourceSpan::synthetic()).expect("compile");
    let (value, effects) = script.evaluate(&params).expect("eval should pass");
    assert!(value.is_null());
    assert!(effects.is_empty());
}

#[test]
fn context_variables_are_visible_to_scripts() {
    let host = RecordingHost::new();
    let navigator = RecordingNavigator::new();
    let params = recording_params(&host, &navigator, "start").with_user_input(Some("42".into()));
    let script = ScriptFn::compile(
        r#"go_to(currPath); open_chat(false); userInput + "/" + currPath"#,
        &SourceSpan::synthetic(),
    )
    .expect("compile");
    let (value, effects) = script.evaluate(&params).expect("eval should pass");
    assert_eq!(value.as_string(), Some("42/start"));
    assert_eq!(
        effects,
        vec![
            ScriptEffect::GoTo("start".to_string()),
            ScriptEffect::OpenChat(false)
        ]
    );
}

#[test]
fn dynamic_values_convert_both_ways() {
    assert!(dynamic_to_flow_value(Dynamic::UNIT)
        .expect("unit should convert")
        .is_null());
    let value = FlowValue::from_json(serde_json::json!({"a": [1, "x", true]}));
    let back = dynamic_to_flow_value(flow_value_to_dynamic(&value)).expect("should convert");
    assert_eq!(back, value);
}

#[test]
fn script_shapes_map_to_specs() {
    let spec = to_transition(FlowValue::from_json(serde_json::json!({"interruptable": true})))
        .expect("map should convert");
    assert_eq!(spec.duration, None);
    assert_eq!(
        to_transition(FlowValue::Number(300.0)).and_then(|spec| spec.duration),
        Some(300.0)
    );
    assert!(to_transition(FlowValue::from("soon")).is_none());

    let spec = to_checkboxes(FlowValue::from(vec!["a", "b"])).expect("array should convert");
    assert_eq!(spec.items, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(spec.min, None);
    assert!(to_checkboxes(FlowValue::Bool(true)).is_none());
}

