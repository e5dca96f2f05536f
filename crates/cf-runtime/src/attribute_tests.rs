use std::time::Duration;

use super::testing::{recording_params, RecordingHost, RecordingNavigator};
use super::*;

fn params() -> Params {
    recording_params(&RecordingHost::new(), &RecordingNavigator::new(), "start")
}

#[tokio::test]
async fn absent_attribute_resolves_to_none() {
    let value = resolve_attribute::<String>(None, &params())
        .await
        .expect("resolve should pass");
    assert_eq!(value, None);
}

#[tokio::test]
async fn literal_attribute_is_returned() {
    let attribute: Attribute<String> = "hello".into();
    let value = resolve_attribute(Some(&attribute), &params())
        .await
        .expect("resolve should pass");
    assert_eq!(value, Some("hello".to_string()));
}

#[tokio::test]
async fn sync_function_receives_context() {
    let attribute: Attribute<String> = Attribute::from_fn(|params| {
        Ok(params
            .curr_path
            .as_ref()
            .map(|path| format!("at {}", path)))
    });
    let value = resolve_attribute(Some(&attribute), &params())
        .await
        .expect("resolve should pass");
    assert_eq!(value, Some("at start".to_string()));
}

#[tokio::test(start_paused = true)]
async fn async_function_is_awaited() {
    let attribute: Attribute<bool> = Attribute::from_async(|params: Params| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(Some(params.user_input().is_empty()))
    });
    let value = resolve_attribute(Some(&attribute), &params())
        .await
        .expect("resolve should pass");
    assert_eq!(value, Some(true));
}

#[tokio::test]
async fn function_errors_propagate_unchanged() {
    let attribute: Attribute<String> =
        Attribute::from_fn(|_| Err(FlowError::new("USER_FAILURE", "nope")));
    let error = resolve_attribute(Some(&attribute), &params())
        .await
        .expect_err("resolve should fail");
    assert_eq!(error, FlowError::new("USER_FAILURE", "nope"));

    let attribute: Attribute<String> =
        Attribute::from_async(|_| async { Err(FlowError::new("USER_FAILURE", "later")) });
    let error = resolve_attribute(Some(&attribute), &params())
        .await
        .expect_err("resolve should fail");
    assert_eq!(error.message, "later");
}

#[test]
fn spec_normalizers_apply_defaults() {
    let prompt = options_prompt(OptionsSpec::from(vec!["a", "b"])).expect("prompt should exist");
    assert!(!prompt.reusable);
    assert_eq!(prompt.send_output, None);
    assert!(options_prompt(OptionsSpec::default()).is_none());

    let prompt = checkboxes_prompt(CheckboxesSpec::from(vec!["a", "b", "c"]))
        .expect("prompt should exist");
    assert_eq!((prompt.min, prompt.max), (1, 3));

    let prompt = checkboxes_prompt(CheckboxesSpec {
        items: vec!["a".to_string(), "b".to_string()],
        min: Some(5),
        max: Some(1),
        ..CheckboxesSpec::default()
    })
    .expect("prompt should exist");
    assert_eq!((prompt.min, prompt.max), (1, 1));

    let prompt = checkboxes_prompt(CheckboxesSpec {
        items: vec!["a".to_string()],
        min: Some(3),
        ..CheckboxesSpec::default()
    })
    .expect("prompt should exist");
    assert_eq!((prompt.min, prompt.max), (1, 1));
}

#[test]
fn transition_details_normalize_durations() {
    assert_eq!(
        transition_details(TransitionSpec::after(250)),
        Some(TransitionDetails {
            duration_ms: 250,
            interruptable: false
        })
    );
    assert_eq!(
        transition_details(TransitionSpec::after(10).interruptable(true))
            .map(|details| details.interruptable),
        Some(true)
    );
    assert_eq!(transition_details(TransitionSpec::default()), None);
    assert_eq!(
        transition_details(TransitionSpec {
            duration: Some(f64::NAN),
            interruptable: Some(true)
        }),
        None
    );
    assert_eq!(
        transition_details(TransitionSpec {
            duration: Some(-20.0),
            interruptable: None
        })
        .map(|details| details.duration_ms),
        Some(0)
    );
}

#[test]
fn block_declares_attributes_in_phase_order() {
    let block = Block::new()
        .path("next")
        .transition(5u64)
        .message("hi")
        .function(Callback::sync(|_| Ok(None)));
    assert_eq!(
        block.declared(Phase::Pre).collect::<Vec<_>>(),
        vec![BlockAttribute::Message, BlockAttribute::Transition]
    );
    assert_eq!(
        block.declared(Phase::Post).collect::<Vec<_>>(),
        vec![BlockAttribute::Function, BlockAttribute::Path]
    );
    assert!(!block.is_empty());
    assert!(Block::new().is_empty());
}

#[test]
fn flow_requires_start_block() {
    let error = Flow::new()
        .with_block("other", Block::new().message("x"))
        .validate()
        .expect_err("flow without start should fail");
    assert_eq!(error.code, "ENGINE_FLOW_START_MISSING");
    assert!(Flow::new()
        .with_block(START_PATH, Block::new().message("x"))
        .validate()
        .is_ok());
}
