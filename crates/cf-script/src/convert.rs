//! Script results to typed attribute values. Shapes that do not fit resolve to nothing.

use cf_core::{Component, FlowValue};
use cf_runtime::{CheckboxesSpec, OptionsSpec, TransitionSpec};
use tracing::warn;

fn unsupported<T>(attribute: &str, value: &FlowValue) -> Option<T> {
    warn!(attribute, value_type = value.type_name(), "script returned an unsupported shape");
    None
}

fn item_texts(values: &[FlowValue]) -> Vec<String> {
    values
        .iter()
        .filter(|value| !value.is_null())
        .map(FlowValue::to_text)
        .collect()
}

fn items_of(value: &FlowValue) -> Vec<String> {
    value
        .get("items")
        .and_then(FlowValue::as_array)
        .map(item_texts)
        .unwrap_or_default()
}

fn count_of(value: &FlowValue, key: &str) -> Option<usize> {
    value
        .get(key)
        .and_then(FlowValue::as_number)
        .filter(|count| count.is_finite() && *count >= 0.0)
        .map(|count| count as usize)
}

pub(crate) fn to_message(value: FlowValue) -> Option<String> {
    match value {
        FlowValue::Null => None,
        FlowValue::String(text) => Some(text),
        other => Some(other.to_text()),
    }
}

pub(crate) fn to_options(value: FlowValue) -> Option<OptionsSpec> {
    match &value {
        FlowValue::Null => None,
        FlowValue::Array(items) => Some(OptionsSpec {
            items: item_texts(items),
            ..OptionsSpec::default()
        }),
        FlowValue::Map(_) => Some(OptionsSpec {
            items: items_of(&value),
            send_output: value.get("sendOutput").and_then(FlowValue::as_bool),
            reusable: value.get("reusable").and_then(FlowValue::as_bool),
        }),
        other => unsupported("options", other),
    }
}

pub(crate) fn to_checkboxes(value: FlowValue) -> Option<CheckboxesSpec> {
    match &value {
        FlowValue::Null => None,
        FlowValue::Array(items) => Some(CheckboxesSpec {
            items: item_texts(items),
            ..CheckboxesSpec::default()
        }),
        FlowValue::Map(_) => Some(CheckboxesSpec {
            items: items_of(&value),
            min: count_of(&value, "min"),
            max: count_of(&value, "max"),
            send_output: value.get("sendOutput").and_then(FlowValue::as_bool),
            reusable: value.get("reusable").and_then(FlowValue::as_bool),
        }),
        other => unsupported("checkboxes", other),
    }
}

pub(crate) fn to_component(value: FlowValue) -> Option<Component> {
    match &value {
        FlowValue::Null => None,
        FlowValue::String(kind) if !kind.is_empty() => Some(Component::new(kind.clone())),
        FlowValue::Map(_) => {
            let Some(kind) = value.get("kind").and_then(FlowValue::as_string) else {
                return unsupported("component", &value);
            };
            let props = value.get("props").cloned().unwrap_or_default();
            Some(Component::new(kind).with_props(props))
        }
        other => unsupported("component", other),
    }
}

pub(crate) fn to_flag(value: FlowValue) -> Option<bool> {
    match value {
        FlowValue::Null => None,
        FlowValue::Bool(flag) => Some(flag),
        other => Some(other.is_truthy()),
    }
}

pub(crate) fn to_transition(value: FlowValue) -> Option<TransitionSpec> {
    match &value {
        FlowValue::Null => None,
        FlowValue::Number(duration) => Some(TransitionSpec {
            duration: Some(*duration),
            interruptable: None,
        }),
        FlowValue::Map(_) => Some(TransitionSpec {
            duration: value.get("duration").and_then(FlowValue::as_number),
            interruptable: value.get("interruptable").and_then(FlowValue::as_bool),
        }),
        other => unsupported("transition", other),
    }
}

pub(crate) fn to_path(value: FlowValue) -> Option<String> {
    match value {
        FlowValue::Null => None,
        FlowValue::String(path) => Some(path),
        other => unsupported("path", &other),
    }
}

pub(crate) fn to_function_result(value: FlowValue) -> Option<FlowValue> {
    (!value.is_null()).then_some(value)
}
