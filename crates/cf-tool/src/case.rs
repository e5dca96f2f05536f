use cf_core::Settings;
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "chatflow-case.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default)]
    pub settings: Option<Settings>,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TestAction {
    Input { text: String },
    Wait { ms: u64 },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Input { .. } => "input",
            Self::Wait { .. } => "wait",
        }
    }
}

/// What a case expects to observe, in order. `sensitive` is only observed when it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExpectedEvent {
    Message {
        text: String,
    },
    Options {
        items: Vec<String>,
    },
    Checkboxes {
        items: Vec<String>,
        min: usize,
        max: usize,
    },
    Component {
        name: String,
        #[serde(default)]
        props: serde_json::Value,
    },
    ChatDisabled {
        disabled: bool,
    },
    Sensitive {
        sensitive: bool,
    },
    Toast {
        text: String,
    },
    Path {
        path: String,
    },
    Failed {
        code: String,
    },
}
