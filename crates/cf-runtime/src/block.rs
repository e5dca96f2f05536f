use std::collections::BTreeMap;

use cf_core::{Component, FlowError, FlowResult, FlowValue};

use crate::attribute::{Attribute, Callback};

pub const START_PATH: &str = "start";

/// Options as authored: a bare list or an object with flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsSpec {
    pub items: Vec<String>,
    pub send_output: Option<bool>,
    pub reusable: Option<bool>,
}

/// Checkboxes as authored. `min`/`max` defaults are applied by the checkboxes processor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckboxesSpec {
    pub items: Vec<String>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    pub send_output: Option<bool>,
    pub reusable: Option<bool>,
}

/// Transition as authored. A missing or non-numeric duration means no timer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransitionSpec {
    pub duration: Option<f64>,
    pub interruptable: Option<bool>,
}

impl TransitionSpec {
    pub fn after(duration_ms: u64) -> Self {
        Self {
            duration: Some(duration_ms as f64),
            interruptable: None,
        }
    }

    pub fn interruptable(mut self, interruptable: bool) -> Self {
        self.interruptable = Some(interruptable);
        self
    }
}

impl<S: Into<String>> From<Vec<S>> for OptionsSpec {
    fn from(items: Vec<S>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl<S: Into<String>> From<Vec<S>> for CheckboxesSpec {
    fn from(items: Vec<S>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl From<u64> for TransitionSpec {
    fn from(duration_ms: u64) -> Self {
        Self::after(duration_ms)
    }
}

impl<S: Into<String>> From<Vec<S>> for Attribute<OptionsSpec> {
    fn from(items: Vec<S>) -> Self {
        Attribute::Value(items.into())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Attribute<OptionsSpec> {
    fn from(items: [S; N]) -> Self {
        Attribute::Value(Vec::from(items).into())
    }
}

impl<S: Into<String>> From<Vec<S>> for Attribute<CheckboxesSpec> {
    fn from(items: Vec<S>) -> Self {
        Attribute::Value(items.into())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Attribute<CheckboxesSpec> {
    fn from(items: [S; N]) -> Self {
        Attribute::Value(Vec::from(items).into())
    }
}

impl From<u64> for Attribute<TransitionSpec> {
    fn from(duration_ms: u64) -> Self {
        Attribute::Value(TransitionSpec::after(duration_ms))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pre,
    Post,
}

/// Attribute keys in processing order: the pre phase first, then the post phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockAttribute {
    Message,
    Options,
    Checkboxes,
    Component,
    ChatDisabled,
    IsSensitive,
    Transition,
    Function,
    Path,
}

impl BlockAttribute {
    pub const ALL: [BlockAttribute; 9] = [
        Self::Message,
        Self::Options,
        Self::Checkboxes,
        Self::Component,
        Self::ChatDisabled,
        Self::IsSensitive,
        Self::Transition,
        Self::Function,
        Self::Path,
    ];

    pub fn phase(self) -> Phase {
        match self {
            Self::Function | Self::Path => Phase::Post,
            _ => Phase::Pre,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Options => "options",
            Self::Checkboxes => "checkboxes",
            Self::Component => "component",
            Self::ChatDisabled => "chatDisabled",
            Self::IsSensitive => "isSensitive",
            Self::Transition => "transition",
            Self::Function => "function",
            Self::Path => "path",
        }
    }
}

/// One step of a flow. Every attribute is optional.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub message: Option<Attribute<String>>,
    pub options: Option<Attribute<OptionsSpec>>,
    pub checkboxes: Option<Attribute<CheckboxesSpec>>,
    pub component: Option<Attribute<Component>>,
    pub chat_disabled: Option<Attribute<bool>>,
    pub is_sensitive: Option<Attribute<bool>>,
    pub transition: Option<Attribute<TransitionSpec>>,
    pub function: Option<Callback<FlowValue>>,
    pub path: Option<Attribute<String>>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: impl Into<Attribute<String>>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn options(mut self, options: impl Into<Attribute<OptionsSpec>>) -> Self {
        self.options = Some(options.into());
        self
    }

    pub fn checkboxes(mut self, checkboxes: impl Into<Attribute<CheckboxesSpec>>) -> Self {
        self.checkboxes = Some(checkboxes.into());
        self
    }

    pub fn component(mut self, component: impl Into<Attribute<Component>>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn chat_disabled(mut self, chat_disabled: impl Into<Attribute<bool>>) -> Self {
        self.chat_disabled = Some(chat_disabled.into());
        self
    }

    pub fn sensitive(mut self, is_sensitive: impl Into<Attribute<bool>>) -> Self {
        self.is_sensitive = Some(is_sensitive.into());
        self
    }

    pub fn transition(mut self, transition: impl Into<Attribute<TransitionSpec>>) -> Self {
        self.transition = Some(transition.into());
        self
    }

    pub fn function(mut self, function: Callback<FlowValue>) -> Self {
        self.function = Some(function);
        self
    }

    pub fn path(mut self, path: impl Into<Attribute<String>>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn declares(&self, attribute: BlockAttribute) -> bool {
        match attribute {
            BlockAttribute::Message => self.message.is_some(),
            BlockAttribute::Options => self.options.is_some(),
            BlockAttribute::Checkboxes => self.checkboxes.is_some(),
            BlockAttribute::Component => self.component.is_some(),
            BlockAttribute::ChatDisabled => self.chat_disabled.is_some(),
            BlockAttribute::IsSensitive => self.is_sensitive.is_some(),
            BlockAttribute::Transition => self.transition.is_some(),
            BlockAttribute::Function => self.function.is_some(),
            BlockAttribute::Path => self.path.is_some(),
        }
    }

    /// Declared attributes of one phase, in processing order.
    pub fn declared(&self, phase: Phase) -> impl Iterator<Item = BlockAttribute> + '_ {
        BlockAttribute::ALL
            .into_iter()
            .filter(move |attribute| attribute.phase() == phase && self.declares(*attribute))
    }

    pub fn is_empty(&self) -> bool {
        !BlockAttribute::ALL
            .into_iter()
            .any(|attribute| self.declares(attribute))
    }
}

/// Path id to block mapping. Read-only once handed to a session.
#[derive(Debug, Clone, Default)]
pub struct Flow {
    blocks: BTreeMap<String, Block>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_block(mut self, path: impl Into<String>, block: Block) -> Self {
        self.blocks.insert(path.into(), block);
        self
    }

    /// Inserts a block, returning the one it replaced.
    pub fn insert(&mut self, path: impl Into<String>, block: Block) -> Option<Block> {
        self.blocks.insert(path.into(), block)
    }

    pub fn block(&self, path: &str) -> Option<&Block> {
        self.blocks.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blocks.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Looks up a block that can be processed: it must exist and declare something.
    pub fn processable_block(&self, path: &str) -> FlowResult<&Block> {
        match self.blocks.get(path) {
            Some(block) if !block.is_empty() => Ok(block),
            _ => Err(FlowError::invalid_block()),
        }
    }

    pub fn validate(&self) -> FlowResult<()> {
        if !self.contains(START_PATH) {
            return Err(FlowError::new(
                "ENGINE_FLOW_START_MISSING",
                format!("Flow must define a \"{}\" block.", START_PATH),
            ));
        }
        Ok(())
    }
}
