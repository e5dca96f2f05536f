//! Flow execution engine: attribute resolution, per-attribute processors, the block
//! orchestrator and the path/transition controller.

mod attribute;
mod block;
mod controller;
mod events;
mod orchestrator;
mod params;
mod process;
mod session;
pub mod testing;
mod timer;

pub use attribute::{resolve_attribute, Attribute, Callback};
pub use block::{
    Block, BlockAttribute, CheckboxesSpec, Flow, OptionsSpec, Phase, TransitionSpec, START_PATH,
};
pub use controller::{PathController, PathState};
pub use events::{FlowEvent, FlowEventBus};
pub use orchestrator::{post_process_block, pre_process_block};
pub use params::{ChatHost, Navigator, Params};
pub use process::{checkboxes_prompt, options_prompt, transition_details};
pub use session::{ChatSession, SessionHandle};
pub use timer::{TimerFired, TimerHandle, TimerPhase, TransitionTimer};

pub use cf_core::{
    BotDelivery, CheckboxesPrompt, Component, FlowError, FlowResult, FlowValue, MessageContent,
    MessageId, OptionsPrompt, Sender, Settings, TransitionDetails,
};

#[cfg(test)]
mod attribute_tests;
