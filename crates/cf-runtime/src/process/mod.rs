//! One processor per block attribute. Each resolves its attribute through
//! [`crate::attribute::resolve_attribute`], applies its own normalization, and surfaces
//! the result through the pass context.

mod component;
mod function;
mod input_flags;
mod message;
mod path;
mod prompt;
mod transition;

pub(crate) use component::process_component;
pub(crate) use function::process_function;
pub(crate) use input_flags::{process_chat_disabled, process_is_sensitive};
pub(crate) use message::process_message;
pub(crate) use path::process_path;
pub use prompt::{checkboxes_prompt, options_prompt};
pub(crate) use prompt::{process_checkboxes, process_options};
pub use transition::transition_details;
pub(crate) use transition::process_transition;
