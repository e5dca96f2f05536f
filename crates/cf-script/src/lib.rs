//! Flow documents (`*.flow.xml`) and the Rhai bridge behind their scripted attributes.

mod bridge;
mod compile;
mod convert;
mod template;

pub use bridge::{ScriptEffect, ScriptFn};
pub use compile::{compile_flow_from_xml, compile_flow_from_xml_map};
pub use template::MessageTemplate;

#[cfg(test)]
mod tests;
