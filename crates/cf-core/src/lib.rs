pub mod error;
pub mod settings;
pub mod types;
pub mod value;

pub use error::{FlowError, FlowResult};
pub use settings::*;
pub use types::*;
pub use value::*;

#[cfg(test)]
mod tests;
