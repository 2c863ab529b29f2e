//! Terminal input helpers.

pub mod input;

pub use input::{StdinPrompt, prompt_string};
