//! Prompt templates for the completion step.
//!
//! - [`PromptEngine`] - minijinja rendering with strict undefined handling
//! - [`TemplateContext`] - named parameters for a render
//! - [`PromptRender`] - renders the built-in answer and podcast prompts

mod engine;
mod templates;

pub use engine::{PromptEngine, RenderError, TemplateContext};
pub use templates::{ANSWER_TEMPLATE, PODCAST_SCRIPT_TEMPLATE, PromptRender, PromptTemplates};
