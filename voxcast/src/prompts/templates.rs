//! Built-in prompt templates and the renderer that fills them.

use tracing::debug;

use crate::script::PodcastRequest;

use super::engine::{PromptEngine, RenderError, TemplateContext};

/// Template for the single-response pipeline.
pub const ANSWER_TEMPLATE: &str = "Answer this user query : {{ user_query }}";

/// Template asking the model for a podcast script as JSON.
pub const PODCAST_SCRIPT_TEMPLATE: &str = r#"Generate a podcast script based on this topic: {{ user_query }}

The podcast should have {{ num_speakers }} speakers, with {{ male_count }} male and {{ female_count }} female speakers.

The script should be in the following JSON format:
{
  "podcast": {
    "title": "Title of the podcast",
    "speakers": [
      {"id": "S1", "gender": "male/female"},
      {"id": "S2", "gender": "male/female"}
    ],
    "segments": [
      {
        "speaker": "S1",
        "text": "Speaker's dialogue..."
      }
    ]
  }
}

List exactly {{ num_speakers }} speakers, one entry each, with gender set to either "male" or "female".
Ensure that the script has a natural conversation flow and uses all specified speakers.
Please start directly with the json file no text before or after the json."#;

/// The set of templates used by the pipelines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    /// Template for plain question answering.
    pub answer: String,
    /// Template for podcast script generation.
    pub podcast_script: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            answer: ANSWER_TEMPLATE.to_owned(),
            podcast_script: PODCAST_SCRIPT_TEMPLATE.to_owned(),
        }
    }
}

/// Renders the pipeline prompts from a [`PromptTemplates`] set.
///
/// # Example
///
/// ```rust,ignore
/// use voxcast::prompts::PromptRender;
///
/// let prompt = PromptRender::default().answer_prompt("What is Rust?")?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptRender {
    engine: PromptEngine,
    templates: PromptTemplates,
}

impl PromptRender {
    /// Create a renderer over the given templates.
    #[must_use]
    pub fn new(templates: PromptTemplates) -> Self {
        Self {
            engine: PromptEngine::new(),
            templates,
        }
    }

    /// Render the single-response prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured template is invalid.
    pub fn answer_prompt(&self, query: &str) -> Result<String, RenderError> {
        let ctx = TemplateContext::new().with_var("user_query", query);
        self.engine.render(&self.templates.answer, &ctx)
    }

    /// Render the podcast script prompt for a request.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured template is invalid or references a
    /// parameter that is not supplied.
    pub fn podcast_prompt(&self, request: &PodcastRequest) -> Result<String, RenderError> {
        let ctx = TemplateContext::new()
            .with_var("user_query", request.topic.as_str())
            .with_var("num_speakers", request.num_speakers)
            .with_var("male_count", request.male_count)
            .with_var("female_count", request.female_count);

        let prompt = self.engine.render(&self.templates.podcast_script, &ctx)?;
        debug!(chars = prompt.chars().count(), "rendered podcast prompt");
        Ok(prompt)
    }
}
