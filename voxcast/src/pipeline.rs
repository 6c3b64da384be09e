//! End-to-end pipelines.
//!
//! [`Podcaster`] owns a completion provider, a speech provider and the
//! settings that drive them. It runs two flows:
//!
//! - single response: `query -> completion -> speech -> WAV bytes`
//! - podcast: `topic -> script completion -> voice assignment -> per-speaker
//!   speech -> split and stitch -> exported file`
//!
//! # Example
//!
//! ```rust,ignore
//! use voxcast::prelude::*;
//!
//! let config = voxcast::config::load(None).await?;
//! let podcaster = Podcaster::from_config(&config)?;
//! let output = podcaster
//!     .generate_podcast(&PodcastRequest::new("AI in todays world", 3, 1, 2))
//!     .await?;
//! println!("{} -> {}", output.title, output.path.display());
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::audio::{self, AudioError, Compositor, PcmTrack};
use crate::config::{Config, OutputSettings, PodcastSettings};
use crate::error::{Error, Result};
use crate::llms::{CompletionRequest, Groq, SharedCompletionProvider};
use crate::prompts::PromptRender;
use crate::script::{Gender, PodcastRequest, PodcastScript, parse_script, parse_script_lenient};
use crate::speech::{Deepgram, SharedSpeechProvider, SpeechRequest};
use crate::voices::VoiceAssignment;

/// What a finished podcast run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PodcastOutput {
    /// Where the audio was written.
    pub path: PathBuf,
    /// Script title, or the topic when the script has none.
    pub title: String,
    /// The parsed script.
    pub script: PodcastScript,
    /// Voice used for each speaker.
    pub voices: VoiceAssignment,
    /// Length of the exported audio.
    pub duration: Duration,
}

/// Runs the single-response and podcast pipelines.
pub struct Podcaster {
    llm: SharedCompletionProvider,
    speech: SharedSpeechProvider,
    prompts: PromptRender,
    compositor: Compositor,
    settings: PodcastSettings,
    output: OutputSettings,
    rng: Mutex<fastrand::Rng>,
}

impl std::fmt::Debug for Podcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Podcaster")
            .field("llm", &self.llm.provider_name())
            .field("speech", &self.speech.provider_name())
            .field("settings", &self.settings)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl Podcaster {
    /// Create a podcaster over the given providers with default settings.
    #[must_use]
    pub fn new(llm: SharedCompletionProvider, speech: SharedSpeechProvider) -> Self {
        Self {
            llm,
            speech,
            prompts: PromptRender::default(),
            compositor: Compositor::new(),
            settings: PodcastSettings::default(),
            output: OutputSettings::default(),
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Build the Groq and Deepgram clients from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a credential is missing or a value is
    /// invalid, or [`Error::Upstream`] if an HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.ensure_valid()?;

        let llm = Groq::new(config.groq.clone())?;
        let speech = Deepgram::new(config.deepgram.clone())?;

        Ok(Self::new(Arc::new(llm), Arc::new(speech))
            .with_settings(config.podcast.clone())
            .with_output(config.output.clone()))
    }

    /// Replace the pipeline settings.
    #[must_use]
    pub fn with_settings(mut self, settings: PodcastSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Replace the output settings.
    #[must_use]
    pub fn with_output(mut self, output: OutputSettings) -> Self {
        self.output = output;
        self
    }

    /// Replace the prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptRender) -> Self {
        self.prompts = prompts;
        self
    }

    /// Seed voice shuffling, making assignments reproducible.
    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            ..self
        }
    }

    /// Pipeline settings in use.
    #[must_use]
    pub const fn settings(&self) -> &PodcastSettings {
        &self.settings
    }

    /// Output settings in use.
    #[must_use]
    pub const fn output(&self) -> &OutputSettings {
        &self.output
    }

    /// Answer a free-form query with the answer model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prompt`] if the template fails to render, or
    /// [`Error::Upstream`] if the completion call fails.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let prompt = self.prompts.answer_prompt(query)?;
        let request = CompletionRequest::new(&self.settings.answer_model, prompt)
            .temperature(self.settings.temperature);

        info!(model = %request.model, provider = self.llm.provider_name(), "requesting answer");
        let answer = self.llm.complete(&request).await?;
        debug!(chars = answer.chars().count(), "answer received");
        Ok(answer)
    }

    /// Speak `text` with the configured answer voice, returning WAV bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if synthesis fails.
    pub async fn speak(&self, text: &str) -> Result<Vec<u8>> {
        let request = SpeechRequest::new(text, &self.settings.answer_voice);
        info!(voice = %request.voice, provider = self.speech.provider_name(), "synthesizing");
        Ok(self.speech.synthesize(&request).await?)
    }

    /// Answer a query and speak the answer.
    ///
    /// # Errors
    ///
    /// Any error from [`answer`](Self::answer) or [`speak`](Self::speak).
    pub async fn answer_and_speak(&self, query: &str) -> Result<(String, Vec<u8>)> {
        let answer = self.answer(query).await?;
        let audio = self.speak(&answer).await?;
        Ok((answer, audio))
    }

    /// Ask the script model for a podcast script and parse it.
    ///
    /// The request is validated and the voice pools are checked before the
    /// completion call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`], [`Error::PoolExhausted`],
    /// [`Error::Prompt`], [`Error::Upstream`] or [`Error::MalformedScript`].
    pub async fn generate_script(&self, request: &PodcastRequest) -> Result<PodcastScript> {
        request.validate()?;
        for gender in [Gender::Male, Gender::Female] {
            self.settings
                .voices
                .check_capacity(gender, request.count(gender))?;
        }

        let prompt = self.prompts.podcast_prompt(request)?;
        let completion = CompletionRequest::new(&self.settings.script_model, prompt)
            .temperature(self.settings.temperature);

        info!(
            topic = %request.topic,
            speakers = request.num_speakers,
            model = %completion.model,
            "requesting podcast script"
        );
        let text = self.llm.complete(&completion).await?;

        let script = if self.settings.lenient_parsing {
            parse_script_lenient(&text)
        } else {
            parse_script(&text)
        }
        .inspect_err(|e| warn!(error = %e, chars = text.chars().count(), "unusable script response"))?;

        if !script.matches_request(request) {
            warn!(
                requested = request.num_speakers,
                male = script.count(Gender::Male),
                female = script.count(Gender::Female),
                got = script.speakers().len(),
                "script speakers differ from request"
            );
        }
        info!(
            title = %script.title(),
            speakers = script.speakers().len(),
            segments = script.segments().len(),
            "script parsed"
        );

        Ok(script)
    }

    /// Assign a distinct voice to each of the script's speakers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolExhausted`] if a gender outnumbers its pool.
    pub fn assign_voices(&self, script: &PodcastScript) -> Result<VoiceAssignment> {
        let mut rng = self
            .rng
            .lock()
            .map_or_else(|_| fastrand::Rng::new(), |mut rng| rng.fork());
        Ok(self.settings.voices.assign(script.speakers(), &mut rng)?)
    }

    /// Synthesize every speaker and stitch the result in script order.
    ///
    /// Each speaker is synthesized once, from all of their lines joined by
    /// spaces. Up to `synthesis_concurrency` speakers are in flight at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] naming the speaker and voice of the first
    /// failed call, or [`Error::Audio`] if the audio cannot be decoded or
    /// joined, or a speaker with something to say came back silent.
    pub async fn render(
        &self,
        script: &PodcastScript,
        voices: &VoiceAssignment,
    ) -> Result<PcmTrack> {
        let jobs = script.lines_by_speaker().into_iter().map(|(speaker, lines)| {
            let text = lines
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let voice = voices.voice(speaker).map(str::to_owned);

            async move {
                let voice = voice.ok_or_else(|| {
                    Error::invalid_request(format!("no voice assigned to speaker `{speaker}`"))
                })?;
                let chars = text.chars().count();
                let has_words = !text.trim().is_empty();
                debug!(speaker, voice = %voice, chars, "synthesizing speaker");

                let bytes = self
                    .speech
                    .synthesize(&SpeechRequest::new(text, &voice))
                    .await
                    .map_err(|e| Error::synthesis(speaker, &voice, e))?;
                let track = PcmTrack::from_wav(&bytes)?;
                if has_words && track.is_empty() {
                    return Err(AudioError::EmptySpeech(speaker.to_owned()).into());
                }
                debug!(speaker, frames = track.frames(), "speaker audio decoded");

                Ok::<_, Error>((speaker.to_owned(), track))
            }
        });

        let tracks: HashMap<String, PcmTrack> = stream::iter(jobs)
            .buffered(self.settings.synthesis_concurrency.max(1))
            .try_collect()
            .await?;

        Ok(self.compositor.compose(script, &tracks)?)
    }

    /// Run the whole podcast pipeline and export the result.
    ///
    /// Nothing is synthesized unless the script parses and every speaker gets
    /// a voice, and no file is left behind on failure.
    ///
    /// # Errors
    ///
    /// Any error from [`generate_script`](Self::generate_script),
    /// [`assign_voices`](Self::assign_voices) or [`render`](Self::render),
    /// or [`Error::Audio`] if export fails.
    pub async fn generate_podcast(&self, request: &PodcastRequest) -> Result<PodcastOutput> {
        let script = self.generate_script(request).await?;
        let voices = self.assign_voices(&script)?;

        let track = self.render(&script, &voices).await?;
        let bytes = audio::encode(&track, self.output.format, self.output.bitrate_kbps)?;
        audio::write_atomic(&self.output.path, &bytes).await?;

        let title = if script.title().trim().is_empty() {
            request.topic.clone()
        } else {
            script.title().to_owned()
        };
        info!(
            title = %title,
            path = %self.output.path.display(),
            seconds = track.duration().as_secs_f64(),
            "podcast exported"
        );

        Ok(PodcastOutput {
            path: self.output.path.clone(),
            title,
            script,
            voices,
            duration: track.duration(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::clone_on_ref_ptr)]
mod tests {
    use super::*;
    use crate::llms::{GroqConfig, MockCompletion};
    use crate::prompts::PromptTemplates;
    use crate::speech::{DeepgramConfig, MockSpeech};

    const SCRIPT: &str = r#"{"podcast": {"title": "", "speakers": [
        {"id": "A", "gender": "female"}], "segments": [
        {"speaker": "A", "text": "Hello"}]}}"#;

    fn podcaster(llm: MockCompletion) -> (Podcaster, Arc<MockCompletion>, Arc<MockSpeech>) {
        let llm = Arc::new(llm);
        let speech = Arc::new(MockSpeech::new());
        let podcaster = Podcaster::new(llm.clone(), speech.clone()).with_seed(7);
        (podcaster, llm, speech)
    }

    #[tokio::test]
    async fn test_answer_uses_answer_model_and_temperature() {
        let (podcaster, llm, _) = podcaster(MockCompletion::always("42"));
        assert_eq!(podcaster.answer("meaning of life").await.unwrap(), "42");

        let requests = llm.requests();
        assert_eq!(requests[0].model, "llama3-8b-8192");
        assert_eq!(requests[0].prompt, "Answer this user query : meaning of life");
        assert!((requests[0].temperature - 0.4).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_answer_and_speak_uses_answer_voice() {
        let (podcaster, _, speech) = podcaster(MockCompletion::always("Spoken answer"));
        let (answer, wav) = podcaster.answer_and_speak("q").await.unwrap();

        assert_eq!(answer, "Spoken answer");
        assert!(PcmTrack::from_wav(&wav).is_ok());
        let requests = speech.requests();
        assert_eq!(requests[0].voice, "aura-stella-en");
        assert_eq!(requests[0].text, "Spoken answer");
    }

    #[tokio::test]
    async fn test_custom_prompts_are_used() {
        let (podcaster, llm, _) = podcaster(MockCompletion::always("ok"));
        let podcaster = podcaster.with_prompts(PromptRender::new(PromptTemplates {
            answer: "Q: {{ user_query }}".to_owned(),
            ..PromptTemplates::default()
        }));

        podcaster.answer("why").await.unwrap();
        assert_eq!(llm.requests()[0].prompt, "Q: why");
    }

    #[tokio::test]
    async fn test_undefined_template_variable_fails_before_completion() {
        let (podcaster, llm, _) = podcaster(MockCompletion::always("ok"));
        let podcaster = podcaster.with_prompts(PromptRender::new(PromptTemplates {
            answer: "{{ audience }} asks: {{ user_query }}".to_owned(),
            ..PromptTemplates::default()
        }));

        let err = podcaster.answer("why").await.unwrap_err();
        assert!(matches!(err, Error::Prompt(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_skips_completion() {
        let (podcaster, llm, _) = podcaster(MockCompletion::always(SCRIPT));
        let err = podcaster
            .generate_script(&PodcastRequest::new("topic", 3, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_script_uses_script_model() {
        let (podcaster, llm, _) = podcaster(MockCompletion::always(SCRIPT));
        let script = podcaster
            .generate_script(&PodcastRequest::new("greetings", 1, 0, 1))
            .await
            .unwrap();
        assert_eq!(script.speakers().len(), 1);
        assert_eq!(llm.requests()[0].model, "llama3-70b-8192");
    }

    #[tokio::test]
    async fn test_lenient_parsing_is_opt_in() {
        let wrapped = format!("Here you go:\n```json\n{SCRIPT}\n```");
        let request = PodcastRequest::new("greetings", 1, 0, 1);

        let (strict, _, _) = podcaster(MockCompletion::always(wrapped.clone()));
        assert!(matches!(
            strict.generate_script(&request).await.unwrap_err(),
            Error::MalformedScript(_)
        ));

        let (lenient, _, _) = podcaster(MockCompletion::always(wrapped));
        let lenient = lenient.with_settings(PodcastSettings {
            lenient_parsing: true,
            ..PodcastSettings::default()
        });
        assert!(lenient.generate_script(&request).await.is_ok());
    }

    #[test]
    fn test_from_config_requires_keys() {
        let err = Podcaster::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let config = Config {
            groq: GroqConfig::new("gsk"),
            deepgram: DeepgramConfig::new("dg"),
            ..Config::default()
        };
        let podcaster = Podcaster::from_config(&config).unwrap();
        assert_eq!(podcaster.settings().script_model, "llama3-70b-8192");
    }
}
