//! Podcast script model and parser.
//!
//! The completion model is asked to answer with a document of the shape
//!
//! ```json
//! {"podcast": {"title": "...",
//!              "speakers": [{"id": "S1", "gender": "male"}],
//!              "segments": [{"speaker": "S1", "text": "..."}]}}
//! ```
//!
//! [`parse_script`] accepts exactly that. [`parse_script_lenient`] first cuts
//! away any prose around the outermost object.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::error::{Error, Result};

/// Upper bound on speakers per podcast.
pub const MAX_SPEAKERS: usize = 6;

/// What the caller asks the podcast pipeline to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodcastRequest {
    /// Topic handed to the completion model.
    pub topic: String,
    /// Total number of speakers.
    pub num_speakers: usize,
    /// Number of male speakers.
    pub male_count: usize,
    /// Number of female speakers.
    pub female_count: usize,
}

impl PodcastRequest {
    /// Create a new podcast request.
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        num_speakers: usize,
        male_count: usize,
        female_count: usize,
    ) -> Self {
        Self {
            topic: topic.into(),
            num_speakers,
            male_count,
            female_count,
        }
    }

    /// Number of requested speakers of one gender.
    #[must_use]
    pub const fn count(&self, gender: Gender) -> usize {
        match gender {
            Gender::Male => self.male_count,
            Gender::Female => self.female_count,
        }
    }

    /// Check the request is self-consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] when the topic is blank, the speaker
    /// total is outside `1..=6`, or the gender counts do not add up.
    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(Error::invalid_request("topic must not be empty"));
        }
        if !(1..=MAX_SPEAKERS).contains(&self.num_speakers) {
            return Err(Error::invalid_request(format!(
                "number of speakers must be between 1 and {MAX_SPEAKERS}, got {}",
                self.num_speakers
            )));
        }
        if self.male_count + self.female_count != self.num_speakers {
            return Err(Error::invalid_request(format!(
                "{} male + {} female speakers does not add up to {}",
                self.male_count, self.female_count, self.num_speakers
            )));
        }
        Ok(())
    }
}

/// Speaker gender, used to pick a voice pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Gender {
    /// Male voice pool.
    Male,
    /// Female voice pool.
    Female,
}

impl Gender {
    /// Wire name of the gender.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            other => Err(format!("unknown gender `{other}`, expected `male` or `female`")),
        }
    }
}

impl TryFrom<String> for Gender {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// One participant of the podcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Identifier referenced by segments (e.g. `S1`).
    pub id: String,
    /// Gender used for voice selection.
    pub gender: Gender,
}

impl Speaker {
    /// Create a new speaker.
    #[must_use]
    pub fn new(id: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            gender,
        }
    }
}

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Speaker saying the line.
    #[serde(rename = "speaker")]
    pub speaker_id: String,
    /// The spoken text.
    pub text: String,
}

impl Segment {
    /// Create a new segment.
    #[must_use]
    pub fn new(speaker_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker_id: speaker_id.into(),
            text: text.into(),
        }
    }
}

/// A validated podcast script.
///
/// Speaker ids are unique and every segment references a known speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodcastScript {
    title: String,
    speakers: Vec<Speaker>,
    segments: Vec<Segment>,
}

/// Wire envelope: the script lives under a top-level `podcast` key.
#[derive(Debug, Deserialize, Serialize)]
struct Envelope<T> {
    podcast: T,
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    title: String,
    speakers: Vec<Speaker>,
    segments: Vec<Segment>,
}

impl PodcastScript {
    /// Build a script, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedScriptError`] when there are no speakers or segments,
    /// speaker ids repeat, or a segment names an unknown speaker.
    pub fn new(
        title: impl Into<String>,
        speakers: Vec<Speaker>,
        segments: Vec<Segment>,
    ) -> std::result::Result<Self, MalformedScriptError> {
        if speakers.is_empty() {
            return Err(MalformedScriptError::NoSpeakers);
        }
        if segments.is_empty() {
            return Err(MalformedScriptError::NoSegments);
        }

        let mut ids = HashSet::with_capacity(speakers.len());
        for speaker in &speakers {
            if !ids.insert(speaker.id.as_str()) {
                return Err(MalformedScriptError::DuplicateSpeaker(speaker.id.clone()));
            }
        }

        if let Some((index, segment)) = segments
            .iter()
            .enumerate()
            .find(|(_, s)| !ids.contains(s.speaker_id.as_str()))
        {
            return Err(MalformedScriptError::UnknownSpeaker {
                segment: index,
                speaker: segment.speaker_id.clone(),
            });
        }

        Ok(Self {
            title: title.into(),
            speakers,
            segments,
        })
    }

    /// Podcast title (may be empty if the model omitted it).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Speakers in script order.
    #[must_use]
    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    /// Segments in script order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of speakers of one gender.
    #[must_use]
    pub fn count(&self, gender: Gender) -> usize {
        self.speakers.iter().filter(|s| s.gender == gender).count()
    }

    /// Whether the speaker list matches the requested counts.
    #[must_use]
    pub fn matches_request(&self, request: &PodcastRequest) -> bool {
        self.speakers.len() == request.num_speakers
            && self.count(Gender::Male) == request.male_count
            && self.count(Gender::Female) == request.female_count
    }

    /// Segments grouped by speaker, speakers in order of first appearance.
    ///
    /// Speakers with no lines are left out.
    #[must_use]
    pub fn lines_by_speaker(&self) -> Vec<(&str, Vec<&Segment>)> {
        let mut groups: Vec<(&str, Vec<&Segment>)> = Vec::new();
        for segment in &self.segments {
            match groups.iter_mut().find(|(id, _)| *id == segment.speaker_id) {
                Some((_, lines)) => lines.push(segment),
                None => groups.push((segment.speaker_id.as_str(), vec![segment])),
            }
        }
        groups
    }

    /// Serialize back to the `{"podcast": {...}}` wire shape.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&Envelope { podcast: self })
    }
}

/// Why a completion could not be turned into a [`PodcastScript`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MalformedScriptError {
    /// Not syntactically valid JSON.
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    /// Valid JSON without the expected `podcast.speakers` / `podcast.segments` shape.
    #[error("unexpected script shape: {0}")]
    Shape(String),
    /// No JSON object could be located in the response.
    #[error("no JSON object found in response")]
    NoJsonObject,
    /// The speaker list is empty.
    #[error("script has no speakers")]
    NoSpeakers,
    /// The segment list is empty.
    #[error("script has no segments")]
    NoSegments,
    /// Two speakers share an id.
    #[error("duplicate speaker id `{0}`")]
    DuplicateSpeaker(String),
    /// A segment references a speaker that is not declared.
    #[error("segment {segment} references unknown speaker `{speaker}`")]
    UnknownSpeaker {
        /// Zero-based segment index.
        segment: usize,
        /// The undeclared speaker id.
        speaker: String,
    },
}

impl From<serde_json::Error> for MalformedScriptError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => Self::Shape(err.to_string()),
            Category::Syntax | Category::Eof | Category::Io => Self::InvalidJson(err.to_string()),
        }
    }
}

/// Parse a completion strictly as a podcast script.
///
/// # Errors
///
/// Returns [`MalformedScriptError`] if the text is not exactly one JSON
/// document of the expected shape, or the script breaks its invariants.
pub fn parse_script(text: &str) -> std::result::Result<PodcastScript, MalformedScriptError> {
    let envelope: Envelope<RawScript> = serde_json::from_str(text.trim())?;
    let raw = envelope.podcast;
    PodcastScript::new(raw.title, raw.speakers, raw.segments)
}

/// Parse a completion after cutting it down to its outermost `{ ... }`.
///
/// Tolerates prose or code fences around the document. The cut text must
/// still parse strictly.
///
/// # Errors
///
/// Returns [`MalformedScriptError::NoJsonObject`] when there is no brace pair,
/// or any error [`parse_script`] would return for the cut text.
pub fn parse_script_lenient(text: &str) -> std::result::Result<PodcastScript, MalformedScriptError> {
    let object = extract_json_object(text).ok_or(MalformedScriptError::NoJsonObject)?;
    parse_script(object)
}

/// Slice from the first `{` to the last `}` inclusive.
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
      "podcast": {
        "title": "AI Today",
        "speakers": [
          {"id": "S1", "gender": "male"},
          {"id": "S2", "gender": "female"},
          {"id": "S3", "gender": "Female"}
        ],
        "segments": [
          {"speaker": "S1", "text": "Welcome to the show."},
          {"speaker": "S2", "text": "Thanks for having me."},
          {"speaker": "S1", "text": "Let's talk about AI."},
          {"speaker": "S3", "text": "It is everywhere."}
        ]
      }
    }"#;

    #[test]
    fn test_parses_well_formed_script() {
        let script = parse_script(SCRIPT).unwrap();

        assert_eq!(script.title(), "AI Today");
        assert_eq!(script.speakers().len(), 3);
        assert_eq!(script.segments().len(), 4);
        assert_eq!(script.count(Gender::Male), 1);
        assert_eq!(script.count(Gender::Female), 2);
        assert_eq!(script.segments()[2].speaker_id, "S1");
        assert!(script.matches_request(&PodcastRequest::new("AI in todays world", 3, 1, 2)));
        assert!(!script.matches_request(&PodcastRequest::new("AI in todays world", 3, 2, 1)));
    }

    #[test]
    fn test_groups_lines_in_first_appearance_order() {
        let script = parse_script(SCRIPT).unwrap();
        let groups = script.lines_by_speaker();

        let ids: Vec<&str> = groups.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, ["S1", "S2", "S3"]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].text, "Let's talk about AI.");
    }

    #[test]
    fn test_missing_title_defaults_to_empty() {
        let text = r#"{"podcast": {"speakers": [{"id": "A", "gender": "male"}],
                        "segments": [{"speaker": "A", "text": "hi"}]}}"#;
        assert_eq!(parse_script(text).unwrap().title(), "");
    }

    #[test]
    fn test_prose_wrapped_json_is_rejected_by_strict_parse() {
        let err = parse_script("Sure, here's the script: {...}").unwrap_err();
        assert!(matches!(err, MalformedScriptError::InvalidJson(_)));

        let wrapped = format!("Sure, here's the script: {SCRIPT}");
        assert!(matches!(
            parse_script(&wrapped).unwrap_err(),
            MalformedScriptError::InvalidJson(_)
        ));
    }

    #[test]
    fn test_lenient_parse_strips_surrounding_prose() {
        let wrapped = format!("Sure, here's the script:\n```json\n{SCRIPT}\n```\nEnjoy!");
        let script = parse_script_lenient(&wrapped).unwrap();
        assert_eq!(script.title(), "AI Today");
    }

    #[test]
    fn test_lenient_parse_still_rejects_placeholder_body() {
        assert!(matches!(
            parse_script_lenient("Sure, here's the script: {...}").unwrap_err(),
            MalformedScriptError::InvalidJson(_)
        ));
        assert_eq!(
            parse_script_lenient("no json here").unwrap_err(),
            MalformedScriptError::NoJsonObject
        );
    }

    #[test]
    fn test_missing_segments_is_a_shape_error() {
        let text = r#"{"podcast": {"title": "x", "speakers": []}}"#;
        assert!(matches!(
            parse_script(text).unwrap_err(),
            MalformedScriptError::Shape(_)
        ));

        let text = r#"{"title": "no envelope"}"#;
        assert!(matches!(
            parse_script(text).unwrap_err(),
            MalformedScriptError::Shape(_)
        ));
    }

    #[test]
    fn test_unknown_gender_is_a_shape_error() {
        let text = r#"{"podcast": {"speakers": [{"id": "A", "gender": "male/female"}],
                        "segments": [{"speaker": "A", "text": "hi"}]}}"#;
        let err = parse_script(text).unwrap_err();
        match err {
            MalformedScriptError::Shape(msg) => assert!(msg.contains("unknown gender")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_segment_with_unknown_speaker() {
        let text = r#"{"podcast": {"speakers": [{"id": "S1", "gender": "male"}],
                        "segments": [{"speaker": "S1", "text": "hi"},
                                     {"speaker": "S9", "text": "who am I"}]}}"#;
        assert_eq!(
            parse_script(text).unwrap_err(),
            MalformedScriptError::UnknownSpeaker {
                segment: 1,
                speaker: "S9".to_owned()
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_speaker_ids() {
        let text = r#"{"podcast": {"speakers": [{"id": "S1", "gender": "male"},
                                               {"id": "S1", "gender": "female"}],
                        "segments": [{"speaker": "S1", "text": "hi"}]}}"#;
        assert_eq!(
            parse_script(text).unwrap_err(),
            MalformedScriptError::DuplicateSpeaker("S1".to_owned())
        );
    }

    #[test]
    fn test_rejects_empty_lists() {
        assert_eq!(
            PodcastScript::new("t", vec![], vec![Segment::new("A", "x")]).unwrap_err(),
            MalformedScriptError::NoSpeakers
        );
        assert_eq!(
            PodcastScript::new("t", vec![Speaker::new("A", Gender::Male)], vec![]).unwrap_err(),
            MalformedScriptError::NoSegments
        );
    }

    #[test]
    fn test_serializes_back_to_wire_shape() {
        let script = parse_script(SCRIPT).unwrap();
        let json = script.to_json_pretty().unwrap();
        let reparsed = parse_script(&json).unwrap();
        assert_eq!(reparsed, script);
        assert!(json.contains(r#""speaker": "S1""#));
        assert!(json.contains(r#""gender": "female""#));
    }

    #[test]
    fn test_request_validation() {
        assert!(PodcastRequest::new("AI in todays world", 3, 1, 2).validate().is_ok());
        assert!(PodcastRequest::new("  ", 3, 1, 2).validate().is_err());
        assert!(PodcastRequest::new("t", 0, 0, 0).validate().is_err());
        assert!(PodcastRequest::new("t", 7, 4, 3).validate().is_err());
        assert!(PodcastRequest::new("t", 3, 1, 1).validate().is_err());
    }
}
