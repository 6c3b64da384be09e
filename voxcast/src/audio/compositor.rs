//! Reassembles per-speaker audio into script order.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::script::PodcastScript;

use super::split::{proportional_ranges, text_weights};
use super::{AudioError, PcmTrack};

/// Cuts each speaker's synthesized track into per-segment slices and replays
/// them in script order.
///
/// A speaker's track is the synthesis of all their lines joined with single
/// spaces. Slices are sized by the character count of each line.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    /// Create a compositor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Slice every speaker's track, returning one slice per segment in
    /// script order.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::MissingSpeaker`] if a speaker with lines has no
    /// track.
    pub fn segment_slices(
        &self,
        script: &PodcastScript,
        tracks: &HashMap<String, PcmTrack>,
    ) -> Result<Vec<PcmTrack>, AudioError> {
        let mut queues: HashMap<&str, VecDeque<PcmTrack>> = HashMap::new();

        for (speaker, lines) in script.lines_by_speaker() {
            let track = tracks
                .get(speaker)
                .ok_or_else(|| AudioError::MissingSpeaker(speaker.to_owned()))?;
            let texts: Vec<&str> = lines.iter().map(|s| s.text.as_str()).collect();
            let ranges = proportional_ranges(track.frames(), &text_weights(&texts));
            debug!(
                speaker,
                frames = track.frames(),
                segments = ranges.len(),
                "split speaker track"
            );
            queues.insert(
                speaker,
                ranges.into_iter().map(|r| track.slice(r)).collect(),
            );
        }

        script
            .segments()
            .iter()
            .map(|segment| {
                queues
                    .get_mut(segment.speaker_id.as_str())
                    .and_then(VecDeque::pop_front)
                    .ok_or_else(|| AudioError::MissingSpeaker(segment.speaker_id.clone()))
            })
            .collect()
    }

    /// Build the final track.
    ///
    /// # Errors
    ///
    /// Returns [`AudioError::MissingSpeaker`] as for
    /// [`segment_slices`](Self::segment_slices), or
    /// [`AudioError::SpecMismatch`] if speakers' tracks differ in sample
    /// rate or channel count.
    pub fn compose(
        &self,
        script: &PodcastScript,
        tracks: &HashMap<String, PcmTrack>,
    ) -> Result<PcmTrack, AudioError> {
        let mut slices = self.segment_slices(script, tracks)?.into_iter();
        let Some(mut output) = slices.next() else {
            return Err(AudioError::MissingSpeaker(String::new()));
        };
        for slice in slices {
            output.append(&slice)?;
        }
        debug!(
            frames = output.frames(),
            seconds = output.duration().as_secs_f64(),
            "composed podcast"
        );
        Ok(output)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audio::PcmSpec;
    use crate::script::{Gender, Segment, Speaker};

    fn script() -> PodcastScript {
        PodcastScript::new(
            "Show",
            vec![
                Speaker::new("host", Gender::Female),
                Speaker::new("guest", Gender::Male),
            ],
            vec![
                Segment::new("host", "abc"),
                Segment::new("guest", "wxyz"),
                Segment::new("host", "defghij"),
            ],
        )
        .unwrap()
    }

    fn track(value_base: i16, frames: usize) -> PcmTrack {
        let samples = (0..frames)
            .map(|i| value_base + i16::try_from(i).unwrap())
            .collect();
        PcmTrack::new(PcmSpec::mono(8_000), samples)
    }

    fn tracks() -> HashMap<String, PcmTrack> {
        HashMap::from([
            ("host".to_owned(), track(0, 100)),
            ("guest".to_owned(), track(1000, 40)),
        ])
    }

    #[test]
    fn test_slices_follow_script_order_and_weights() {
        let slices = Compositor::new().segment_slices(&script(), &tracks()).unwrap();

        // Host: "abc" (3) and "defghij" (7) over 100 frames.
        assert_eq!(slices.len(), 3);
        assert_eq!(slices[0].frames(), 30);
        assert_eq!(slices[1].frames(), 40);
        assert_eq!(slices[2].frames(), 70);
        assert_eq!(slices[0].samples()[0], 0);
        assert_eq!(slices[1].samples()[0], 1000);
        assert_eq!(slices[2].samples()[0], 30);
    }

    #[test]
    fn test_speaker_slices_rejoin_to_original() {
        let tracks = tracks();
        let slices = Compositor::new().segment_slices(&script(), &tracks).unwrap();

        let mut host = PcmTrack::empty(PcmSpec::mono(8_000));
        host.append(&slices[0]).unwrap();
        host.append(&slices[2]).unwrap();
        assert_eq!(host, tracks["host"]);
    }

    #[test]
    fn test_compose_concatenates_everything() {
        let output = Compositor::new().compose(&script(), &tracks()).unwrap();
        assert_eq!(output.frames(), 140);
        assert_eq!(output.samples()[30], 1000);
        assert_eq!(output.samples()[70], 30);
    }

    #[test]
    fn test_missing_track_is_an_error() {
        let mut tracks = tracks();
        tracks.remove("guest");
        let err = Compositor::new().compose(&script(), &tracks).unwrap_err();
        assert!(matches!(err, AudioError::MissingSpeaker(id) if id == "guest"));
    }

    #[test]
    fn test_mismatched_rates_are_rejected() {
        let mut tracks = tracks();
        tracks.insert(
            "guest".to_owned(),
            PcmTrack::new(PcmSpec::mono(16_000), vec![0; 40]),
        );
        let err = Compositor::new().compose(&script(), &tracks).unwrap_err();
        assert!(matches!(err, AudioError::SpecMismatch { .. }));
    }
}
