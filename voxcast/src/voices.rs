//! Voice assignment from gender-partitioned pools.
//!
//! Each call shuffles a private copy of each pool and hands voices out one per
//! speaker, so no two speakers of the same gender share a voice.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::script::{Gender, Speaker};

/// Deepgram Aura voices used for male speakers.
pub const MALE_VOICES: [&str; 3] = ["aura-orion-en", "aura-arcas-en", "aura-perseus-en"];

/// Deepgram Aura voices used for female speakers.
pub const FEMALE_VOICES: [&str; 3] = ["aura-stella-en", "aura-athena-en", "aura-hera-en"];

/// Not enough voices for the speakers of one gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{requested} {gender} speakers requested but only {available} {gender} voices exist")]
pub struct PoolExhaustedError {
    /// The exhausted pool.
    pub gender: Gender,
    /// Speakers of that gender.
    pub requested: usize,
    /// Pool size.
    pub available: usize,
}

/// Fixed voice pools, one per gender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePools {
    /// Voices for male speakers.
    pub male: Vec<String>,
    /// Voices for female speakers.
    pub female: Vec<String>,
}

impl Default for VoicePools {
    fn default() -> Self {
        Self {
            male: MALE_VOICES.iter().map(|v| (*v).to_owned()).collect(),
            female: FEMALE_VOICES.iter().map(|v| (*v).to_owned()).collect(),
        }
    }
}

impl VoicePools {
    /// The pool for a gender.
    #[must_use]
    pub fn pool(&self, gender: Gender) -> &[String] {
        match gender {
            Gender::Male => &self.male,
            Gender::Female => &self.female,
        }
    }

    /// Check that `requested` speakers of `gender` can all get a voice.
    ///
    /// # Errors
    ///
    /// Returns [`PoolExhaustedError`] when the pool is too small.
    pub fn check_capacity(&self, gender: Gender, requested: usize) -> Result<(), PoolExhaustedError> {
        let available = self.pool(gender).len();
        if requested > available {
            return Err(PoolExhaustedError {
                gender,
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Assign a distinct voice to every speaker.
    ///
    /// Fails before handing out anything if either gender outnumbers its pool.
    ///
    /// # Errors
    ///
    /// Returns [`PoolExhaustedError`] for the first gender that does not fit.
    pub fn assign(
        &self,
        speakers: &[Speaker],
        rng: &mut fastrand::Rng,
    ) -> Result<VoiceAssignment, PoolExhaustedError> {
        let requested = |gender| speakers.iter().filter(|s| s.gender == gender).count();
        for gender in [Gender::Male, Gender::Female] {
            self.check_capacity(gender, requested(gender))?;
        }

        let mut male = self.male.clone();
        let mut female = self.female.clone();
        rng.shuffle(&mut male);
        rng.shuffle(&mut female);

        let mut voices = HashMap::with_capacity(speakers.len());
        for speaker in speakers {
            let pool = match speaker.gender {
                Gender::Male => &mut male,
                Gender::Female => &mut female,
            };
            // Capacity was checked above.
            let Some(voice) = pool.pop() else {
                return Err(PoolExhaustedError {
                    gender: speaker.gender,
                    requested: requested(speaker.gender),
                    available: self.pool(speaker.gender).len(),
                });
            };
            debug!(speaker = %speaker.id, gender = %speaker.gender, voice = %voice, "assigned voice");
            voices.insert(speaker.id.clone(), voice);
        }

        Ok(VoiceAssignment { voices })
    }
}

/// Speaker id to voice id mapping produced by [`VoicePools::assign`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoiceAssignment {
    voices: HashMap<String, String>,
}

impl VoiceAssignment {
    /// Voice assigned to a speaker.
    #[must_use]
    pub fn voice(&self, speaker_id: &str) -> Option<&str> {
        self.voices.get(speaker_id).map(String::as_str)
    }

    /// Number of assigned speakers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether nothing was assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Iterate over `(speaker id, voice id)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.voices.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
