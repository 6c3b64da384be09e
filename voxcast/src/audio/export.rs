//! Encoding and writing the finished podcast.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{AudioError, OutputFormat, PcmTrack};

/// MP3 bit rate used unless configured otherwise.
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Encode a track for export.
///
/// # Errors
///
/// Returns [`AudioError::Mp3`] if MP3 encoding fails, is unavailable, or
/// the bit rate is not one LAME supports, and [`AudioError::Encode`] if WAV
/// encoding fails.
pub fn encode(
    track: &PcmTrack,
    format: OutputFormat,
    bitrate_kbps: u32,
) -> Result<Vec<u8>, AudioError> {
    match format {
        OutputFormat::Wav => track.to_wav(),
        OutputFormat::Mp3 => mp3::encode(track, bitrate_kbps),
    }
}

/// Write `bytes` to `path` without ever leaving a partial file there.
///
/// The data goes to a hidden sibling first and is renamed into place once
/// fully written. Missing parent directories are created.
///
/// # Errors
///
/// Returns [`AudioError::Io`] if any filesystem step fails.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AudioError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(path);
    let result = async {
        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, path).await
    }
    .await;

    if let Err(e) = result {
        if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %partial.display(), error = %cleanup, "failed to remove partial output");
            }
        }
        return Err(e.into());
    }

    debug!(path = %path.display(), bytes = bytes.len(), "output written");
    Ok(())
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy());
    path.with_file_name(format!(".{name}.partial"))
}

#[cfg(feature = "mp3")]
mod mp3 {
    use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};

    use super::{AudioError, PcmTrack};

    /// Frames handed to LAME per call.
    const CHUNK_FRAMES: usize = 1152 * 32;

    /// Upper bound on what a flush can emit.
    const FLUSH_RESERVE: usize = 7200;

    const fn bitrate(kbps: u32) -> Option<Bitrate> {
        Some(match kbps {
            8 => Bitrate::Kbps8,
            16 => Bitrate::Kbps16,
            24 => Bitrate::Kbps24,
            32 => Bitrate::Kbps32,
            40 => Bitrate::Kbps40,
            48 => Bitrate::Kbps48,
            64 => Bitrate::Kbps64,
            80 => Bitrate::Kbps80,
            96 => Bitrate::Kbps96,
            112 => Bitrate::Kbps112,
            128 => Bitrate::Kbps128,
            160 => Bitrate::Kbps160,
            192 => Bitrate::Kbps192,
            224 => Bitrate::Kbps224,
            256 => Bitrate::Kbps256,
            320 => Bitrate::Kbps320,
            _ => return None,
        })
    }

    /// Whether LAME accepts this constant bit rate.
    pub(crate) const fn is_supported_bitrate(kbps: u32) -> bool {
        bitrate(kbps).is_some()
    }

    pub(super) fn encode(track: &PcmTrack, bitrate_kbps: u32) -> Result<Vec<u8>, AudioError> {
        let spec = track.spec();
        let channels = match spec.channels {
            1 => 1u8,
            2 => 2u8,
            n => {
                return Err(AudioError::UnsupportedFormat(format!(
                    "MP3 export supports 1 or 2 channels, got {n}"
                )));
            }
        };
        let brate = bitrate(bitrate_kbps)
            .ok_or_else(|| AudioError::Mp3(format!("unsupported bit rate {bitrate_kbps} kbps")))?;

        let mut builder =
            Builder::new().ok_or_else(|| AudioError::Mp3("failed to allocate LAME".into()))?;
        builder
            .set_num_channels(channels)
            .map_err(|e| AudioError::Mp3(format!("channels: {e:?}")))?;
        builder
            .set_sample_rate(spec.sample_rate)
            .map_err(|e| AudioError::Mp3(format!("sample rate: {e:?}")))?;
        builder
            .set_brate(brate)
            .map_err(|e| AudioError::Mp3(format!("bit rate: {e:?}")))?;
        builder
            .set_quality(Quality::Good)
            .map_err(|e| AudioError::Mp3(format!("quality: {e:?}")))?;
        let mut encoder = builder
            .build()
            .map_err(|e| AudioError::Mp3(format!("init: {e:?}")))?;

        let mut out = Vec::new();
        let chunk_samples = CHUNK_FRAMES * usize::from(channels);
        for chunk in track.samples().chunks(chunk_samples) {
            let frames = chunk.len() / usize::from(channels);
            out.reserve(mp3lame_encoder::max_required_buffer_size(frames));
            if channels == 1 {
                encoder.encode_to_vec(MonoPcm(chunk), &mut out)
            } else {
                encoder.encode_to_vec(InterleavedPcm(chunk), &mut out)
            }
            .map_err(|e| AudioError::Mp3(format!("encode: {e:?}")))?;
        }

        out.reserve(FLUSH_RESERVE);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(|e| AudioError::Mp3(format!("flush: {e:?}")))?;

        Ok(out)
    }
}

#[cfg(not(feature = "mp3"))]
mod mp3 {
    use super::{AudioError, PcmTrack};

    pub(crate) const fn is_supported_bitrate(_kbps: u32) -> bool {
        true
    }

    pub(super) fn encode(_track: &PcmTrack, _bitrate_kbps: u32) -> Result<Vec<u8>, AudioError> {
        Err(AudioError::Mp3(
            "built without the `mp3` feature; use WAV output".into(),
        ))
    }
}

pub(crate) use mp3::is_supported_bitrate;
