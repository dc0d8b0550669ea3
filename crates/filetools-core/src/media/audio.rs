//! Audio jobs

use super::{output_format, require_non_negative, require_positive, MediaError, TranscodeJob};
use crate::file::InputFile;

/// Formats accepted by the audio convert tool
pub const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "aac", "flac", "ogg", "m4a"];

/// Lowest and highest tempo factor a single `atempo` filter accepts
pub const TEMPO_RANGE: (f64, f64) = (0.5, 100.0);

pub fn convert_audio(file: &InputFile, format: &str) -> Result<TranscodeJob, MediaError> {
    let format = output_format(format, AUDIO_FORMATS)?;
    Ok(TranscodeJob::single(
        file,
        Vec::<String>::new(),
        &format!("output.{}", format),
    ))
}

/// Re-encode as 128 kbps MP3
pub fn compress_audio(file: &InputFile) -> TranscodeJob {
    TranscodeJob::single(file, ["-b:a", "128k"], "output.mp3")
}

/// Keep `duration` seconds from `start`, without re-encoding
pub fn trim_audio(file: &InputFile, start: f64, duration: f64) -> Result<TranscodeJob, MediaError> {
    require_non_negative("startTime", start)?;
    require_positive("duration", duration)?;
    Ok(TranscodeJob::single(
        file,
        [
            "-ss".to_string(),
            start.to_string(),
            "-t".to_string(),
            duration.to_string(),
            "-c".to_string(),
            "copy".to_string(),
        ],
        "output.mp3",
    ))
}

/// Concatenate the audio streams of all files, in order
pub fn merge_audio(files: &[InputFile]) -> Result<TranscodeJob, MediaError> {
    let streams: String = (0..files.len()).map(|i| format!("[{}:a]", i)).collect();
    let filter = format!("{}concat=n={}:v=0:a=1[out]", streams, files.len());
    TranscodeJob::multi(
        files,
        ["-filter_complex".to_string(), filter, "-map".into(), "[out]".into()],
        "output.mp3",
    )
}

/// Scale the volume by `factor`
pub fn change_volume(file: &InputFile, factor: f64) -> Result<TranscodeJob, MediaError> {
    require_non_negative("volume", factor)?;
    Ok(TranscodeJob::single(
        file,
        ["-af".to_string(), format!("volume={}", factor)],
        "output.mp3",
    ))
}

pub fn change_audio_speed(file: &InputFile, speed: f64) -> Result<TranscodeJob, MediaError> {
    check_tempo(speed)?;
    Ok(TranscodeJob::single(
        file,
        ["-filter:a".to_string(), format!("atempo={}", speed)],
        "output.mp3",
    ))
}

/// Fade in over `fade_in` seconds from the start, and fade out over three
/// seconds beginning at `fade_out_start`
pub fn add_fade(file: &InputFile, fade_in: f64, fade_out_start: f64) -> Result<TranscodeJob, MediaError> {
    require_non_negative("fadeIn", fade_in)?;
    require_non_negative("fadeOut", fade_out_start)?;
    Ok(TranscodeJob::single(
        file,
        [
            "-af".to_string(),
            format!(
                "afade=t=in:st=0:d={},afade=t=out:st={}:d=3",
                fade_in, fade_out_start
            ),
        ],
        "output.mp3",
    ))
}

pub fn reverse_audio(file: &InputFile) -> TranscodeJob {
    TranscodeJob::single(file, ["-af", "areverse"], "output.mp3")
}

pub(crate) fn check_tempo(speed: f64) -> Result<(), MediaError> {
    let (low, high) = TEMPO_RANGE;
    if speed.is_finite() && (low..=high).contains(&speed) {
        Ok(())
    } else {
        Err(MediaError::InvalidOption(format!(
            "speed must be between {} and {}, got {}",
            low, high, speed
        )))
    }
}
