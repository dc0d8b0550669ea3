//! Video jobs

use super::audio::check_tempo;
use super::{output_format, require_non_negative, require_positive, MediaError, TranscodeJob};
use crate::file::InputFile;

/// Formats accepted by the video convert tool
pub const VIDEO_FORMATS: &[&str] = &["mp4", "webm", "mkv", "mov", "avi"];

pub fn convert_video(file: &InputFile, format: &str) -> Result<TranscodeJob, MediaError> {
    let format = output_format(format, VIDEO_FORMATS)?;
    Ok(TranscodeJob::single(
        file,
        Vec::<String>::new(),
        &format!("output.{}", format),
    ))
}

/// Re-encode as MP4 at CRF 28
pub fn compress_video(file: &InputFile) -> TranscodeJob {
    TranscodeJob::single(file, ["-crf", "28", "-preset", "fast"], "output.mp4")
}

pub fn trim_video(file: &InputFile, start: f64, duration: f64) -> Result<TranscodeJob, MediaError> {
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
        "output.mp4",
    ))
}

/// Drop the video stream and encode the audio as MP3
pub fn extract_audio(file: &InputFile) -> TranscodeJob {
    TranscodeJob::single(file, ["-vn", "-acodec", "libmp3lame"], "output.mp3")
}

/// 10 fps, 320 px wide animated GIF
pub fn video_to_gif(file: &InputFile) -> TranscodeJob {
    TranscodeJob::single(
        file,
        ["-vf", "fps=10,scale=320:-1:flags=lanczos"],
        "output.gif",
    )
}

/// Rotate clockwise by a right angle
pub fn rotate_video(file: &InputFile, degrees: i64) -> Result<TranscodeJob, MediaError> {
    if degrees % 90 != 0 {
        return Err(MediaError::InvalidOption(format!(
            "rotation must be a multiple of 90 degrees, got {}",
            degrees
        )));
    }
    let filters: Vec<&str> = match degrees.rem_euclid(360) {
        90 => vec!["-vf", "transpose=1"],
        180 => vec!["-vf", "transpose=1,transpose=1"],
        270 => vec!["-vf", "transpose=2"],
        _ => vec!["-c", "copy"],
    };
    Ok(TranscodeJob::single(file, filters, "output.mp4"))
}

/// Concatenate files that each carry one video and one audio stream
pub fn merge_videos(files: &[InputFile]) -> Result<TranscodeJob, MediaError> {
    let streams: String = (0..files.len())
        .map(|i| format!("[{0}:v][{0}:a]", i))
        .collect();
    let filter = format!("{}concat=n={}:v=1:a=1[v][a]", streams, files.len());
    TranscodeJob::multi(
        files,
        [
            "-filter_complex".to_string(),
            filter,
            "-map".into(),
            "[v]".into(),
            "-map".into(),
            "[a]".into(),
        ],
        "output.mp4",
    )
}

pub fn remove_audio(file: &InputFile) -> TranscodeJob {
    TranscodeJob::single(file, ["-c:v", "copy", "-an"], "output.mp4")
}

pub fn crop_video(
    file: &InputFile,
    width: u32,
    height: u32,
    x: u32,
    y: u32,
) -> Result<TranscodeJob, MediaError> {
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidOption(format!(
            "crop size must be positive, got {}x{}",
            width, height
        )));
    }
    Ok(TranscodeJob::single(
        file,
        ["-vf".to_string(), format!("crop={}:{}:{}:{}", width, height, x, y)],
        "output.mp4",
    ))
}

/// Speed up or slow down both streams by `speed`
pub fn change_video_speed(file: &InputFile, speed: f64) -> Result<TranscodeJob, MediaError> {
    check_tempo(speed)?;
    Ok(TranscodeJob::single(
        file,
        [
            "-vf".to_string(),
            format!("setpts=PTS/{}", speed),
            "-af".to_string(),
            format!("atempo={}", speed),
        ],
        "output.mp4",
    ))
}

pub fn reverse_video(file: &InputFile) -> TranscodeJob {
    TranscodeJob::single(file, ["-vf", "reverse", "-af", "areverse"], "output.mp4")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mp4() -> InputFile {
        InputFile::from_bytes("clip.mp4", vec![0, 0, 0, 0x18])
    }

    #[test]
    fn test_compress_args() {
        assert_eq!(
            compress_video(&mp4()).args,
            vec!["-i", "input.mp4", "-crf", "28", "-preset", "fast", "output.mp4"]
        );
    }

    #[test]
    fn test_rotate_transpose_mapping() {
        assert_eq!(rotate_video(&mp4(), 90).unwrap().args[3], "transpose=1");
        assert_eq!(
            rotate_video(&mp4(), 180).unwrap().args[3],
            "transpose=1,transpose=1"
        );
        assert_eq!(rotate_video(&mp4(), 270).unwrap().args[3], "transpose=2");
        assert_eq!(rotate_video(&mp4(), -90).unwrap().args[3], "transpose=2");
        assert!(rotate_video(&mp4(), 45).is_err());
    }

    #[test]
    fn test_gif_and_extract_audio_outputs() {
        let gif = video_to_gif(&mp4());
        assert_eq!(gif.mime, "image/gif");
        assert_eq!(gif.args[3], "fps=10,scale=320:-1:flags=lanczos");

        let audio = extract_audio(&mp4());
        assert_eq!(audio.output, "output.mp3");
        assert_eq!(audio.mime, "audio/mpeg");
    }

    #[test]
    fn test_merge_filter() {
        let job = merge_videos(&[mp4(), mp4()]).unwrap();
        assert!(job
            .args
            .contains(&"[0:v][0:a][1:v][1:a]concat=n=2:v=1:a=1[v][a]".to_string()));
    }

    #[test]
    fn test_crop_and_speed() {
        assert_eq!(
            crop_video(&mp4(), 640, 480, 10, 20).unwrap().args[3],
            "crop=640:480:10:20"
        );
        assert!(crop_video(&mp4(), 0, 480, 0, 0).is_err());

        let job = change_video_speed(&mp4(), 2.0).unwrap();
        assert_eq!(job.args[3], "setpts=PTS/2");
        assert_eq!(job.args[5], "atempo=2");
    }

    #[test]
    fn test_remove_audio_and_reverse() {
        assert_eq!(
            remove_audio(&mp4()).args,
            vec!["-i", "input.mp4", "-c:v", "copy", "-an", "output.mp4"]
        );
        assert_eq!(reverse_video(&mp4()).args[3], "reverse");
    }
}
