//! Synthesized media source for a video file.
//!
//! Files are never probed. Every video gets one direct-play source; when the
//! sidecar descriptor carries stream details, one video and one audio stream
//! are described from them.

use std::path::Path;

use nf_core::id_hash;
use nf_library::{AudioDetails, Descriptor, VideoDetails};

use super::dto::{MediaSourceDto, MediaStreamDto, TICKS_PER_SECOND};

/// Build the single media source for `path`.
///
/// `item_id` is the external id used in the direct stream URL.
pub fn media_source(path: &Path, descriptor: Option<&Descriptor>, item_id: &str) -> MediaSourceDto {
    let path_str = path.to_string_lossy();
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());
    let hash = id_hash(&path_str);

    let mut source = MediaSourceDto {
        id: hash.clone(),
        etag: hash,
        name: basename.clone(),
        path: basename,
        source_type: "Default".into(),
        container: "mp4".into(),
        protocol: "File".into(),
        video_type: "VideoFile".into(),
        size: std::fs::metadata(path).ok().map(|m| m.len()),
        supports_transcoding: true,
        supports_direct_stream: true,
        supports_direct_play: true,
        supports_probing: true,
        direct_stream_url: Some(format!("/Videos/{item_id}/stream?static=true")),
        ..Default::default()
    };

    let Some(details) = descriptor.and_then(|d| d.stream_details.as_ref()) else {
        return source;
    };

    source.bitrate = Some(details.video.bitrate);
    source.run_time_ticks = Some(duration_ticks(details.video.duration_secs));

    let language: String = details.audio.language.chars().take(3).collect();
    let language = (!language.is_empty()).then_some(language);

    source.media_streams = vec![
        video_stream(&details.video, language.clone(), &path_str),
        audio_stream(&details.audio, language, &path_str),
    ];
    source
}

/// Runtime in protocol ticks.
pub fn duration_ticks(seconds: u64) -> i64 {
    i64::try_from(seconds)
        .unwrap_or(i64::MAX / TICKS_PER_SECOND)
        .saturating_mul(TICKS_PER_SECOND)
}

/// Normalized (codec, codec tag) for a descriptor video codec.
pub fn video_codec(codec: &str) -> (String, Option<&'static str>) {
    match codec.to_lowercase().as_str() {
        "x264" | "h264" => ("h264".into(), Some("avc1")),
        "hevc" => ("hevc".into(), Some("hvc1")),
        _ => (codec.to_string(), None),
    }
}

/// Normalized (codec, codec tag) for a descriptor audio codec.
pub fn audio_codec(codec: &str) -> (String, Option<&'static str>) {
    match codec.to_lowercase().as_str() {
        "ac3" => ("ac3".into(), Some("ac-3")),
        "aac" => ("aac".into(), Some("mp4a")),
        _ => (codec.to_string(), None),
    }
}

/// (title, layout) for a channel count.
fn channel_layout(channels: u32) -> Option<(&'static str, &'static str)> {
    match channels {
        2 => Some(("Stereo", "stereo")),
        6 => Some(("5.1 Channel", "5.1")),
        _ => None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn video_stream(video: &VideoDetails, language: Option<String>, file: &str) -> MediaStreamDto {
    let (codec, codec_tag) = video_codec(&video.codec);
    if codec_tag.is_none() {
        tracing::debug!(file, codec = %video.codec, "Unmapped video codec, passing through");
    }
    let frame_rate = round2(video.frame_rate);

    MediaStreamDto {
        stream_type: "Video".into(),
        index: 0,
        codec: Some(codec),
        codec_tag: codec_tag.map(String::from),
        language,
        time_base: "1/16000".into(),
        is_default: true,
        is_avc: codec_tag == Some("avc1"),
        width: Some(video.width),
        height: Some(video.height),
        average_frame_rate: Some(frame_rate),
        real_frame_rate: Some(frame_rate),
        bit_rate: Some(video.bitrate),
        ..Default::default()
    }
}

fn audio_stream(audio: &AudioDetails, language: Option<String>, file: &str) -> MediaStreamDto {
    let (codec, codec_tag) = audio_codec(&audio.codec);
    if codec_tag.is_none() {
        tracing::debug!(file, codec = %audio.codec, "Unmapped audio codec, passing through");
    }
    let layout = channel_layout(audio.channels);
    if layout.is_none() {
        tracing::debug!(file, channels = audio.channels, "Unmapped audio channel layout");
    }
    let title = layout.map(|(title, _)| title).unwrap_or_default();

    MediaStreamDto {
        stream_type: "Audio".into(),
        index: 1,
        display_title: Some(format!("{title} - {}", codec.to_uppercase())),
        codec: Some(codec),
        codec_tag: codec_tag.map(String::from),
        language,
        time_base: "1/48000".into(),
        title: layout.map(|(title, _)| title.to_string()),
        channel_layout: layout.map(|(_, l)| l.to_string()),
        channels: Some(audio.channels),
        bit_rate: Some(audio.bitrate),
        sample_rate: Some(48_000),
        audio_spatial_format: Some("None".into()),
        localized_default: Some("Default".into()),
        localized_external: Some("External".into()),
        is_default: true,
        ..Default::default()
    }
}
