/*!
Pipeline driver.

Binds one stream of the input to one of two back ends chosen from the
output file name: a raw dump of canonical frames, or a decode,
convert, re-encode, mux chain into a fresh container. The input is
opened and probed before the output file is created, so a run that
fails at the source leaves nothing behind.
*/

use std::path::Path;

use media_decode::{DecodedFrame, FrameStream};
use media_encode::{AudioEncoder, AudioEncoderConfig, VideoEncoder, VideoEncoderConfig};
use media_sink::{ContainerSink, RawSink};
use media_source::MediaSource;
use media_transform::{VideoTransform, VideoTransformConfig};
use media_types::{
    CodecId, Error, MediaFrame, Pts, Rational, Result, SampleFormat, StreamInfo, StreamKind,
};

/// Container names whose extension marks an audio-only output.
const AUDIO_EXTENSIONS: &[&str] = &["wav", "wave", "mp3", "aac", "flac", "ogg", "oga", "opus", "m4a"];

/** What a run does with the decoded frames. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Decode video and append the canonical frame bytes to a file.
    DumpVideo,
    /// Decode audio and append the interleaved sample bytes to a file.
    DumpAudio,
    /// Decode, convert and re-encode into a container.
    Transcode(StreamKind),
}

impl PipelineMode {
    /**
    Pick the mode from the output file name.

    `.yuv` and `.raw` dump video, `.pcm` dumps audio. Audio container
    extensions transcode the audio stream; anything else transcodes
    the video stream.
    */
    pub fn from_output_path(path: &Path) -> PipelineMode {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "yuv" | "raw" => PipelineMode::DumpVideo,
            "pcm" => PipelineMode::DumpAudio,
            ext if AUDIO_EXTENSIONS.contains(&ext) => PipelineMode::Transcode(StreamKind::Audio),
            _ => PipelineMode::Transcode(StreamKind::Video),
        }
    }

    /** The stream kind this mode pulls from the input. */
    pub const fn stream_kind(self) -> StreamKind {
        match self {
            PipelineMode::DumpVideo => StreamKind::Video,
            PipelineMode::DumpAudio => StreamKind::Audio,
            PipelineMode::Transcode(kind) => kind,
        }
    }
}

/** Counters reported by a finished run. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub mode: PipelineMode,
    /// Frames decoded and delivered to the back end.
    pub frames: u64,
    /// Packets muxed into the container; zero for dumps.
    pub packets: u64,
    /// Bytes appended to the dump file; zero for transcodes.
    pub bytes: u64,
}

/**
Run the whole pipeline from `input` to `output`.

Frames flow one at a time; errors are fatal and abort the run with
whatever the sink holds at that point left on disk, except that a
source that fails to open or probe never creates the output at all.
*/
pub fn run(input: &Path, output: &Path) -> Result<RunSummary> {
    let mode = PipelineMode::from_output_path(output);
    let source = MediaSource::open(input, mode.stream_kind())?;
    print_banner(input, &source);

    let stream = FrameStream::new(source)?;
    match mode {
        PipelineMode::DumpVideo | PipelineMode::DumpAudio => run_dump(mode, stream, output),
        PipelineMode::Transcode(StreamKind::Video) => run_video_transcode(mode, stream, output),
        PipelineMode::Transcode(StreamKind::Audio) => run_audio_transcode(mode, stream, output),
    }
}

fn print_banner(input: &Path, source: &MediaSource) {
    match source.info() {
        StreamInfo::Video(info) => println!(
            "[pipeline] Opened '{}': {} video, {}x{} {}, {} fps",
            input.display(),
            codec_name(info.codec_id),
            info.width,
            info.height,
            info.pixel_format.name(),
            info.fps().unwrap_or(0.0),
        ),
        StreamInfo::Audio(info) => println!(
            "[pipeline] Opened '{}': {} audio, {} Hz, {} channels, {}",
            input.display(),
            codec_name(info.codec_id),
            info.sample_rate,
            info.channel_count(),
            info.sample_format.name(),
        ),
    }
}

fn codec_name(codec: Option<CodecId>) -> &'static str {
    codec.map_or("unknown", CodecId::name)
}

fn log_frame(decoded: &DecodedFrame) {
    let cached = if decoded.origin.is_drained() {
        "(cached)"
    } else {
        ""
    };
    match &decoded.frame {
        MediaFrame::Video(frame) => println!(
            "[pipeline] video_frame{cached} n:{} pts:{}",
            decoded.index,
            format_pts(frame.pts),
        ),
        MediaFrame::Audio(frame) => println!(
            "[pipeline] audio_frame{cached} n:{} nb_samples:{} pts:{}",
            decoded.index,
            frame.samples,
            format_pts(frame.pts),
        ),
    }
}

fn format_pts(pts: Option<Pts>) -> String {
    pts.map_or_else(|| "n/a".to_string(), |p| p.to_string())
}

fn run_dump(mode: PipelineMode, mut stream: FrameStream, output: &Path) -> Result<RunSummary> {
    let mut sink = RawSink::create(output)?;
    while let Some(decoded) = stream.next_frame()? {
        log_frame(&decoded);
        sink.write_frame(decoded.frame.buffer())?;
    }
    let summary = RunSummary {
        mode,
        frames: sink.frames_written(),
        packets: 0,
        bytes: sink.bytes_written(),
    };
    sink.finish()?;

    println!(
        "[pipeline] Dumped {} frames ({} bytes) to '{}'",
        summary.frames,
        summary.bytes,
        output.display(),
    );
    match stream.info() {
        StreamInfo::Video(info) => println!(
            "[pipeline] Play with: ffplay -f rawvideo -pix_fmt {} -video_size {}x{} '{}'",
            info.pixel_format.name(),
            info.width,
            info.height,
            output.display(),
        ),
        StreamInfo::Audio(info) => println!(
            "[pipeline] Play with: ffplay -f {} -ac {} -ar {} '{}'",
            info.sample_format.name(),
            info.channel_count(),
            info.sample_rate,
            output.display(),
        ),
    }
    Ok(summary)
}

fn run_video_transcode(
    mode: PipelineMode,
    mut stream: FrameStream,
    output: &Path,
) -> Result<RunSummary> {
    let Some(info) = stream.info().video().cloned() else {
        return Err(Error::invalid_data("stream info does not describe video"));
    };

    let mut sink = ContainerSink::create(output)?;
    let codec = sink.default_codec(StreamKind::Video).ok_or_else(|| {
        Error::unsupported_format(format!(
            "container '{}' has no default video codec",
            sink.container_name()
        ))
    })?;

    let frame_rate = info.frame_rate.unwrap_or(Rational::new(25, 1));
    let mut config = VideoEncoderConfig::new(codec, info.width, info.height, frame_rate);
    if sink.needs_global_header() {
        config = config.with_global_header(true);
    }

    let mut encoder = VideoEncoder::new(config)?;
    sink.add_video_stream(&encoder.stream_info())?;
    sink.write_header()?;
    let container = sink.container_name();

    let mut transform = VideoTransform::new(VideoTransformConfig::new(
        config.width,
        config.height,
        config.pixel_format,
    ));

    while let Some(decoded) = stream.next_frame()? {
        log_frame(&decoded);
        let MediaFrame::Video(frame) = &decoded.frame else {
            return Err(Error::invalid_data("decoder produced a non-video frame"));
        };
        let mut frame = if frame.width == config.width
            && frame.height == config.height
            && frame.format == config.pixel_format
        {
            frame.clone()
        } else {
            transform.transform(frame)?
        };
        // Re-stamp on the emission index so the encoder sees a clean
        // constant-rate timeline regardless of source timestamps.
        frame.pts = Some(Pts(decoded.index as i64));
        for packet in encoder.encode(&frame)? {
            sink.write(&packet)?;
        }
    }
    for packet in encoder.finish()? {
        sink.write(&packet)?;
    }

    let summary = RunSummary {
        mode,
        frames: stream.frames_emitted(),
        packets: sink.packets_written(),
        bytes: 0,
    };
    sink.finish()?;
    println!(
        "[pipeline] Wrote {} packets to '{}' ({} container, {} video)",
        summary.packets,
        output.display(),
        container,
        codec.name(),
    );
    Ok(summary)
}

fn run_audio_transcode(
    mode: PipelineMode,
    mut stream: FrameStream,
    output: &Path,
) -> Result<RunSummary> {
    let Some(info) = stream.info().audio().cloned() else {
        return Err(Error::invalid_data("stream info does not describe audio"));
    };

    let mut sink = ContainerSink::create(output)?;
    let codec = sink.default_codec(StreamKind::Audio).ok_or_else(|| {
        Error::unsupported_format(format!(
            "container '{}' has no default audio codec",
            sink.container_name()
        ))
    })?;
    // No resampler in the chain, so when the container defaults to
    // 16-bit PCM but the source decodes to float, switch to float PCM
    // rather than fail in the encoder.
    let codec = match (codec, info.sample_format) {
        (CodecId::PcmS16Le, SampleFormat::F32) => CodecId::PcmF32Le,
        (codec, _) => codec,
    };

    let mut config =
        AudioEncoderConfig::new(codec, info.sample_rate, info.channels, info.sample_format);
    if sink.needs_global_header() {
        config = config.with_global_header(true);
    }

    let mut encoder = AudioEncoder::new(config)?;
    sink.add_audio_stream(&encoder.stream_info())?;
    sink.write_header()?;
    let container = sink.container_name();

    while let Some(decoded) = stream.next_frame()? {
        log_frame(&decoded);
        let MediaFrame::Audio(frame) = &decoded.frame else {
            return Err(Error::invalid_data("decoder produced a non-audio frame"));
        };
        // Re-stamp from the running sample count the encoder keeps.
        let mut frame = frame.clone();
        frame.pts = None;
        for packet in encoder.encode(&frame)? {
            sink.write(&packet)?;
        }
    }
    for packet in encoder.finish()? {
        sink.write(&packet)?;
    }

    let summary = RunSummary {
        mode,
        frames: stream.frames_emitted(),
        packets: sink.packets_written(),
        bytes: 0,
    };
    sink.finish()?;
    println!(
        "[pipeline] Wrote {} packets to '{}' ({} container, {} audio)",
        summary.packets,
        output.display(),
        container,
        codec.name(),
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_follows_the_output_extension() {
        assert_eq!(
            PipelineMode::from_output_path(Path::new("out.yuv")),
            PipelineMode::DumpVideo
        );
        assert_eq!(
            PipelineMode::from_output_path(Path::new("out.RAW")),
            PipelineMode::DumpVideo
        );
        assert_eq!(
            PipelineMode::from_output_path(Path::new("out.pcm")),
            PipelineMode::DumpAudio
        );
        assert_eq!(
            PipelineMode::from_output_path(Path::new("out.wav")),
            PipelineMode::Transcode(StreamKind::Audio)
        );
        assert_eq!(
            PipelineMode::from_output_path(Path::new("out.mp4")),
            PipelineMode::Transcode(StreamKind::Video)
        );
        assert_eq!(
            PipelineMode::from_output_path(Path::new("noextension")),
            PipelineMode::Transcode(StreamKind::Video)
        );
    }

    #[test]
    fn mode_knows_its_stream_kind() {
        assert_eq!(PipelineMode::DumpVideo.stream_kind(), StreamKind::Video);
        assert_eq!(PipelineMode::DumpAudio.stream_kind(), StreamKind::Audio);
        assert_eq!(
            PipelineMode::Transcode(StreamKind::Audio).stream_kind(),
            StreamKind::Audio
        );
    }
}
