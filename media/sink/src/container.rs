/*!
Container output.

[`ContainerSink`] owns one output container with one stream. Setup is
two-phase so the encoder and the container can negotiate: create the
sink first, ask it which codec the container prefers and whether it
wants global headers, open the encoder accordingly, then register the
encoder's stream description and write the header.

Timestamps are rescaled from each packet's own time base to whatever
time base the muxer settled on when the header was written, in exact
integer arithmetic. The trailer goes out in [`finish`](ContainerSink::finish),
which consumes the sink; dropping without `finish` still releases the
file handle but leaves the container unfinalized.
*/

use std::ffi::CString;
use std::path::{Path, PathBuf};

use ffmpeg_next::codec;
use ffmpeg_next::ffi;
use ffmpeg_next::format;
use ffmpeg_next::format::context;

use media_types::{
    AudioStreamInfo, CodecId, Error, Packet, Rational, Result, StreamKind, VideoStreamInfo,
};

/** Muxer for one stream into one output file. */
pub struct ContainerSink {
    output: context::Output,
    path: PathBuf,
    stream_index: Option<usize>,
    stream_kind: Option<StreamKind>,
    stream_time_base: Option<Rational>,
    header_written: bool,
    packets_written: u64,
}

impl ContainerSink {
    /**
    Create the output file, deducing the container from the file name.

    Names no muxer claims fall back to raw MPEG program stream, the
    most forgiving of the always-built containers; the fallback is
    logged. Fails with `Error::OutputOpen` when the file cannot be
    created.
    */
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ffmpeg_next::init().map_err(|e| Error::output_open(path, e.to_string()))?;

        let output = if format_known_for(path) {
            format::output(&path).map_err(|e| Error::output_open(path, e.to_string()))?
        } else {
            println!("[sink] could not deduce output format from file name, using mpeg");
            format::output_as(&path, "mpeg")
                .map_err(|e| Error::output_open(path, e.to_string()))?
        };

        Ok(ContainerSink {
            output,
            path: path.to_path_buf(),
            stream_index: None,
            stream_kind: None,
            stream_time_base: None,
            header_written: false,
            packets_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /** Short name of the muxer handling this container, e.g. `avi`. */
    pub fn container_name(&self) -> String {
        self.output.format().name().to_string()
    }

    pub fn packets_written(&self) -> u64 {
        self.packets_written
    }

    /** Whether the container wants codec initialization data out of band. */
    pub fn needs_global_header(&self) -> bool {
        unsafe {
            let oformat = (*self.output.as_ptr()).oformat;
            !oformat.is_null() && ((*oformat).flags & ffi::AVFMT_GLOBALHEADER as i32) != 0
        }
    }

    /** The codec this container defaults to for streams of `kind`. */
    pub fn default_codec(&self, kind: StreamKind) -> Option<CodecId> {
        unsafe {
            let oformat = (*self.output.as_ptr()).oformat;
            if oformat.is_null() {
                return None;
            }
            let id = match kind {
                StreamKind::Video => (*oformat).video_codec,
                StreamKind::Audio => (*oformat).audio_codec,
            };
            if id == ffi::AVCodecID::AV_CODEC_ID_NONE {
                return None;
            }
            codec_id_from_ffmpeg(codec::Id::from(id))
        }
    }

    /** Register the single video stream. Must precede the header. */
    pub fn add_video_stream(&mut self, info: &VideoStreamInfo) -> Result<()> {
        self.check_stream_slot()?;
        let codec_id = info
            .codec_id
            .ok_or_else(|| Error::invalid_data("stream info carries no codec id"))?;
        let codec = ffmpeg_next::encoder::find(codec_id_to_ffmpeg(codec_id));
        let mut stream = self
            .output
            .add_stream(codec)
            .map_err(|e| Error::container_write(e.to_string()))?;

        unsafe {
            let parameters = stream.parameters();
            let p = parameters.as_ptr() as *mut ffi::AVCodecParameters;
            (*p).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_VIDEO;
            (*p).codec_id = codec_id_to_ffmpeg(codec_id).into();
            (*p).width = info.width as i32;
            (*p).height = info.height as i32;
            (*p).format = pixel_format_to_ffmpeg(info.pixel_format) as i32;
            set_common_parameters(p, info.extradata.as_deref(), info.bitrate, info.profile)?;
            if let Some(level) = info.level {
                (*p).level = level;
            }
        }
        stream.set_time_base(rational_to_ffmpeg(info.time_base));

        self.stream_index = Some(stream.index());
        self.stream_kind = Some(StreamKind::Video);
        self.stream_time_base = Some(info.time_base);
        Ok(())
    }

    /** Register the single audio stream. Must precede the header. */
    pub fn add_audio_stream(&mut self, info: &AudioStreamInfo) -> Result<()> {
        self.check_stream_slot()?;
        let codec_id = info
            .codec_id
            .ok_or_else(|| Error::invalid_data("stream info carries no codec id"))?;
        let codec = ffmpeg_next::encoder::find(codec_id_to_ffmpeg(codec_id));
        let mut stream = self
            .output
            .add_stream(codec)
            .map_err(|e| Error::container_write(e.to_string()))?;

        unsafe {
            let parameters = stream.parameters();
            let p = parameters.as_ptr() as *mut ffi::AVCodecParameters;
            (*p).codec_type = ffi::AVMediaType::AVMEDIA_TYPE_AUDIO;
            (*p).codec_id = codec_id_to_ffmpeg(codec_id).into();
            (*p).sample_rate = info.sample_rate as i32;
            (*p).ch_layout.nb_channels = info.channels.channels() as i32;
            set_common_parameters(p, info.extradata.as_deref(), info.bitrate, info.profile)?;
        }
        stream.set_time_base(rational_to_ffmpeg(info.time_base));

        self.stream_index = Some(stream.index());
        self.stream_kind = Some(StreamKind::Audio);
        self.stream_time_base = Some(info.time_base);
        Ok(())
    }

    /**
    Write the container header. The muxer may adjust the stream's time
    base here; packet rescaling targets whatever it settled on.
    */
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Err(Error::container_write("header already written"));
        }
        if self.stream_index.is_none() {
            return Err(Error::invalid_data("no stream registered"));
        }
        self.output
            .write_header()
            .map_err(|e| Error::container_write(e.to_string()))?;
        self.header_written = true;

        if let Some(index) = self.stream_index {
            if let Some(stream) = self.output.stream(index) {
                self.stream_time_base = Some(rational_from_ffmpeg(stream.time_base()));
            }
        }
        Ok(())
    }

    /** Interleave one packet into the container. */
    pub fn write(&mut self, packet: &Packet) -> Result<()> {
        if !self.header_written {
            return Err(Error::container_write("packet before header"));
        }
        let (Some(index), Some(kind), Some(stream_tb)) =
            (self.stream_index, self.stream_kind, self.stream_time_base)
        else {
            return Err(Error::invalid_data("no stream registered"));
        };
        if packet.kind != kind {
            return Err(Error::invalid_data(format!(
                "{} packet written to {} sink",
                packet.kind, kind
            )));
        }

        let mut ff_packet = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };
        ff_packet.set_stream(index);
        ff_packet.set_pts(
            packet
                .pts
                .map(|p| Rational::rescale(p.0, packet.time_base, stream_tb)),
        );
        ff_packet.set_dts(
            packet
                .dts
                .map(|d| Rational::rescale(d.0, packet.time_base, stream_tb)),
        );
        ff_packet.set_duration(Rational::rescale(
            packet.duration.0,
            packet.time_base,
            stream_tb,
        ));
        if packet.is_keyframe {
            ff_packet.set_flags(ffmpeg_next::packet::Flags::KEY);
        }

        ff_packet
            .write_interleaved(&mut self.output)
            .map_err(|e| Error::container_write(e.to_string()))?;
        self.packets_written += 1;
        Ok(())
    }

    /** Flush interleaving buffers and write the trailer. */
    pub fn finish(mut self) -> Result<()> {
        if !self.header_written {
            return Err(Error::container_write("cannot finalize before header"));
        }
        self.output
            .write_trailer()
            .map_err(|e| Error::container_write(e.to_string()))
    }

    fn check_stream_slot(&self) -> Result<()> {
        if self.header_written {
            return Err(Error::container_write("streams must precede the header"));
        }
        if self.stream_index.is_some() {
            return Err(Error::invalid_data("sink already has a stream"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ContainerSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerSink")
            .field("path", &self.path)
            .field("stream_kind", &self.stream_kind)
            .field("header_written", &self.header_written)
            .field("packets_written", &self.packets_written)
            .finish_non_exhaustive()
    }
}

/// True when some muxer claims the file name.
fn format_known_for(path: &Path) -> bool {
    let Ok(name) = CString::new(path.to_string_lossy().as_bytes()) else {
        return false;
    };
    unsafe {
        !ffi::av_guess_format(std::ptr::null(), name.as_ptr(), std::ptr::null()).is_null()
    }
}

/// Fields shared by video and audio parameter blocks. `p` must point
/// at a live `AVCodecParameters`.
unsafe fn set_common_parameters(
    p: *mut ffi::AVCodecParameters,
    extradata: Option<&[u8]>,
    bitrate: Option<u64>,
    profile: Option<i32>,
) -> Result<()> {
    unsafe {
        if let Some(extradata) = extradata {
            let size = extradata.len();
            let buffer =
                ffi::av_mallocz(size + ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize) as *mut u8;
            if buffer.is_null() {
                return Err(Error::container_write("cannot allocate extradata"));
            }
            std::ptr::copy_nonoverlapping(extradata.as_ptr(), buffer, size);
            (*p).extradata = buffer;
            (*p).extradata_size = size as i32;
        }
        if let Some(bitrate) = bitrate {
            (*p).bit_rate = bitrate as i64;
        }
        if let Some(profile) = profile {
            (*p).profile = profile;
        }
    }
    Ok(())
}

fn rational_to_ffmpeg(r: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational::new(r.num, r.den)
}

fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

fn codec_id_to_ffmpeg(codec: CodecId) -> codec::Id {
    match codec {
        CodecId::H264 => codec::Id::H264,
        CodecId::H265 => codec::Id::HEVC,
        CodecId::Vp8 => codec::Id::VP8,
        CodecId::Vp9 => codec::Id::VP9,
        CodecId::Av1 => codec::Id::AV1,
        CodecId::Mpeg1Video => codec::Id::MPEG1VIDEO,
        CodecId::Mpeg2Video => codec::Id::MPEG2VIDEO,
        CodecId::Mpeg4 => codec::Id::MPEG4,
        CodecId::Aac => codec::Id::AAC,
        CodecId::Opus => codec::Id::OPUS,
        CodecId::Mp3 => codec::Id::MP3,
        CodecId::Vorbis => codec::Id::VORBIS,
        CodecId::Flac => codec::Id::FLAC,
        CodecId::Ac3 => codec::Id::AC3,
        CodecId::PcmS16Le => codec::Id::PCM_S16LE,
        CodecId::PcmS16Be => codec::Id::PCM_S16BE,
        CodecId::PcmF32Le => codec::Id::PCM_F32LE,
    }
}

fn codec_id_from_ffmpeg(id: codec::Id) -> Option<CodecId> {
    match id {
        codec::Id::H264 => Some(CodecId::H264),
        codec::Id::HEVC => Some(CodecId::H265),
        codec::Id::VP8 => Some(CodecId::Vp8),
        codec::Id::VP9 => Some(CodecId::Vp9),
        codec::Id::AV1 => Some(CodecId::Av1),
        codec::Id::MPEG1VIDEO => Some(CodecId::Mpeg1Video),
        codec::Id::MPEG2VIDEO => Some(CodecId::Mpeg2Video),
        codec::Id::MPEG4 => Some(CodecId::Mpeg4),
        codec::Id::AAC => Some(CodecId::Aac),
        codec::Id::OPUS => Some(CodecId::Opus),
        codec::Id::MP3 => Some(CodecId::Mp3),
        codec::Id::VORBIS => Some(CodecId::Vorbis),
        codec::Id::FLAC => Some(CodecId::Flac),
        codec::Id::AC3 => Some(CodecId::Ac3),
        codec::Id::PCM_S16LE => Some(CodecId::PcmS16Le),
        codec::Id::PCM_S16BE => Some(CodecId::PcmS16Be),
        codec::Id::PCM_F32LE => Some(CodecId::PcmF32Le),
        _ => None,
    }
}

fn pixel_format_to_ffmpeg(format: media_types::PixelFormat) -> ffi::AVPixelFormat {
    use media_types::PixelFormat;
    match format {
        PixelFormat::Yuv420p => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P,
        PixelFormat::Yuv422p => ffi::AVPixelFormat::AV_PIX_FMT_YUV422P,
        PixelFormat::Yuv444p => ffi::AVPixelFormat::AV_PIX_FMT_YUV444P,
        PixelFormat::Yuv420p10Le => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P10LE,
        PixelFormat::Yuv420p10Be => ffi::AVPixelFormat::AV_PIX_FMT_YUV420P10BE,
        PixelFormat::Nv12 => ffi::AVPixelFormat::AV_PIX_FMT_NV12,
        PixelFormat::Rgb24 => ffi::AVPixelFormat::AV_PIX_FMT_RGB24,
        PixelFormat::Bgr24 => ffi::AVPixelFormat::AV_PIX_FMT_BGR24,
        PixelFormat::Rgba => ffi::AVPixelFormat::AV_PIX_FMT_RGBA,
        PixelFormat::Bgra => ffi::AVPixelFormat::AV_PIX_FMT_BGRA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avi_defaults_to_mpeg4_without_global_headers() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ContainerSink::create(dir.path().join("out.avi")).unwrap();
        assert_eq!(sink.container_name(), "avi");
        assert_eq!(sink.default_codec(StreamKind::Video), Some(CodecId::Mpeg4));
        assert!(!sink.needs_global_header());
    }

    #[test]
    fn mp4_wants_global_headers() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ContainerSink::create(dir.path().join("out.mp4")).unwrap();
        assert!(sink.needs_global_header());
    }

    #[test]
    fn wav_defaults_to_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ContainerSink::create(dir.path().join("out.wav")).unwrap();
        assert_eq!(
            sink.default_codec(StreamKind::Audio),
            Some(CodecId::PcmS16Le)
        );
    }

    #[test]
    fn unknown_names_fall_back_to_mpeg() {
        let dir = tempfile::tempdir().unwrap();
        let sink = ContainerSink::create(dir.path().join("outfile")).unwrap();
        assert_eq!(sink.container_name(), "mpeg");
        assert_eq!(
            sink.default_codec(StreamKind::Video),
            Some(CodecId::Mpeg1Video)
        );
    }

    #[test]
    fn unwritable_path_reports_output_open() {
        let err = ContainerSink::create("/nonexistent-dir/out.avi").unwrap_err();
        assert!(matches!(err, Error::OutputOpen { .. }));
    }
}
