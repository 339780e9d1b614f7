/*!
Video encoding.

Wraps FFmpeg's send/receive encoder API. Input frames are canonical
copies; they are re-laid into codec-aligned storage before submission,
so the codec never touches caller-owned memory.

Timestamps: the encoder runs on the inverse of the configured frame
rate as its time base. A frame that carries a pts keeps it; a frame
without one is stamped with the running frame count, which yields
0, 1, 2, ... ticks for a straight constant-rate feed.
*/

use ffmpeg_next::codec;
use ffmpeg_next::ffi;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame;

use media_types::{
    CodecId, Error, FrameBuffer, MediaDuration, Packet, PixelFormat, Pts, Rational, Result,
    StreamKind, VideoFrame, VideoStreamInfo,
};

use crate::config::VideoEncoderConfig;
use crate::state::EncodeState;

/** Encoder for one video stream. */
pub struct VideoEncoder {
    encoder: ffmpeg_next::encoder::Video,
    config: VideoEncoderConfig,
    time_base: Rational,
    state: EncodeState,
    frame_count: i64,
}

impl VideoEncoder {
    /** Find, configure and open the codec named by `config`. */
    pub fn new(config: VideoEncoderConfig) -> Result<Self> {
        let codec_id = codec_id_to_ffmpeg(config.codec);
        let codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            Error::unsupported_format(format!("no encoder for codec {}", config.codec))
        })?;

        let mut builder = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| Error::encode(e.to_string()))?;

        let time_base = config.frame_rate.inverse();
        builder.set_width(config.width);
        builder.set_height(config.height);
        builder.set_format(pixel_format_to_ffmpeg(config.pixel_format));
        builder.set_frame_rate(Some(rational_to_ffmpeg(config.frame_rate)));
        builder.set_time_base(rational_to_ffmpeg(time_base));
        builder.set_gop(config.keyframe_interval);
        builder.set_bit_rate(config.bitrate as usize);
        if config.global_header {
            unsafe {
                (*builder.as_mut_ptr()).flags |= ffi::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = builder.open().map_err(|e| Error::encode(e.to_string()))?;

        Ok(VideoEncoder {
            encoder,
            config,
            time_base,
            state: EncodeState::Encoding,
            frame_count: 0,
        })
    }

    pub fn state(&self) -> EncodeState {
        self.state
    }

    /** Time base of the packets this encoder produces. */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn config(&self) -> &VideoEncoderConfig {
        &self.config
    }

    pub fn frames_sent(&self) -> i64 {
        self.frame_count
    }

    /** Description of the produced stream, for container setup. */
    pub fn stream_info(&self) -> VideoStreamInfo {
        let (extradata, bitrate, profile, level) =
            unsafe { context_details(self.encoder.as_ptr()) };
        VideoStreamInfo {
            width: self.config.width,
            height: self.config.height,
            pixel_format: self.config.pixel_format,
            frame_rate: Some(self.config.frame_rate),
            time_base: self.time_base,
            duration: None,
            codec_id: Some(self.config.codec),
            extradata,
            bitrate,
            profile,
            level,
        }
    }

    /**
    Submit one frame and collect whatever packets the codec releases.

    Fails with `Error::Encode` when the frame does not match the
    configured geometry or format, or once [`finish`](Self::finish)
    has been called.
    */
    pub fn encode(&mut self, frame: &VideoFrame) -> Result<Vec<Packet>> {
        if self.state != EncodeState::Encoding {
            return Err(Error::encode("encoder is finished and cannot accept frames"));
        }
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(Error::encode(format!(
                "frame is {}x{}, encoder expects {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }
        if frame.format != self.config.pixel_format {
            return Err(Error::encode(format!(
                "frame format {:?} does not match encoder format {:?}",
                frame.format, self.config.pixel_format
            )));
        }

        let mut submitted = frame::Video::new(
            pixel_format_to_ffmpeg(frame.format),
            frame.width,
            frame.height,
        );
        fill_from_canonical(&frame.buffer, &mut submitted)?;
        let pts = frame.pts.map_or(self.frame_count, |p| p.0);
        submitted.set_pts(Some(pts));
        self.frame_count += 1;

        let mut packets = Vec::new();
        match self.encoder.send_frame(&submitted) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                // Codec wants draining before it accepts more input.
                packets.extend(self.receive_all()?);
                self.encoder
                    .send_frame(&submitted)
                    .map_err(|e| Error::encode(e.to_string()))?;
            }
            Err(e) => return Err(Error::encode(e.to_string())),
        }
        packets.extend(self.receive_all()?);
        Ok(packets)
    }

    /**
    Flush the codec and return every remaining packet.

    Valid exactly once; a second call (or any later `encode`) fails
    with `Error::Encode`.
    */
    pub fn finish(&mut self) -> Result<Vec<Packet>> {
        if self.state != EncodeState::Encoding {
            return Err(Error::encode("encoder already flushed"));
        }
        self.state = EncodeState::Flushing;
        match self.encoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => {}
            Err(e) => return Err(Error::encode(e.to_string())),
        }
        let packets = self.receive_all()?;
        self.state = EncodeState::Done;
        Ok(packets)
    }

    fn receive_all(&mut self) -> Result<Vec<Packet>> {
        let mut packets = Vec::new();
        loop {
            let mut encoded = ffmpeg_next::Packet::empty();
            match self.encoder.receive_packet(&mut encoded) {
                Ok(()) => packets.push(self.convert_packet(&encoded)),
                Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => break,
                Err(ffmpeg_next::Error::Eof) => break,
                Err(e) => return Err(Error::encode(e.to_string())),
            }
        }
        Ok(packets)
    }

    fn convert_packet(&self, packet: &ffmpeg_next::Packet) -> Packet {
        Packet::new(
            packet.data().map(<[u8]>::to_vec).unwrap_or_default(),
            packet.pts().map(Pts),
            packet.dts().map(Pts),
            MediaDuration(packet.duration()),
            self.time_base,
            packet.is_key(),
            StreamKind::Video,
        )
    }
}

impl std::fmt::Debug for VideoEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoEncoder")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

/// Extradata, bitrate, profile and level out of an open codec
/// context. `ctx` must point at a live `AVCodecContext`.
pub(crate) unsafe fn context_details(
    ctx: *const ffi::AVCodecContext,
) -> (Option<Vec<u8>>, Option<u64>, Option<i32>, Option<i32>) {
    unsafe {
        let extradata = if (*ctx).extradata.is_null() || (*ctx).extradata_size <= 0 {
            None
        } else {
            Some(
                std::slice::from_raw_parts((*ctx).extradata, (*ctx).extradata_size as usize)
                    .to_vec(),
            )
        };
        let bitrate = if (*ctx).bit_rate > 0 {
            Some((*ctx).bit_rate as u64)
        } else {
            None
        };
        let profile = if (*ctx).profile == ffi::FF_PROFILE_UNKNOWN {
            None
        } else {
            Some((*ctx).profile)
        };
        let level = if (*ctx).level == ffi::FF_LEVEL_UNKNOWN {
            None
        } else {
            Some((*ctx).level)
        };
        (extradata, bitrate, profile, level)
    }
}

/// Canonical tight planes into a codec-aligned FFmpeg frame.
pub(crate) fn fill_from_canonical(buffer: &FrameBuffer, dst: &mut frame::Video) -> Result<()> {
    for plane in 0..buffer.plane_count() {
        let layout = buffer.layout(plane);
        let dst_stride = dst.stride(plane);
        if dst_stride < layout.stride {
            return Err(Error::invalid_data(format!(
                "plane {plane} stride {dst_stride} below row size {}",
                layout.stride
            )));
        }
        let src = buffer.plane(plane);
        let data = dst.data_mut(plane);
        for row in 0..layout.rows {
            let s = row * layout.stride;
            let d = row * dst_stride;
            data[d..d + layout.stride].copy_from_slice(&src[s..s + layout.stride]);
        }
    }
    Ok(())
}

pub(crate) fn codec_id_to_ffmpeg(codec: CodecId) -> codec::Id {
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

pub(crate) fn pixel_format_to_ffmpeg(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Yuv420p10Le => Pixel::YUV420P10LE,
        PixelFormat::Yuv420p10Be => Pixel::YUV420P10BE,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Bgra => Pixel::BGRA,
    }
}

pub(crate) fn rational_to_ffmpeg(r: Rational) -> ffmpeg_next::Rational {
    ffmpeg_next::Rational::new(r.num, r.den)
}
