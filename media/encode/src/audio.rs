/*!
Audio encoding.

Input is canonical interleaved audio; the packed FFmpeg sample format
matching the configured [`SampleFormat`] is what the codec is opened
with, so submission is a single plane copy. Timestamps count samples:
a frame without a pts is stamped with the running sample total, on a
time base of one over the sample rate.
*/

use ffmpeg_next::codec;
use ffmpeg_next::ffi;
use ffmpeg_next::format::{Sample, sample::Type};
use ffmpeg_next::frame;

use media_types::{
    AudioFrame, AudioStreamInfo, ChannelLayout, Error, MediaDuration, Packet, Pts, Rational,
    Result, SampleFormat, StreamKind,
};

use crate::config::AudioEncoderConfig;
use crate::state::EncodeState;
use crate::video::{codec_id_to_ffmpeg, context_details, rational_to_ffmpeg};

/** Encoder for one audio stream. */
pub struct AudioEncoder {
    encoder: ffmpeg_next::encoder::Audio,
    config: AudioEncoderConfig,
    time_base: Rational,
    state: EncodeState,
    sample_count: i64,
}

impl AudioEncoder {
    /** Find, configure and open the codec named by `config`. */
    pub fn new(config: AudioEncoderConfig) -> Result<Self> {
        let codec_id = codec_id_to_ffmpeg(config.codec);
        let codec = ffmpeg_next::encoder::find(codec_id).ok_or_else(|| {
            Error::unsupported_format(format!("no encoder for codec {}", config.codec))
        })?;

        let mut builder = codec::context::Context::new_with_codec(codec)
            .encoder()
            .audio()
            .map_err(|e| Error::encode(e.to_string()))?;

        let time_base = Rational::new(1, config.sample_rate as i32);
        builder.set_format(sample_format_to_ffmpeg(config.sample_format));
        builder.set_rate(config.sample_rate as i32);
        builder.set_channel_layout(channel_layout_to_ffmpeg(config.channels));
        builder.set_time_base(rational_to_ffmpeg(time_base));
        if let Some(bitrate) = config.bitrate {
            builder.set_bit_rate(bitrate as usize);
        }
        if config.global_header {
            unsafe {
                (*builder.as_mut_ptr()).flags |= ffi::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = builder.open().map_err(|e| Error::encode(e.to_string()))?;

        Ok(AudioEncoder {
            encoder,
            config,
            time_base,
            state: EncodeState::Encoding,
            sample_count: 0,
        })
    }

    pub fn state(&self) -> EncodeState {
        self.state
    }

    /** Time base of the packets this encoder produces. */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn config(&self) -> &AudioEncoderConfig {
        &self.config
    }

    /**
    Samples per frame the codec insists on, or `None` when it accepts
    frames of any length (PCM does).
    */
    pub fn frame_size(&self) -> Option<usize> {
        match self.encoder.frame_size() {
            0 => None,
            size => Some(size as usize),
        }
    }

    /** Description of the produced stream, for container setup. */
    pub fn stream_info(&self) -> AudioStreamInfo {
        let (extradata, bitrate, profile, _) = unsafe { context_details(self.encoder.as_ptr()) };
        AudioStreamInfo {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            sample_format: self.config.sample_format,
            time_base: self.time_base,
            duration: None,
            codec_id: Some(self.config.codec),
            extradata,
            bitrate: bitrate.or(self.config.bitrate),
            profile,
        }
    }

    /**
    Submit one frame and collect whatever packets the codec releases.

    Fails with `Error::Encode` when the frame's format, layout or rate
    do not match the configuration, or once [`finish`](Self::finish)
    has been called.
    */
    pub fn encode(&mut self, frame: &AudioFrame) -> Result<Vec<Packet>> {
        if self.state != EncodeState::Encoding {
            return Err(Error::encode("encoder is finished and cannot accept frames"));
        }
        if frame.format != self.config.sample_format {
            return Err(Error::encode(format!(
                "frame format {:?} does not match encoder format {:?}",
                frame.format, self.config.sample_format
            )));
        }
        if frame.channels != self.config.channels {
            return Err(Error::encode(format!(
                "frame layout {:?} does not match encoder layout {:?}",
                frame.channels, self.config.channels
            )));
        }
        if frame.sample_rate != self.config.sample_rate {
            return Err(Error::encode(format!(
                "frame rate {} does not match encoder rate {}",
                frame.sample_rate, self.config.sample_rate
            )));
        }
        if frame.samples == 0 {
            return Err(Error::encode("cannot encode empty audio frame"));
        }

        let mut submitted = frame::Audio::new(
            sample_format_to_ffmpeg(frame.format),
            frame.samples,
            channel_layout_to_ffmpeg(frame.channels),
        );
        submitted.set_rate(frame.sample_rate);
        let bytes = frame.buffer.len();
        let plane = submitted.data_mut(0);
        if plane.len() < bytes {
            return Err(Error::invalid_data(format!(
                "codec frame holds {} bytes, need {bytes}",
                plane.len()
            )));
        }
        plane[..bytes].copy_from_slice(frame.buffer.as_bytes());
        let pts = frame.pts.map_or(self.sample_count, |p| p.0);
        submitted.set_pts(Some(pts));
        self.sample_count += frame.samples as i64;

        let mut packets = Vec::new();
        match self.encoder.send_frame(&submitted) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
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
            StreamKind::Audio,
        )
    }
}

impl std::fmt::Debug for AudioEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioEncoder")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("sample_count", &self.sample_count)
            .finish_non_exhaustive()
    }
}

fn sample_format_to_ffmpeg(format: SampleFormat) -> Sample {
    match format {
        SampleFormat::U8 => Sample::U8(Type::Packed),
        SampleFormat::S16 => Sample::I16(Type::Packed),
        SampleFormat::S32 => Sample::I32(Type::Packed),
        SampleFormat::F32 => Sample::F32(Type::Packed),
        SampleFormat::F64 => Sample::F64(Type::Packed),
    }
}

fn channel_layout_to_ffmpeg(layout: ChannelLayout) -> ffmpeg_next::ChannelLayout {
    match layout {
        ChannelLayout::Mono => ffmpeg_next::ChannelLayout::MONO,
        ChannelLayout::Stereo => ffmpeg_next::ChannelLayout::STEREO,
        ChannelLayout::Surround5_1 => ffmpeg_next::ChannelLayout::_5POINT1,
        ChannelLayout::Surround7_1 => ffmpeg_next::ChannelLayout::_7POINT1,
    }
}
