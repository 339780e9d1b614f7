/*!
Audio decoding.

Same send/receive shape as the video decoder. Canonical audio is
interleaved: planar codec output is re-woven sample by sample so one
plane holds every channel, which is also the layout raw PCM dumps and
PCM encoders expect.
*/

use ffmpeg_next::codec;
use ffmpeg_next::ffi;
use ffmpeg_next::format::Sample;
use ffmpeg_next::frame;

use media_source::CodecConfig;
use media_types::{
    AudioFrame, ChannelLayout, Error, FrameBuffer, Packet, Pts, Rational, Result, SampleFormat,
};

/** Decoder for the audio stream a source was opened with. */
pub struct AudioDecoder {
    decoder: ffmpeg_next::decoder::Audio,
    time_base: Rational,
    eos_sent: bool,
}

impl AudioDecoder {
    pub fn new(config: CodecConfig, time_base: Rational) -> Result<Self> {
        let codec_id = config.codec_id();
        if ffmpeg_next::decoder::find(codec_id).is_none() {
            return Err(Error::decoder_unavailable(format!("{codec_id:?}")));
        }
        let context = codec::context::Context::from_parameters(config.into_parameters())
            .map_err(|e| Error::decoder_open(e.to_string()))?;
        let decoder = context
            .decoder()
            .audio()
            .map_err(|e| Error::decoder_open(e.to_string()))?;

        Ok(AudioDecoder {
            decoder,
            time_base,
            eos_sent: false,
        })
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /** Feed one packet and collect whatever frames the codec releases. */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<AudioFrame>> {
        let mut ff_packet = if packet.data.is_empty() {
            ffmpeg_next::Packet::empty()
        } else {
            ffmpeg_next::Packet::copy(&packet.data)
        };
        ff_packet.set_pts(packet.pts.map(|p| p.0));
        ff_packet.set_dts(packet.dts.map(|d| d.0));
        ff_packet.set_duration(packet.duration.0);

        let mut frames = Vec::new();
        match self.decoder.send_packet(&ff_packet) {
            Ok(()) => {}
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => {
                frames.extend(self.receive_all()?);
                self.decoder
                    .send_packet(&ff_packet)
                    .map_err(|e| Error::decode(e.to_string()))?;
            }
            Err(e) => return Err(Error::decode(e.to_string())),
        }
        frames.extend(self.receive_all()?);
        Ok(frames)
    }

    /** Tell the codec no more packets are coming. Idempotent. */
    pub fn signal_end(&mut self) -> Result<()> {
        if self.eos_sent {
            return Ok(());
        }
        self.eos_sent = true;
        match self.decoder.send_eof() {
            Ok(()) | Err(ffmpeg_next::Error::Eof) => Ok(()),
            Err(e) => Err(Error::decode(e.to_string())),
        }
    }

    /** One frame from the codec, or `None` when it has none to give. */
    pub fn receive_frame(&mut self) -> Result<Option<AudioFrame>> {
        let mut decoded = frame::Audio::empty();
        match self.decoder.receive_frame(&mut decoded) {
            Ok(()) => Ok(Some(canonical_audio_frame(&decoded, self.time_base)?)),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => Ok(None),
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(e) => Err(Error::decode(e.to_string())),
        }
    }

    fn receive_all(&mut self) -> Result<Vec<AudioFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.receive_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

impl std::fmt::Debug for AudioDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioDecoder")
            .field("time_base", &self.time_base)
            .field("eos_sent", &self.eos_sent)
            .finish_non_exhaustive()
    }
}

/// Copies a codec-owned frame into canonical interleaved storage.
fn canonical_audio_frame(frame: &frame::Audio, time_base: Rational) -> Result<AudioFrame> {
    let samples = frame.samples();
    if samples == 0 || frame.planes() == 0 {
        return Err(Error::invalid_data("decoded audio frame is empty"));
    }
    let format = sample_format_from_ffmpeg(frame.format()).ok_or_else(|| {
        Error::unsupported_format(format!("sample format {:?}", frame.format()))
    })?;
    let channels = u32::from(frame.channels());
    let layout = ChannelLayout::from_count(channels);
    if layout.channels() != channels {
        return Err(Error::unsupported_format(format!(
            "channel count {channels}"
        )));
    }

    let bytes_per_sample = format.bytes_per_sample();
    let mut buffer = FrameBuffer::for_audio(format, samples, layout);

    if frame.is_planar() && frame.planes() >= channels as usize {
        // One plane per channel; weave them into sample-major order.
        // linesize past plane 0 is zero for audio frames, so slice the
        // raw plane pointers at the computed plane length.
        let plane_len = samples * bytes_per_sample;
        let dst = buffer.plane_mut(0);
        for ch in 0..channels as usize {
            let src = unsafe {
                let ptr = (*frame.as_ptr()).data[ch];
                if ptr.is_null() {
                    return Err(Error::invalid_data(format!("audio plane {ch} is null")));
                }
                std::slice::from_raw_parts(ptr, plane_len)
            };
            for sample in 0..samples {
                let d = (sample * channels as usize + ch) * bytes_per_sample;
                let s = sample * bytes_per_sample;
                dst[d..d + bytes_per_sample].copy_from_slice(&src[s..s + bytes_per_sample]);
            }
        }
    } else {
        let expected = samples * channels as usize * bytes_per_sample;
        let src = frame.data(0);
        if src.len() < expected {
            return Err(Error::invalid_data(format!(
                "audio frame holds {} bytes, expected {expected}",
                src.len()
            )));
        }
        buffer.plane_mut(0).copy_from_slice(&src[..expected]);
    }

    Ok(AudioFrame::new(
        buffer,
        samples,
        frame.rate(),
        layout,
        format,
        frame.pts().map(Pts),
        time_base,
    ))
}

fn sample_format_from_ffmpeg(format: Sample) -> Option<SampleFormat> {
    match format {
        Sample::U8(_) => Some(SampleFormat::U8),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_next::ChannelLayout as FfChannelLayout;
    use ffmpeg_next::format::sample::Type;

    #[test]
    fn packed_frames_copy_straight_through() {
        let mut source = frame::Audio::new(Sample::I16(Type::Packed), 4, FfChannelLayout::STEREO);
        source.data_mut(0)[..16].copy_from_slice(&[
            1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0, 7, 0, 8, 0,
        ]);

        let frame = canonical_audio_frame(&source, Rational::new(1, 44_100)).unwrap();
        assert_eq!(frame.samples, 4);
        assert_eq!(frame.channels, ChannelLayout::Stereo);
        assert_eq!(frame.format, SampleFormat::S16);
        assert_eq!(frame.buffer.len(), 16);
        assert_eq!(
            frame.buffer.as_bytes(),
            &[1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0, 7, 0, 8, 0]
        );
    }

    #[test]
    fn planar_frames_interleave_per_sample() {
        let mut source = frame::Audio::new(Sample::I16(Type::Planar), 3, FfChannelLayout::STEREO);
        // Fill through the raw plane pointers, the same view the
        // canonical copy reads from.
        unsafe {
            let raw = source.as_mut_ptr();
            std::slice::from_raw_parts_mut((*raw).data[0], 6)
                .copy_from_slice(&[10, 0, 11, 0, 12, 0]);
            std::slice::from_raw_parts_mut((*raw).data[1], 6)
                .copy_from_slice(&[20, 0, 21, 0, 22, 0]);
        }

        let frame = canonical_audio_frame(&source, Rational::new(1, 44_100)).unwrap();
        assert_eq!(frame.buffer.len(), 12);
        assert_eq!(
            frame.buffer.as_bytes(),
            &[10, 0, 20, 0, 11, 0, 21, 0, 12, 0, 22, 0]
        );
    }
}
