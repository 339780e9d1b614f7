/*!
Synthetic media.

A moving YUV gradient and a sweeping sine tone, recognizable when the
output is played back. The integration tests encode these into small
container files and feed them back through the pipeline.
*/

use std::path::Path;

use media_encode::{AudioEncoder, AudioEncoderConfig, VideoEncoder, VideoEncoderConfig};
use media_sink::ContainerSink;
use media_types::{
    AudioFrame, ChannelLayout, Error, FrameBuffer, PixelFormat, Rational, Result, SampleFormat,
    StreamKind, VideoFrame,
};

pub const SAMPLE_WIDTH: u32 = 352;
pub const SAMPLE_HEIGHT: u32 = 288;
pub const SAMPLE_FRAME_RATE: Rational = Rational::new(25, 1);

/**
One frame of the moving gradient pattern.

Luma ramps diagonally and the two chroma planes ramp along opposite
axes; all three shift with `index`, so playback shows a drifting
color wash.
*/
pub fn video_test_frame(index: u64, width: u32, height: u32) -> Result<VideoFrame> {
    let mut buffer = FrameBuffer::for_video(PixelFormat::Yuv420p, width, height)?;
    let i = index as usize;

    let luma = buffer.layout(0);
    {
        let plane = buffer.plane_mut(0);
        for y in 0..luma.rows {
            for x in 0..luma.stride {
                plane[y * luma.stride + x] = (x + y + i * 3) as u8;
            }
        }
    }
    let chroma = buffer.layout(1);
    {
        let plane = buffer.plane_mut(1);
        for y in 0..chroma.rows {
            for x in 0..chroma.stride {
                plane[y * chroma.stride + x] = (128 + y + i * 2) as u8;
            }
        }
    }
    {
        let plane = buffer.plane_mut(2);
        for y in 0..chroma.rows {
            for x in 0..chroma.stride {
                plane[y * chroma.stride + x] = (64 + x + i * 5) as u8;
            }
        }
    }

    Ok(VideoFrame::new(
        buffer,
        width,
        height,
        PixelFormat::Yuv420p,
        None,
        SAMPLE_FRAME_RATE.inverse(),
    ))
}

/**
A 110 Hz sine tone whose frequency creeps upward.

The phase carries across calls, so consecutive frames splice together
without a click.
*/
pub struct ToneGenerator {
    t: f64,
    tincr: f64,
    tincr2: f64,
    sample_rate: u32,
    channels: ChannelLayout,
}

impl ToneGenerator {
    pub fn new(sample_rate: u32, channels: ChannelLayout) -> Self {
        let tincr = 2.0 * std::f64::consts::PI * 110.0 / f64::from(sample_rate);
        ToneGenerator {
            t: 0.0,
            tincr,
            tincr2: tincr / f64::from(sample_rate),
            sample_rate,
            channels,
        }
    }

    /** The next `samples` instants as a packed signed 16-bit frame. */
    pub fn next_frame(&mut self, samples: usize) -> AudioFrame {
        let mut buffer = FrameBuffer::for_audio(SampleFormat::S16, samples, self.channels);
        let channels = self.channels.channels() as usize;
        let data = buffer.plane_mut(0);
        for s in 0..samples {
            let value = ((self.t.sin() * 10_000.0) as i16).to_le_bytes();
            for ch in 0..channels {
                let at = (s * channels + ch) * 2;
                data[at] = value[0];
                data[at + 1] = value[1];
            }
            self.t += self.tincr;
            self.tincr += self.tincr2;
        }
        AudioFrame::new(
            buffer,
            samples,
            self.sample_rate,
            self.channels,
            SampleFormat::S16,
            None,
            Rational::new(1, self.sample_rate as i32),
        )
    }
}

/** Encode `frames` gradient frames into a fresh container at `path`. */
pub fn write_sample_video(path: impl AsRef<Path>, frames: u32) -> Result<()> {
    let path = path.as_ref();
    let mut sink = ContainerSink::create(path)?;
    let codec = sink.default_codec(StreamKind::Video).ok_or_else(|| {
        Error::unsupported_format(format!(
            "container '{}' has no default video codec",
            sink.container_name()
        ))
    })?;
    let mut config = VideoEncoderConfig::new(codec, SAMPLE_WIDTH, SAMPLE_HEIGHT, SAMPLE_FRAME_RATE);
    if sink.needs_global_header() {
        config = config.with_global_header(true);
    }

    let mut encoder = VideoEncoder::new(config)?;
    sink.add_video_stream(&encoder.stream_info())?;
    sink.write_header()?;

    for index in 0..frames {
        let frame = video_test_frame(u64::from(index), SAMPLE_WIDTH, SAMPLE_HEIGHT)?;
        for packet in encoder.encode(&frame)? {
            sink.write(&packet)?;
        }
    }
    for packet in encoder.finish()? {
        sink.write(&packet)?;
    }
    sink.finish()
}

/** Encode `samples` mono tone samples into a fresh container at `path`. */
pub fn write_sample_audio(path: impl AsRef<Path>, sample_rate: u32, samples: usize) -> Result<()> {
    let path = path.as_ref();
    let mut sink = ContainerSink::create(path)?;
    let codec = sink.default_codec(StreamKind::Audio).ok_or_else(|| {
        Error::unsupported_format(format!(
            "container '{}' has no default audio codec",
            sink.container_name()
        ))
    })?;
    let mut config =
        AudioEncoderConfig::new(codec, sample_rate, ChannelLayout::Mono, SampleFormat::S16);
    if sink.needs_global_header() {
        config = config.with_global_header(true);
    }

    let mut encoder = AudioEncoder::new(config)?;
    sink.add_audio_stream(&encoder.stream_info())?;
    sink.write_header()?;

    let chunk = encoder.frame_size().unwrap_or(1024);
    let mut tone = ToneGenerator::new(sample_rate, ChannelLayout::Mono);
    let mut remaining = samples;
    while remaining > 0 {
        let take = remaining.min(chunk);
        let frame = tone.next_frame(take);
        for packet in encoder.encode(&frame)? {
            sink.write(&packet)?;
        }
        remaining -= take;
    }
    for packet in encoder.finish()? {
        sink.write(&packet)?;
    }
    sink.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_pattern_shifts_with_the_frame_index() {
        let frame = video_test_frame(0, 8, 8).unwrap();
        assert_eq!(frame.buffer.plane(0)[0], 0);
        assert_eq!(frame.buffer.plane(0)[2 * 8 + 3], 5);
        assert_eq!(frame.buffer.plane(1)[0], 128);
        assert_eq!(frame.buffer.plane(2)[0], 64);

        let frame = video_test_frame(2, 8, 8).unwrap();
        assert_eq!(frame.buffer.plane(0)[0], 6);
        assert_eq!(frame.buffer.plane(1)[0], 132);
        assert_eq!(frame.buffer.plane(2)[0], 74);
    }

    #[test]
    fn tone_phase_carries_across_frames() {
        let mut split = ToneGenerator::new(22_050, ChannelLayout::Mono);
        let first = split.next_frame(4);
        let second = split.next_frame(4);

        let mut whole = ToneGenerator::new(22_050, ChannelLayout::Mono);
        let both = whole.next_frame(8);

        let mut joined = first.buffer.as_bytes().to_vec();
        joined.extend_from_slice(second.buffer.as_bytes());
        assert_eq!(joined, both.buffer.as_bytes());
    }

    #[test]
    fn tone_duplicates_samples_across_channels() {
        let mut tone = ToneGenerator::new(22_050, ChannelLayout::Stereo);
        let frame = tone.next_frame(16);
        let bytes = frame.buffer.as_bytes();
        for s in 0..16 {
            let at = s * 4;
            assert_eq!(bytes[at..at + 2], bytes[at + 2..at + 4]);
        }
    }
}
