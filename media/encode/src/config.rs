/*!
Encoder configuration.

Builders follow the `with_*` convention: construct with the required
stream geometry, then override the defaults that matter. The video
defaults (4:2:0, 400 kbit/s, keyframe every 12 frames) suit short
standard-definition clips and match what the sample generators in the
application crate produce.
*/

use media_types::{ChannelLayout, CodecId, PixelFormat, Rational, SampleFormat};

/** Settings for a [`VideoEncoder`](crate::VideoEncoder). */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoEncoderConfig {
    pub codec: CodecId,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Rational,
    pub pixel_format: PixelFormat,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Distance between forced keyframes, in frames.
    pub keyframe_interval: u32,
    /// Ask the codec to put initialization data in `extradata` instead
    /// of the bitstream. Required by some containers (MP4, Matroska).
    pub global_header: bool,
}

impl VideoEncoderConfig {
    pub fn new(codec: CodecId, width: u32, height: u32, frame_rate: Rational) -> Self {
        VideoEncoderConfig {
            codec,
            width,
            height,
            frame_rate,
            pixel_format: PixelFormat::Yuv420p,
            bitrate: 400_000,
            keyframe_interval: 12,
            global_header: false,
        }
    }

    pub fn with_pixel_format(mut self, format: PixelFormat) -> Self {
        self.pixel_format = format;
        self
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn with_keyframe_interval(mut self, interval: u32) -> Self {
        self.keyframe_interval = interval;
        self
    }

    pub fn with_global_header(mut self, global_header: bool) -> Self {
        self.global_header = global_header;
        self
    }
}

/** Settings for an [`AudioEncoder`](crate::AudioEncoder). */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioEncoderConfig {
    pub codec: CodecId,
    pub sample_rate: u32,
    pub channels: ChannelLayout,
    /// Format of the interleaved input samples.
    pub sample_format: SampleFormat,
    /// Target bitrate in bits per second; `None` for codecs without
    /// rate control (PCM, lossless).
    pub bitrate: Option<u64>,
    pub global_header: bool,
}

impl AudioEncoderConfig {
    pub fn new(
        codec: CodecId,
        sample_rate: u32,
        channels: ChannelLayout,
        sample_format: SampleFormat,
    ) -> Self {
        AudioEncoderConfig {
            codec,
            sample_rate,
            channels,
            sample_format,
            bitrate: None,
            global_header: false,
        }
    }

    pub fn with_bitrate(mut self, bitrate: u64) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    pub fn with_global_header(mut self, global_header: bool) -> Self {
        self.global_header = global_header;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_defaults_match_the_sample_profile() {
        let config =
            VideoEncoderConfig::new(CodecId::Mpeg1Video, 352, 288, Rational::new(25, 1));
        assert_eq!(config.pixel_format, PixelFormat::Yuv420p);
        assert_eq!(config.bitrate, 400_000);
        assert_eq!(config.keyframe_interval, 12);
        assert!(!config.global_header);
    }

    #[test]
    fn builders_override_single_fields() {
        let config = VideoEncoderConfig::new(CodecId::Mpeg4, 640, 480, Rational::new(30, 1))
            .with_bitrate(1_200_000)
            .with_keyframe_interval(60)
            .with_global_header(true);
        assert_eq!(config.bitrate, 1_200_000);
        assert_eq!(config.keyframe_interval, 60);
        assert!(config.global_header);

        let audio = AudioEncoderConfig::new(
            CodecId::PcmS16Le,
            44_100,
            ChannelLayout::Stereo,
            SampleFormat::S16,
        );
        assert_eq!(audio.bitrate, None);
    }
}
