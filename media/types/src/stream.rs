/*!
Descriptions of the stream a pipeline run is bound to, as probed from
an input container or reported by an open encoder.
*/

use std::time::Duration;

use crate::{ChannelLayout, CodecId, PixelFormat, Rational, SampleFormat, StreamKind};

/** Properties of a video elementary stream. */
#[derive(Debug, Clone, PartialEq)]
pub struct VideoStreamInfo {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// Declared frame rate, absent for streams that do not carry one.
    pub frame_rate: Option<Rational>,
    pub time_base: Rational,
    pub duration: Option<Duration>,
    /// None when the container uses a codec outside [`CodecId`].
    pub codec_id: Option<CodecId>,
    /// Codec initialization data (e.g. SPS/PPS), when present.
    pub extradata: Option<Vec<u8>>,
    pub bitrate: Option<u64>,
    pub profile: Option<i32>,
    pub level: Option<i32>,
}

impl VideoStreamInfo {
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.map(Rational::to_f64)
    }
}

/** Properties of an audio elementary stream. */
#[derive(Debug, Clone, PartialEq)]
pub struct AudioStreamInfo {
    pub sample_rate: u32,
    pub channels: ChannelLayout,
    pub sample_format: SampleFormat,
    pub time_base: Rational,
    pub duration: Option<Duration>,
    pub codec_id: Option<CodecId>,
    pub extradata: Option<Vec<u8>>,
    pub bitrate: Option<u64>,
    pub profile: Option<i32>,
}

impl AudioStreamInfo {
    pub fn channel_count(&self) -> u32 {
        self.channels.channels()
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.sample_format.bytes_per_sample()
    }
}

/** Info for whichever stream kind a source was opened with. */
#[derive(Debug, Clone, PartialEq)]
pub enum StreamInfo {
    Video(VideoStreamInfo),
    Audio(AudioStreamInfo),
}

impl StreamInfo {
    pub fn kind(&self) -> StreamKind {
        match self {
            StreamInfo::Video(_) => StreamKind::Video,
            StreamInfo::Audio(_) => StreamKind::Audio,
        }
    }

    pub fn video(&self) -> Option<&VideoStreamInfo> {
        match self {
            StreamInfo::Video(info) => Some(info),
            StreamInfo::Audio(_) => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioStreamInfo> {
        match self {
            StreamInfo::Audio(info) => Some(info),
            StreamInfo::Video(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_video_info() -> VideoStreamInfo {
        VideoStreamInfo {
            width: 352,
            height: 288,
            pixel_format: PixelFormat::Yuv420p,
            frame_rate: Some(Rational::new(25, 1)),
            time_base: Rational::new(1, 25),
            duration: Some(Duration::from_secs(10)),
            codec_id: Some(CodecId::Mpeg1Video),
            extradata: None,
            bitrate: Some(400_000),
            profile: None,
            level: None,
        }
    }

    #[test]
    fn fps_comes_from_the_declared_frame_rate() {
        let mut info = sample_video_info();
        assert_eq!(info.fps(), Some(25.0));
        info.frame_rate = None;
        assert_eq!(info.fps(), None);
    }

    #[test]
    fn audio_info_derives_sizes_from_formats() {
        let info = AudioStreamInfo {
            sample_rate: 44_100,
            channels: ChannelLayout::Stereo,
            sample_format: SampleFormat::S16,
            time_base: Rational::new(1, 44_100),
            duration: None,
            codec_id: Some(CodecId::PcmS16Le),
            extradata: None,
            bitrate: None,
            profile: None,
        };
        assert_eq!(info.channel_count(), 2);
        assert_eq!(info.bytes_per_sample(), 2);
    }

    #[test]
    fn stream_info_reports_its_kind() {
        let info = StreamInfo::Video(sample_video_info());
        assert_eq!(info.kind(), StreamKind::Video);
        assert!(info.video().is_some());
        assert!(info.audio().is_none());
    }
}
