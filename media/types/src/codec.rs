/*!
Stream and codec identifiers.
*/

use std::fmt;

/** The kind of elementary stream a pipeline run binds to. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Video,
    Audio,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
        }
    }
}

/** Codecs the pipeline recognizes by name. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Mpeg1Video,
    Mpeg2Video,
    Mpeg4,
    Aac,
    Opus,
    Mp3,
    Vorbis,
    Flac,
    Ac3,
    PcmS16Le,
    PcmS16Be,
    PcmF32Le,
}

impl CodecId {
    pub const fn kind(self) -> StreamKind {
        match self {
            CodecId::H264
            | CodecId::H265
            | CodecId::Vp8
            | CodecId::Vp9
            | CodecId::Av1
            | CodecId::Mpeg1Video
            | CodecId::Mpeg2Video
            | CodecId::Mpeg4 => StreamKind::Video,
            CodecId::Aac
            | CodecId::Opus
            | CodecId::Mp3
            | CodecId::Vorbis
            | CodecId::Flac
            | CodecId::Ac3
            | CodecId::PcmS16Le
            | CodecId::PcmS16Be
            | CodecId::PcmF32Le => StreamKind::Audio,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            CodecId::H264 => "h264",
            CodecId::H265 => "hevc",
            CodecId::Vp8 => "vp8",
            CodecId::Vp9 => "vp9",
            CodecId::Av1 => "av1",
            CodecId::Mpeg1Video => "mpeg1video",
            CodecId::Mpeg2Video => "mpeg2video",
            CodecId::Mpeg4 => "mpeg4",
            CodecId::Aac => "aac",
            CodecId::Opus => "opus",
            CodecId::Mp3 => "mp3",
            CodecId::Vorbis => "vorbis",
            CodecId::Flac => "flac",
            CodecId::Ac3 => "ac3",
            CodecId::PcmS16Le => "pcm_s16le",
            CodecId::PcmS16Be => "pcm_s16be",
            CodecId::PcmF32Le => "pcm_f32le",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_kinds_split_video_from_audio() {
        assert_eq!(CodecId::Mpeg1Video.kind(), StreamKind::Video);
        assert_eq!(CodecId::H264.kind(), StreamKind::Video);
        assert_eq!(CodecId::PcmS16Le.kind(), StreamKind::Audio);
        assert_eq!(CodecId::Aac.kind(), StreamKind::Audio);
    }

    #[test]
    fn codec_names_use_ffmpeg_spelling() {
        assert_eq!(CodecId::H265.name(), "hevc");
        assert_eq!(CodecId::PcmF32Le.to_string(), "pcm_f32le");
    }
}
