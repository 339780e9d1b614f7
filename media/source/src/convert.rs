/*!
Mappings between FFmpeg's descriptors and the crate-local vocabulary.
*/

use ffmpeg_next::codec::Id;
use ffmpeg_next::format::{Pixel, Sample};

use media_types::{
    ChannelLayout, CodecId, MediaDuration, PixelFormat, Pts, Rational, SampleFormat,
};

pub(crate) fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

pub(crate) fn pixel_format_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
    match format {
        Pixel::YUV420P => Some(PixelFormat::Yuv420p),
        Pixel::YUV422P => Some(PixelFormat::Yuv422p),
        Pixel::YUV444P => Some(PixelFormat::Yuv444p),
        Pixel::YUV420P10LE => Some(PixelFormat::Yuv420p10Le),
        Pixel::YUV420P10BE => Some(PixelFormat::Yuv420p10Be),
        Pixel::NV12 => Some(PixelFormat::Nv12),
        Pixel::RGB24 => Some(PixelFormat::Rgb24),
        Pixel::BGR24 => Some(PixelFormat::Bgr24),
        Pixel::RGBA => Some(PixelFormat::Rgba),
        Pixel::BGRA => Some(PixelFormat::Bgra),
        _ => None,
    }
}

pub(crate) fn sample_format_from_ffmpeg(format: Sample) -> Option<SampleFormat> {
    match format {
        Sample::U8(_) => Some(SampleFormat::U8),
        Sample::I16(_) => Some(SampleFormat::S16),
        Sample::I32(_) => Some(SampleFormat::S32),
        Sample::F32(_) => Some(SampleFormat::F32),
        Sample::F64(_) => Some(SampleFormat::F64),
        _ => None,
    }
}

pub(crate) fn channel_layout_from_count(channels: u32) -> ChannelLayout {
    ChannelLayout::from_count(channels)
}

pub(crate) fn codec_id_from_ffmpeg(id: Id) -> Option<CodecId> {
    match id {
        Id::H264 => Some(CodecId::H264),
        Id::HEVC => Some(CodecId::H265),
        Id::VP8 => Some(CodecId::Vp8),
        Id::VP9 => Some(CodecId::Vp9),
        Id::AV1 => Some(CodecId::Av1),
        Id::MPEG1VIDEO => Some(CodecId::Mpeg1Video),
        Id::MPEG2VIDEO => Some(CodecId::Mpeg2Video),
        Id::MPEG4 => Some(CodecId::Mpeg4),
        Id::AAC => Some(CodecId::Aac),
        Id::OPUS => Some(CodecId::Opus),
        Id::MP3 => Some(CodecId::Mp3),
        Id::VORBIS => Some(CodecId::Vorbis),
        Id::FLAC => Some(CodecId::Flac),
        Id::AC3 => Some(CodecId::Ac3),
        Id::PCM_S16LE => Some(CodecId::PcmS16Le),
        Id::PCM_S16BE => Some(CodecId::PcmS16Be),
        Id::PCM_F32LE => Some(CodecId::PcmF32Le),
        _ => None,
    }
}

pub(crate) fn pts_from_ffmpeg(pts: Option<i64>) -> Option<Pts> {
    pts.map(Pts)
}

pub(crate) fn duration_from_ffmpeg(duration: i64) -> MediaDuration {
    MediaDuration(duration)
}
