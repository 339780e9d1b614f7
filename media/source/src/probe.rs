/*!
Stream probing.

Builds a [`VideoStreamInfo`] or [`AudioStreamInfo`] for the stream a
source is binding to. Dimensions and formats come from briefly opening
a decoder on the stream's parameters, which also proves up front that
the stream is actually decodable; sources with a stream we cannot
decode fail at open instead of at the first packet.
*/

use std::time::Duration;

use ffmpeg_next::codec;
use ffmpeg_next::ffi;
use ffmpeg_next::format::stream::Stream;

use media_types::{AudioStreamInfo, Error, Result, VideoStreamInfo};

use crate::convert;

pub(crate) fn video_info(stream: &Stream, container_duration_us: i64) -> Result<VideoStreamInfo> {
    let decoder = peek_decoder(stream)?
        .video()
        .map_err(|e| Error::decoder_open(e.to_string()))?;

    let pixel_format = convert::pixel_format_from_ffmpeg(decoder.format()).ok_or_else(|| {
        Error::unsupported_format(format!("pixel format {:?}", decoder.format()))
    })?;

    let frame_rate = declared_frame_rate(stream);
    let (extradata, bitrate, profile, level) = parameter_details(&stream.parameters());

    Ok(VideoStreamInfo {
        width: decoder.width(),
        height: decoder.height(),
        pixel_format,
        frame_rate,
        time_base: convert::rational_from_ffmpeg(stream.time_base()),
        duration: stream_duration(stream, container_duration_us),
        codec_id: convert::codec_id_from_ffmpeg(stream.parameters().id()),
        extradata,
        bitrate,
        profile,
        level,
    })
}

pub(crate) fn audio_info(stream: &Stream, container_duration_us: i64) -> Result<AudioStreamInfo> {
    let decoder = peek_decoder(stream)?
        .audio()
        .map_err(|e| Error::decoder_open(e.to_string()))?;

    let sample_format = convert::sample_format_from_ffmpeg(decoder.format()).ok_or_else(|| {
        Error::unsupported_format(format!("sample format {:?}", decoder.format()))
    })?;

    let (extradata, bitrate, profile, _) = parameter_details(&stream.parameters());

    Ok(AudioStreamInfo {
        sample_rate: decoder.rate(),
        channels: convert::channel_layout_from_count(u32::from(decoder.channels())),
        sample_format,
        time_base: convert::rational_from_ffmpeg(stream.time_base()),
        duration: stream_duration(stream, container_duration_us),
        codec_id: convert::codec_id_from_ffmpeg(stream.parameters().id()),
        extradata,
        bitrate,
        profile,
    })
}

/// Opens a short-lived decoder to read geometry the container headers
/// may not carry.
fn peek_decoder(stream: &Stream) -> Result<codec::decoder::Decoder> {
    let codec_id = stream.parameters().id();
    if ffmpeg_next::decoder::find(codec_id).is_none() {
        return Err(Error::decoder_unavailable(format!("{codec_id:?}")));
    }
    let context = codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| Error::decoder_open(e.to_string()))?;
    Ok(context.decoder())
}

fn declared_frame_rate(stream: &Stream) -> Option<media_types::Rational> {
    let avg = stream.avg_frame_rate();
    let rate = if avg.numerator() != 0 {
        avg
    } else {
        stream.rate()
    };
    if rate.numerator() != 0 && rate.denominator() != 0 {
        Some(convert::rational_from_ffmpeg(rate))
    } else {
        None
    }
}

fn stream_duration(stream: &Stream, container_duration_us: i64) -> Option<Duration> {
    let ticks = stream.duration();
    if ticks > 0 {
        let tb = convert::rational_from_ffmpeg(stream.time_base());
        let secs = ticks as f64 * tb.to_f64();
        if secs > 0.0 {
            return Some(Duration::from_secs_f64(secs));
        }
    }
    if container_duration_us > 0 {
        return Some(Duration::from_micros(container_duration_us as u64));
    }
    None
}

fn parameter_details(
    parameters: &codec::Parameters,
) -> (Option<Vec<u8>>, Option<u64>, Option<i32>, Option<i32>) {
    unsafe {
        let p = parameters.as_ptr();
        let extradata = if (*p).extradata.is_null() || (*p).extradata_size <= 0 {
            None
        } else {
            Some(std::slice::from_raw_parts((*p).extradata, (*p).extradata_size as usize).to_vec())
        };
        let bitrate = if (*p).bit_rate > 0 {
            Some((*p).bit_rate as u64)
        } else {
            None
        };
        let profile = if (*p).profile == ffi::FF_PROFILE_UNKNOWN {
            None
        } else {
            Some((*p).profile)
        };
        let level = if (*p).level == ffi::FF_LEVEL_UNKNOWN {
            None
        } else {
            Some((*p).level)
        };
        (extradata, bitrate, profile, level)
    }
}
