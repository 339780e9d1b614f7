/*!
Video decoding.

Wraps FFmpeg's send/receive decoder API. Every frame handed out is a
canonical copy: the codec's reference-counted, stride-padded buffer is
copied row by row into a tightly packed [`FrameBuffer`] before the
caller sees it, so nothing the decoder later reuses or frees is ever
reachable from outside.
*/

use ffmpeg_next::codec;
use ffmpeg_next::ffi;
use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame;

use media_source::CodecConfig;
use media_types::{Error, FrameBuffer, Packet, PixelFormat, Pts, Rational, Result, VideoFrame};

/** Decoder for the video stream a source was opened with. */
pub struct VideoDecoder {
    decoder: ffmpeg_next::decoder::Video,
    time_base: Rational,
    eos_sent: bool,
}

impl VideoDecoder {
    /**
    Build a decoder from the codec parameters of a demuxed stream.

    `time_base` is the stream time base; decoded frames carry their
    timestamps in it.
    */
    pub fn new(config: CodecConfig, time_base: Rational) -> Result<Self> {
        let codec_id = config.codec_id();
        if ffmpeg_next::decoder::find(codec_id).is_none() {
            return Err(Error::decoder_unavailable(format!("{codec_id:?}")));
        }
        let context = codec::context::Context::from_parameters(config.into_parameters())
            .map_err(|e| Error::decoder_open(e.to_string()))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| Error::decoder_open(e.to_string()))?;

        Ok(VideoDecoder {
            decoder,
            time_base,
            eos_sent: false,
        })
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    /**
    Feed one packet and collect whatever frames the codec releases.

    Codecs with reorder delay may return nothing for several packets
    and several frames for one later packet, so the result is a batch.
    */
    pub fn decode(&mut self, packet: &Packet) -> Result<Vec<VideoFrame>> {
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
                // Codec wants draining before it accepts more input.
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
    pub fn receive_frame(&mut self) -> Result<Option<VideoFrame>> {
        let mut decoded = frame::Video::empty();
        match self.decoder.receive_frame(&mut decoded) {
            Ok(()) => Ok(Some(canonical_video_frame(&decoded, self.time_base)?)),
            Err(ffmpeg_next::Error::Other { errno }) if errno == ffi::EAGAIN => Ok(None),
            Err(ffmpeg_next::Error::Eof) => Ok(None),
            Err(e) => Err(Error::decode(e.to_string())),
        }
    }

    fn receive_all(&mut self) -> Result<Vec<VideoFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.receive_frame()? {
            frames.push(frame);
        }
        Ok(frames)
    }
}

impl std::fmt::Debug for VideoDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDecoder")
            .field("time_base", &self.time_base)
            .field("eos_sent", &self.eos_sent)
            .finish_non_exhaustive()
    }
}

/// Copies a codec-owned frame into tightly packed canonical storage.
fn canonical_video_frame(frame: &frame::Video, time_base: Rational) -> Result<VideoFrame> {
    let width = frame.width();
    let height = frame.height();
    if width == 0 || height == 0 {
        return Err(Error::invalid_data(format!(
            "decoded frame has invalid dimensions {width}x{height}"
        )));
    }
    let format = pixel_format_from_ffmpeg(frame.format()).ok_or_else(|| {
        Error::unsupported_format(format!("pixel format {:?}", frame.format()))
    })?;

    let mut buffer = FrameBuffer::for_video(format, width, height)?;
    for plane in 0..buffer.plane_count() {
        let layout = buffer.layout(plane);
        let src_stride = frame.stride(plane);
        if src_stride < layout.stride {
            return Err(Error::invalid_data(format!(
                "plane {plane} stride {src_stride} below row size {}",
                layout.stride
            )));
        }
        let src = frame.data(plane);
        let dst = buffer.plane_mut(plane);
        for row in 0..layout.rows {
            let s = row * src_stride;
            let d = row * layout.stride;
            dst[d..d + layout.stride].copy_from_slice(&src[s..s + layout.stride]);
        }
    }

    Ok(VideoFrame::new(
        buffer,
        width,
        height,
        format,
        frame.pts().map(Pts),
        time_base,
    ))
}

fn pixel_format_from_ffmpeg(format: Pixel) -> Option<PixelFormat> {
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

#[cfg(test)]
mod tests {
    use super::*;

    // Width chosen so FFmpeg pads rows: the luma stride for 60 pixels
    // is typically aligned up to 64.
    #[test]
    fn canonical_copy_strips_stride_padding() {
        let mut source = frame::Video::new(Pixel::YUV420P, 60, 48);
        for plane in 0..3 {
            let stride = source.stride(plane);
            let (row_bytes, rows) = if plane == 0 { (60, 48) } else { (30, 24) };
            let data = source.data_mut(plane);
            for row in 0..rows {
                for col in 0..row_bytes {
                    data[row * stride + col] = ((plane * 7 + row + col) % 251) as u8;
                }
            }
        }

        let frame = canonical_video_frame(&source, Rational::new(1, 25)).unwrap();
        assert_eq!(frame.width, 60);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.format, PixelFormat::Yuv420p);
        assert_eq!(frame.buffer.len(), 60 * 48 + 2 * (30 * 24));

        for plane in 0..3 {
            let layout = frame.buffer.layout(plane);
            let data = frame.buffer.plane(plane);
            for row in 0..layout.rows {
                for col in 0..layout.stride {
                    assert_eq!(
                        data[row * layout.stride + col],
                        ((plane * 7 + row + col) % 251) as u8,
                        "plane {plane} row {row} col {col}"
                    );
                }
            }
        }
    }

    #[test]
    fn packed_formats_canonicalize_to_one_plane() {
        let mut source = frame::Video::new(Pixel::RGB24, 33, 8);
        let stride = source.stride(0);
        let data = source.data_mut(0);
        for row in 0..8 {
            for col in 0..33 * 3 {
                data[row * stride + col] = ((row * 3 + col) % 256) as u8;
            }
        }

        let frame = canonical_video_frame(&source, Rational::new(1, 25)).unwrap();
        assert_eq!(frame.buffer.plane_count(), 1);
        assert_eq!(frame.buffer.layout(0).stride, 33 * 3);
        assert_eq!(frame.buffer.len(), 33 * 3 * 8);
        assert_eq!(frame.buffer.plane(0)[0], 0);
        assert_eq!(frame.buffer.plane(0)[33 * 3], 3);
    }
}
