/*!
Canonical frame storage.

Decoded frames are copied out of codec-owned memory into a
[`FrameBuffer`]: one contiguous allocation holding every plane back to
back, each plane tightly packed. "Tight" means a plane's stride equals
its row width times the bytes per component, with no alignment padding
between rows or planes. A buffer's geometry is described by its
[`PlaneLayout`] table, so consumers can walk planes without knowing the
pixel format's subsampling rules.

For audio the canonical form is interleaved: one plane, one row per
sample instant, each row holding every channel's sample.
*/

use std::fmt;

use crate::{ChannelLayout, Error, PixelFormat, Pts, Rational, Result, SampleFormat, StreamKind};

/** Location and shape of one plane inside a [`FrameBuffer`]. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Byte offset of the plane from the start of the buffer.
    pub offset: usize,
    /// Bytes per row. Always the tight value for the plane's width.
    pub stride: usize,
    /// Number of rows in the plane.
    pub rows: usize,
}

impl PlaneLayout {
    pub const fn len(&self) -> usize {
        self.stride * self.rows
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/** Tightly packed sample storage for one video or audio frame. */
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
    planes: Vec<PlaneLayout>,
}

impl FrameBuffer {
    /**
    Allocate a zeroed buffer for one video frame.

    Chroma plane dimensions round up, matching how codecs store frames
    with odd luma dimensions. Fails with `Error::InvalidData` when
    either dimension is zero.
    */
    pub fn for_video(format: PixelFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::invalid_data(format!(
                "video frame dimensions {width}x{height} are invalid"
            )));
        }
        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);
        let bpc = format.bytes_per_component();

        let geometry: &[(usize, usize)] = match format {
            PixelFormat::Yuv420p | PixelFormat::Yuv420p10Le | PixelFormat::Yuv420p10Be => {
                &[(w * bpc, h), (cw * bpc, ch), (cw * bpc, ch)]
            }
            PixelFormat::Yuv422p => &[(w, h), (cw, h), (cw, h)],
            PixelFormat::Yuv444p => &[(w, h), (w, h), (w, h)],
            PixelFormat::Nv12 => &[(w, h), (cw * 2, ch)],
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => &[(w * 3, h)],
            PixelFormat::Rgba | PixelFormat::Bgra => &[(w * 4, h)],
        };

        Ok(Self::from_geometry(geometry))
    }

    /** Allocate a zeroed buffer for interleaved audio samples. */
    pub fn for_audio(format: SampleFormat, samples: usize, channels: ChannelLayout) -> Self {
        let stride = channels.channels() as usize * format.bytes_per_sample();
        Self::from_geometry(&[(stride, samples)])
    }

    fn from_geometry(geometry: &[(usize, usize)]) -> Self {
        let mut planes = Vec::with_capacity(geometry.len());
        let mut offset = 0;
        for &(stride, rows) in geometry {
            planes.push(PlaneLayout {
                offset,
                stride,
                rows,
            });
            offset += stride * rows;
        }
        FrameBuffer {
            data: vec![0; offset],
            planes,
        }
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /** Layout of one plane. Panics if `index` is out of range. */
    pub fn layout(&self, index: usize) -> PlaneLayout {
        self.planes[index]
    }

    pub fn layouts(&self) -> &[PlaneLayout] {
        &self.planes
    }

    /** One plane's bytes. Panics if `index` is out of range. */
    pub fn plane(&self, index: usize) -> &[u8] {
        let layout = self.planes[index];
        &self.data[layout.offset..layout.offset + layout.len()]
    }

    pub fn plane_mut(&mut self, index: usize) -> &mut [u8] {
        let layout = self.planes[index];
        &mut self.data[layout.offset..layout.offset + layout.len()]
    }

    /** The whole allocation, planes back to back. */
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("len", &self.data.len())
            .field("planes", &self.planes)
            .finish_non_exhaustive()
    }
}

/** One decoded video frame in canonical storage. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub buffer: FrameBuffer,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Presentation time in `time_base` ticks, when the stream carried one.
    pub pts: Option<Pts>,
    pub time_base: Rational,
}

impl VideoFrame {
    pub fn new(
        buffer: FrameBuffer,
        width: u32,
        height: u32,
        format: PixelFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        VideoFrame {
            buffer,
            width,
            height,
            format,
            pts,
            time_base,
        }
    }
}

/** One decoded audio frame in canonical (interleaved) storage. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub buffer: FrameBuffer,
    /// Sample instants per channel in this frame.
    pub samples: usize,
    pub sample_rate: u32,
    pub channels: ChannelLayout,
    pub format: SampleFormat,
    pub pts: Option<Pts>,
    pub time_base: Rational,
}

impl AudioFrame {
    pub fn new(
        buffer: FrameBuffer,
        samples: usize,
        sample_rate: u32,
        channels: ChannelLayout,
        format: SampleFormat,
        pts: Option<Pts>,
        time_base: Rational,
    ) -> Self {
        AudioFrame {
            buffer,
            samples,
            sample_rate,
            channels,
            format,
            pts,
            time_base,
        }
    }
}

/** Either kind of decoded frame. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFrame {
    Video(VideoFrame),
    Audio(AudioFrame),
}

impl MediaFrame {
    pub fn kind(&self) -> StreamKind {
        match self {
            MediaFrame::Video(_) => StreamKind::Video,
            MediaFrame::Audio(_) => StreamKind::Audio,
        }
    }

    pub fn buffer(&self) -> &FrameBuffer {
        match self {
            MediaFrame::Video(frame) => &frame.buffer,
            MediaFrame::Audio(frame) => &frame.buffer,
        }
    }

    pub fn pts(&self) -> Option<Pts> {
        match self {
            MediaFrame::Video(frame) => frame.pts,
            MediaFrame::Audio(frame) => frame.pts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuv420_layout_is_tightly_packed() {
        let buffer = FrameBuffer::for_video(PixelFormat::Yuv420p, 352, 288).unwrap();
        assert_eq!(buffer.len(), 152_064);
        assert_eq!(buffer.plane_count(), 3);

        let y = buffer.layout(0);
        assert_eq!((y.offset, y.stride, y.rows), (0, 352, 288));
        let cb = buffer.layout(1);
        assert_eq!((cb.offset, cb.stride, cb.rows), (101_376, 176, 144));
        let cr = buffer.layout(2);
        assert_eq!((cr.offset, cr.stride, cr.rows), (126_720, 176, 144));
    }

    #[test]
    fn chroma_dimensions_round_up() {
        let buffer = FrameBuffer::for_video(PixelFormat::Yuv420p, 3, 3).unwrap();
        assert_eq!(buffer.layout(0).len(), 9);
        assert_eq!(buffer.layout(1).len(), 4);
        assert_eq!(buffer.len(), 17);
    }

    #[test]
    fn nv12_interleaves_chroma_into_one_plane() {
        let buffer = FrameBuffer::for_video(PixelFormat::Nv12, 352, 288).unwrap();
        assert_eq!(buffer.plane_count(), 2);
        assert_eq!(buffer.layout(1).stride, 352);
        assert_eq!(buffer.layout(1).rows, 144);
        assert_eq!(buffer.len(), 152_064);
    }

    #[test]
    fn packed_formats_use_a_single_plane() {
        let buffer = FrameBuffer::for_video(PixelFormat::Rgb24, 64, 48).unwrap();
        assert_eq!(buffer.plane_count(), 1);
        assert_eq!(buffer.layout(0).stride, 192);
        assert_eq!(buffer.len(), 9_216);
    }

    #[test]
    fn ten_bit_formats_double_the_component_size() {
        let buffer = FrameBuffer::for_video(PixelFormat::Yuv420p10Le, 352, 288).unwrap();
        assert_eq!(buffer.len(), 304_128);
        assert_eq!(buffer.layout(0).stride, 704);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            FrameBuffer::for_video(PixelFormat::Yuv420p, 0, 288),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            FrameBuffer::for_video(PixelFormat::Yuv420p, 352, 0),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn audio_layout_is_one_row_per_sample_instant() {
        let buffer = FrameBuffer::for_audio(SampleFormat::S16, 1_024, ChannelLayout::Stereo);
        assert_eq!(buffer.plane_count(), 1);
        assert_eq!(buffer.layout(0).stride, 4);
        assert_eq!(buffer.layout(0).rows, 1_024);
        assert_eq!(buffer.len(), 4_096);
    }

    #[test]
    fn plane_views_window_the_shared_allocation() {
        let mut buffer = FrameBuffer::for_video(PixelFormat::Yuv420p, 4, 4).unwrap();
        buffer.plane_mut(1).fill(0xAB);
        assert!(buffer.plane(0).iter().all(|&b| b == 0));
        assert!(buffer.plane(1).iter().all(|&b| b == 0xAB));
        let cb = buffer.layout(1);
        assert_eq!(buffer.as_bytes()[cb.offset], 0xAB);
        assert_eq!(buffer.as_bytes()[cb.offset - 1], 0);
    }
}
