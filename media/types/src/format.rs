/*!
Pixel and sample format descriptors.

These enums cover the formats the pipeline can canonicalize into
tightly packed buffers. Anything outside this set is rejected at the
decode boundary with `Error::UnsupportedFormat` rather than carried
around half-supported.
*/

/** Pixel layout of a decoded video frame. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 8 bits per component.
    Yuv420p,
    /// Planar YUV 4:2:2, 8 bits per component.
    Yuv422p,
    /// Planar YUV 4:4:4, 8 bits per component.
    Yuv444p,
    /// Planar YUV 4:2:0, 10 bits in 16-bit little-endian words.
    Yuv420p10Le,
    /// Planar YUV 4:2:0, 10 bits in 16-bit big-endian words.
    Yuv420p10Be,
    /// Luma plane followed by one interleaved chroma plane.
    Nv12,
    /// Packed 8-bit RGB.
    Rgb24,
    /// Packed 8-bit BGR.
    Bgr24,
    /// Packed 8-bit RGBA.
    Rgba,
    /// Packed 8-bit BGRA.
    Bgra,
}

impl PixelFormat {
    /** Average storage bits per pixel across all planes. */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Yuv420p | PixelFormat::Nv12 => 12,
            PixelFormat::Yuv422p => 16,
            PixelFormat::Yuv444p => 24,
            PixelFormat::Yuv420p10Le | PixelFormat::Yuv420p10Be => 24,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => 24,
            PixelFormat::Rgba | PixelFormat::Bgra => 32,
        }
    }

    /** Bytes used to store one component of one sample. */
    pub const fn bytes_per_component(self) -> usize {
        match self {
            PixelFormat::Yuv420p10Le | PixelFormat::Yuv420p10Be => 2,
            _ => 1,
        }
    }

    pub const fn is_planar(self) -> bool {
        match self {
            PixelFormat::Yuv420p
            | PixelFormat::Yuv422p
            | PixelFormat::Yuv444p
            | PixelFormat::Yuv420p10Le
            | PixelFormat::Yuv420p10Be
            | PixelFormat::Nv12 => true,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 | PixelFormat::Rgba | PixelFormat::Bgra => {
                false
            }
        }
    }

    pub const fn plane_count(self) -> usize {
        match self {
            PixelFormat::Yuv420p
            | PixelFormat::Yuv422p
            | PixelFormat::Yuv444p
            | PixelFormat::Yuv420p10Le
            | PixelFormat::Yuv420p10Be => 3,
            PixelFormat::Nv12 => 2,
            PixelFormat::Rgb24 | PixelFormat::Bgr24 | PixelFormat::Rgba | PixelFormat::Bgra => 1,
        }
    }

    /** The raw-video format name tools like ffplay expect. */
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuv422p => "yuv422p",
            PixelFormat::Yuv444p => "yuv444p",
            PixelFormat::Yuv420p10Le => "yuv420p10le",
            PixelFormat::Yuv420p10Be => "yuv420p10be",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Bgra => "bgra",
        }
    }
}

/** Sample encoding of canonical (interleaved) audio data. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    U8,
    S16,
    S32,
    F32,
    F64,
}

impl SampleFormat {
    pub const fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S32 | SampleFormat::F32 => 4,
            SampleFormat::F64 => 8,
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::F32 | SampleFormat::F64)
    }

    /** The raw-audio format name tools like ffplay expect, assuming a little-endian host. */
    pub const fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16le",
            SampleFormat::S32 => "s32le",
            SampleFormat::F32 => "f32le",
            SampleFormat::F64 => "f64le",
        }
    }
}

/** Speaker layout of an audio stream. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    Mono,
    Stereo,
    Surround5_1,
    Surround7_1,
}

impl ChannelLayout {
    pub const fn channels(self) -> u32 {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
            ChannelLayout::Surround5_1 => 6,
            ChannelLayout::Surround7_1 => 8,
        }
    }

    /** Best-effort layout for a bare channel count. */
    pub const fn from_count(channels: u32) -> Self {
        match channels {
            1 => ChannelLayout::Mono,
            6 => ChannelLayout::Surround5_1,
            8 => ChannelLayout::Surround7_1,
            _ => ChannelLayout::Stereo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_format_geometry_is_consistent() {
        assert_eq!(PixelFormat::Yuv420p.bits_per_pixel(), 12);
        assert_eq!(PixelFormat::Rgba.bits_per_pixel(), 32);
        assert_eq!(PixelFormat::Yuv420p10Le.bytes_per_component(), 2);
        assert_eq!(PixelFormat::Nv12.bytes_per_component(), 1);
        assert!(PixelFormat::Yuv420p.is_planar());
        assert!(!PixelFormat::Bgra.is_planar());
        assert_eq!(PixelFormat::Yuv444p.plane_count(), 3);
        assert_eq!(PixelFormat::Nv12.plane_count(), 2);
        assert_eq!(PixelFormat::Rgb24.plane_count(), 1);
    }

    #[test]
    fn pixel_format_names_match_raw_video_conventions() {
        assert_eq!(PixelFormat::Yuv420p.name(), "yuv420p");
        assert_eq!(PixelFormat::Yuv420p10Le.name(), "yuv420p10le");
        assert_eq!(PixelFormat::Bgra.name(), "bgra");
    }

    #[test]
    fn sample_format_sizes() {
        assert_eq!(SampleFormat::U8.bytes_per_sample(), 1);
        assert_eq!(SampleFormat::S16.bytes_per_sample(), 2);
        assert_eq!(SampleFormat::F64.bytes_per_sample(), 8);
        assert!(SampleFormat::F32.is_float());
        assert!(!SampleFormat::S32.is_float());
        assert_eq!(SampleFormat::S16.name(), "s16le");
    }

    #[test]
    fn channel_layout_round_trips_counts() {
        for layout in [
            ChannelLayout::Mono,
            ChannelLayout::Stereo,
            ChannelLayout::Surround5_1,
            ChannelLayout::Surround7_1,
        ] {
            assert_eq!(ChannelLayout::from_count(layout.channels()), layout);
        }
        assert_eq!(ChannelLayout::from_count(3), ChannelLayout::Stereo);
    }
}
