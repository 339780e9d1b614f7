/*!
Video frame transformation.

Converts canonical frames between pixel formats and resolutions with
libswscale. The scaler context is built lazily from the first frame's
properties and rebuilt if the input geometry or format changes
mid-stream. Output frames are canonical copies; presentation metadata
passes through untouched.
*/

use ffmpeg_next::format::Pixel;
use ffmpeg_next::frame;
use ffmpeg_next::software::scaling::context::Context as ScalerContext;
use ffmpeg_next::software::scaling::flag::Flags;

use media_types::{Error, FrameBuffer, PixelFormat, Result, VideoFrame};

/** Interpolation used when resampling. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingAlgorithm {
    /// Nearest neighbor. Fastest, blocky under magnification.
    Nearest,
    /// Good speed/quality balance.
    #[default]
    Bilinear,
    /// Smoother than bilinear, a little slower.
    Bicubic,
    /// Highest quality of the set, slowest.
    Lanczos,
}

impl ScalingAlgorithm {
    fn to_flags(self) -> Flags {
        match self {
            ScalingAlgorithm::Nearest => Flags::POINT,
            ScalingAlgorithm::Bilinear => Flags::BILINEAR,
            ScalingAlgorithm::Bicubic => Flags::BICUBIC,
            ScalingAlgorithm::Lanczos => Flags::LANCZOS,
        }
    }
}

/** Target geometry and format for a [`VideoTransform`]. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTransformConfig {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub algorithm: ScalingAlgorithm,
}

impl VideoTransformConfig {
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        VideoTransformConfig {
            width,
            height,
            format,
            algorithm: ScalingAlgorithm::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: ScalingAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

struct ScalerState {
    context: ScalerContext,
    src_width: u32,
    src_height: u32,
    src_format: Pixel,
}

/** Reusable converter from arbitrary input frames to one target shape. */
pub struct VideoTransform {
    config: VideoTransformConfig,
    scaler: Option<ScalerState>,
}

impl VideoTransform {
    pub fn new(config: VideoTransformConfig) -> Self {
        VideoTransform {
            config,
            scaler: None,
        }
    }

    pub fn config(&self) -> VideoTransformConfig {
        self.config
    }

    /** Convert one frame to the configured shape. */
    pub fn transform(&mut self, frame: &VideoFrame) -> Result<VideoFrame> {
        if frame.width == 0 || frame.height == 0 {
            return Err(Error::invalid_data(format!(
                "cannot transform {}x{} frame",
                frame.width, frame.height
            )));
        }
        if frame.buffer.is_empty() {
            return Err(Error::invalid_data("cannot transform empty frame"));
        }

        let src_format = pixel_format_to_ffmpeg(frame.format);
        self.ensure_scaler(frame.width, frame.height, src_format)?;

        let mut src = frame::Video::new(src_format, frame.width, frame.height);
        fill_from_canonical(&frame.buffer, &mut src)?;

        let mut dst = frame::Video::new(
            pixel_format_to_ffmpeg(self.config.format),
            self.config.width,
            self.config.height,
        );

        let state = self
            .scaler
            .as_mut()
            .ok_or_else(|| Error::invalid_data("scaler missing after init"))?;
        state
            .context
            .run(&src, &mut dst)
            .map_err(|e| Error::invalid_data(format!("scale failed: {e}")))?;

        let mut buffer = FrameBuffer::for_video(self.config.format, self.config.width, self.config.height)?;
        canonical_from_ffmpeg(&dst, &mut buffer)?;

        Ok(VideoFrame::new(
            buffer,
            self.config.width,
            self.config.height,
            self.config.format,
            frame.pts,
            frame.time_base,
        ))
    }

    fn ensure_scaler(&mut self, width: u32, height: u32, format: Pixel) -> Result<()> {
        let up_to_date = self.scaler.as_ref().is_some_and(|s| {
            s.src_width == width && s.src_height == height && s.src_format == format
        });
        if up_to_date {
            return Ok(());
        }
        let context = ScalerContext::get(
            format,
            width,
            height,
            pixel_format_to_ffmpeg(self.config.format),
            self.config.width,
            self.config.height,
            self.config.algorithm.to_flags(),
        )
        .map_err(|e| Error::unsupported_format(format!("scaler rejected conversion: {e}")))?;
        self.scaler = Some(ScalerState {
            context,
            src_width: width,
            src_height: height,
            src_format: format,
        });
        Ok(())
    }
}

impl std::fmt::Debug for VideoTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoTransform")
            .field("config", &self.config)
            .field("scaler_ready", &self.scaler.is_some())
            .finish()
    }
}

fn pixel_format_to_ffmpeg(format: PixelFormat) -> Pixel {
    match format {
        PixelFormat::Yuv420p => Pixel::YUV420P,
        PixelFormat::Yuv422p => Pixel::YUV422P,
        PixelFormat::Yuv444p => Pixel::YUV444P,
        PixelFormat::Yuv420p10Le => Pixel::YUV420P10LE,
        PixelFormat::Yuv420p10Be => Pixel::YUV420P10BE,
        PixelFormat::Nv12 => Pixel::NV12,
        PixelFormat::Rgb24 => Pixel::RGB24,
        PixelFormat::Bgr24 => Pixel::BGR24,
        PixelFormat::Rgba => Pixel::RGBA,
        PixelFormat::Bgra => Pixel::BGRA,
    }
}

/// Canonical tight planes into a stride-padded FFmpeg frame.
fn fill_from_canonical(buffer: &FrameBuffer, dst: &mut frame::Video) -> Result<()> {
    for plane in 0..buffer.plane_count() {
        let layout = buffer.layout(plane);
        let dst_stride = dst.stride(plane);
        if dst_stride < layout.stride {
            return Err(Error::invalid_data(format!(
                "plane {plane} stride {dst_stride} below row size {}",
                layout.stride
            )));
        }
        let src = buffer.plane(plane);
        let data = dst.data_mut(plane);
        for row in 0..layout.rows {
            let s = row * layout.stride;
            let d = row * dst_stride;
            data[d..d + layout.stride].copy_from_slice(&src[s..s + layout.stride]);
        }
    }
    Ok(())
}

/// Stride-padded FFmpeg frame into canonical tight planes.
fn canonical_from_ffmpeg(src: &frame::Video, buffer: &mut FrameBuffer) -> Result<()> {
    for plane in 0..buffer.plane_count() {
        let layout = buffer.layout(plane);
        let src_stride = src.stride(plane);
        if src_stride < layout.stride {
            return Err(Error::invalid_data(format!(
                "plane {plane} stride {src_stride} below row size {}",
                layout.stride
            )));
        }
        let data = src.data(plane);
        let dst = buffer.plane_mut(plane);
        for row in 0..layout.rows {
            let s = row * src_stride;
            let d = row * layout.stride;
            dst[d..d + layout.stride].copy_from_slice(&data[s..s + layout.stride]);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::{Pts, Rational};

    fn gray_frame(width: u32, height: u32) -> VideoFrame {
        let mut buffer = FrameBuffer::for_video(PixelFormat::Yuv420p, width, height).unwrap();
        buffer.plane_mut(0).fill(128);
        buffer.plane_mut(1).fill(128);
        buffer.plane_mut(2).fill(128);
        VideoFrame::new(
            buffer,
            width,
            height,
            PixelFormat::Yuv420p,
            Some(Pts(7)),
            Rational::new(1, 25),
        )
    }

    #[test]
    fn converts_neutral_gray_to_matching_rgb() {
        let mut transform =
            VideoTransform::new(VideoTransformConfig::new(64, 48, PixelFormat::Rgb24));
        let out = transform.transform(&gray_frame(64, 48)).unwrap();

        assert_eq!(out.format, PixelFormat::Rgb24);
        assert_eq!(out.buffer.len(), 64 * 48 * 3);
        // Neutral chroma: R, G and B must agree, and mid gray stays mid.
        for px in out.buffer.plane(0).chunks_exact(3) {
            assert!(px[0].abs_diff(px[1]) <= 2, "pixel {px:?}");
            assert!(px[1].abs_diff(px[2]) <= 2, "pixel {px:?}");
            assert!((110..=150).contains(&px[0]), "pixel {px:?}");
        }
    }

    #[test]
    fn identity_conversion_preserves_bytes() {
        let mut transform = VideoTransform::new(
            VideoTransformConfig::new(64, 48, PixelFormat::Yuv420p)
                .with_algorithm(ScalingAlgorithm::Nearest),
        );
        let frame = gray_frame(64, 48);
        let out = transform.transform(&frame).unwrap();
        assert_eq!(out.buffer.as_bytes(), frame.buffer.as_bytes());
    }

    #[test]
    fn metadata_rides_through() {
        let mut transform =
            VideoTransform::new(VideoTransformConfig::new(32, 24, PixelFormat::Bgra));
        let out = transform.transform(&gray_frame(64, 48)).unwrap();
        assert_eq!(out.pts, Some(Pts(7)));
        assert_eq!(out.time_base, Rational::new(1, 25));
        assert_eq!((out.width, out.height), (32, 24));
    }

    #[test]
    fn scaler_rebuilds_when_input_shape_changes() {
        let mut transform =
            VideoTransform::new(VideoTransformConfig::new(64, 48, PixelFormat::Yuv420p));
        transform.transform(&gray_frame(64, 48)).unwrap();
        let out = transform.transform(&gray_frame(32, 24)).unwrap();
        assert_eq!((out.width, out.height), (64, 48));
    }
}
