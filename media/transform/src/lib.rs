/*!
Frame transformation for the media pipeline.

Currently pixel format conversion and scaling of canonical video
frames via libswscale. Sits between decode and encode when the decoded
format differs from what the encoder was configured for.
*/

pub use media_types::{Error, PixelFormat, Result, VideoFrame};

mod video;

pub use video::{ScalingAlgorithm, VideoTransform, VideoTransformConfig};
