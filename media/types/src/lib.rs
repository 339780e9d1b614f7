/*!
Shared vocabulary for the media pipeline crates.

Everything that crosses a crate boundary lives here: timestamps and
time bases, format descriptors, canonical frame storage, compressed
packets, stream descriptions and the common [`Error`] type. The crate
has no dependencies, so the vocabulary can be used (and unit tested)
without linking FFmpeg.

# Canonical frames

The pipeline's contract is that a decoded frame handed across a crate
boundary is always an owned, tightly packed copy. [`FrameBuffer`]
carries the bytes plus a per-plane layout table; [`VideoFrame`] and
[`AudioFrame`] pair a buffer with the metadata needed to interpret it.

# Time

Timestamps are integer tick counts relative to a [`Rational`] time
base. [`Rational::rescale`] converts tick counts between bases with
integer-only arithmetic.
*/

mod codec;
mod error;
mod format;
mod frame;
mod packet;
mod stream;
mod time;

pub use codec::{CodecId, StreamKind};
pub use error::{Error, Result};
pub use format::{ChannelLayout, PixelFormat, SampleFormat};
pub use frame::{AudioFrame, FrameBuffer, MediaFrame, PlaneLayout, VideoFrame};
pub use packet::Packet;
pub use stream::{AudioStreamInfo, StreamInfo, VideoStreamInfo};
pub use time::{MediaDuration, Pts, Rational};
