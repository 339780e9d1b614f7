/*!
Container demuxing for the media pipeline.

[`MediaSource`] opens a local media file, binds to the best stream of
one kind (video or audio) and yields that stream's compressed packets
in demux order. Opening also probes the bound stream, so callers get a
full [`StreamInfo`](media_types::StreamInfo) and a [`CodecConfig`] for
decoder construction before the first packet is read.
*/

pub use media_types::{Error, Packet, Rational, Result, StreamKind};

mod codec_config;
mod convert;
mod probe;
mod source;

pub use codec_config::CodecConfig;
pub use source::MediaSource;
