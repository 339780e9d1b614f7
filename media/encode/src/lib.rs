/*!
Encoding for the media pipeline.

[`VideoEncoder`] and [`AudioEncoder`] wrap FFmpeg's send/receive
encoder API behind the crate's canonical frame types. An encoder is
configured up front, accepts frames while running, and is flushed
exactly once at the end; the packets it emits are ready for a
container sink or any other consumer of compressed data.

# Lifecycle

Encoders move through the states in [`EncodeState`]: frames go in
while `Encoding`, [`finish`](VideoEncoder::finish) drains the codec's
delay and lands in `Done`. Calls after `finish` fail with
`Error::Encode` instead of silently corrupting the stream.

# Example

```ignore
use media_encode::{VideoEncoder, VideoEncoderConfig};
use media_types::{CodecId, Rational};

let config = VideoEncoderConfig::new(CodecId::Mpeg1Video, 352, 288, Rational::new(25, 1));
let mut encoder = VideoEncoder::new(config)?;
for frame in frames {
    for packet in encoder.encode(&frame)? {
        sink.write(&packet)?;
    }
}
for packet in encoder.finish()? {
    sink.write(&packet)?;
}
```

# Timestamps

A video encoder's time base is the inverse of its frame rate; an audio
encoder's is one over the sample rate. Frames that carry a pts keep
it, frames without one are stamped with a running frame or sample
count. Downstream rescaling to a container's time base is the sink's
job.
*/

pub use media_types::{
    AudioFrame, AudioStreamInfo, ChannelLayout, CodecId, Error, Packet, PixelFormat, Pts,
    Rational, Result, SampleFormat, VideoFrame, VideoStreamInfo,
};

mod audio;
mod config;
mod state;
mod video;

pub use audio::AudioEncoder;
pub use config::{AudioEncoderConfig, VideoEncoderConfig};
pub use state::EncodeState;
pub use video::VideoEncoder;
