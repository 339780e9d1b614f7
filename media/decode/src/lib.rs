/*!
Decoding for the media pipeline.

Two layers live here. [`VideoDecoder`] and [`AudioDecoder`] wrap
FFmpeg's send/receive codec API and canonicalize every frame into
owned, tightly packed storage. [`FrameStream`] sits on top, fusing a
[`MediaSource`](media_source::MediaSource) with the matching decoder
into one ordered producer of [`DecodedFrame`]s.

# Example

```ignore
use media_decode::FrameStream;
use media_source::MediaSource;
use media_types::StreamKind;

let source = MediaSource::open("input.avi", StreamKind::Video)?;
let mut stream = FrameStream::new(source)?;
while let Some(decoded) = stream.next_frame()? {
    println!("frame {} ({} bytes)", decoded.index, decoded.frame.buffer().len());
}
```
*/

pub use media_types::{
    AudioFrame, Error, FrameBuffer, MediaFrame, Packet, PixelFormat, Pts, Rational, Result,
    SampleFormat, StreamKind, VideoFrame,
};

mod audio;
mod stream;
mod video;

pub use audio::AudioDecoder;
pub use stream::{DecodeState, DecodedFrame, FrameOrigin, FrameStream};
pub use video::VideoDecoder;
