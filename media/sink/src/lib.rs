/*!
    Output side of the media pipeline.

    Two sinks, two jobs:

    * [`ContainerSink`] muxes encoded packets into a container file (AVI,
      MP4, MPEG-PS, WAV and anything else the installed libavformat can
      guess from the file name). Packet timestamps are rescaled to the
      muxer's stream time base on the way in.
    * [`RawSink`] dumps canonical frame buffers to a file byte for byte,
      with no container at all. Useful for raw YUV or PCM output that
      feeds straight into analysis tools or `ffplay`.
*/

mod container;
mod raw;

pub use container::ContainerSink;
pub use raw::RawSink;
