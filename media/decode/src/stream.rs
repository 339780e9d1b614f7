/*!
Ordered frame delivery.

[`FrameStream`] owns a [`MediaSource`](media_source::MediaSource) and
the matching decoder and turns them into a single pull interface:
every call to [`FrameStream::next_frame`] produces the next canonical
frame of the bound stream, then `None` forever once the stream is
exhausted.

The stream moves through three states. While `Reading`, packets are
pulled from the source and fed to the codec. When the source runs dry
the codec is told exactly once that input ended and the stream enters
`Draining`, where each call asks the codec for one buffered frame.
The first drain request the codec cannot satisfy moves the stream to
`Done`, which is terminal.

Frames carry a sequence index counted from zero in emission order with
no gaps, plus an origin marking whether they were decoded from a
packet (`Fresh`) or recovered from codec delay after end of input
(`Drained`).
*/

use std::collections::VecDeque;

use media_source::MediaSource;
use media_types::{MediaFrame, Packet, Result, StreamInfo, StreamKind};

use crate::audio::AudioDecoder;
use crate::video::VideoDecoder;

/** Where a stream currently is between first packet and exhaustion. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Packets are still being pulled from the source.
    Reading,
    /// Input ended; buffered frames are being recovered from the codec.
    Draining,
    /// Terminal. Every frame has been delivered.
    Done,
}

/** How a frame left the decoder. */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOrigin {
    /// Produced while packets were still flowing.
    Fresh,
    /// Recovered from codec delay after end of input.
    Drained,
}

impl FrameOrigin {
    pub const fn is_drained(self) -> bool {
        matches!(self, FrameOrigin::Drained)
    }
}

/** One canonical frame with its position in the emission order. */
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub frame: MediaFrame,
    /// Zero-based, gap-free sequence index in emission order.
    pub index: u64,
    pub origin: FrameOrigin,
}

enum StreamDecoder {
    Video(VideoDecoder),
    Audio(AudioDecoder),
}

impl StreamDecoder {
    fn decode(&mut self, packet: &Packet) -> Result<Vec<MediaFrame>> {
        match self {
            StreamDecoder::Video(decoder) => Ok(decoder
                .decode(packet)?
                .into_iter()
                .map(MediaFrame::Video)
                .collect()),
            StreamDecoder::Audio(decoder) => Ok(decoder
                .decode(packet)?
                .into_iter()
                .map(MediaFrame::Audio)
                .collect()),
        }
    }

    fn signal_end(&mut self) -> Result<()> {
        match self {
            StreamDecoder::Video(decoder) => decoder.signal_end(),
            StreamDecoder::Audio(decoder) => decoder.signal_end(),
        }
    }

    fn receive_frame(&mut self) -> Result<Option<MediaFrame>> {
        match self {
            StreamDecoder::Video(decoder) => {
                Ok(decoder.receive_frame()?.map(MediaFrame::Video))
            }
            StreamDecoder::Audio(decoder) => {
                Ok(decoder.receive_frame()?.map(MediaFrame::Audio))
            }
        }
    }
}

/** Source and decoder fused into one ordered frame producer. */
pub struct FrameStream {
    source: MediaSource,
    decoder: StreamDecoder,
    state: DecodeState,
    next_index: u64,
    pending: VecDeque<MediaFrame>,
}

impl FrameStream {
    /** Build the decoder for the source's bound stream and wrap both. */
    pub fn new(source: MediaSource) -> Result<Self> {
        let decoder = match source.kind() {
            StreamKind::Video => StreamDecoder::Video(VideoDecoder::new(
                source.codec_config().clone(),
                source.time_base(),
            )?),
            StreamKind::Audio => StreamDecoder::Audio(AudioDecoder::new(
                source.codec_config().clone(),
                source.time_base(),
            )?),
        };
        Ok(FrameStream {
            source,
            decoder,
            state: DecodeState::Reading,
            next_index: 0,
            pending: VecDeque::new(),
        })
    }

    pub fn state(&self) -> DecodeState {
        self.state
    }

    pub fn kind(&self) -> StreamKind {
        self.source.kind()
    }

    pub fn info(&self) -> &StreamInfo {
        self.source.info()
    }

    /** Frames emitted so far; equals the next frame's index. */
    pub fn frames_emitted(&self) -> u64 {
        self.next_index
    }

    /**
    The next frame in stream order, or `None` once the stream is done.

    Errors are fatal: after an `Err` the stream should be dropped, not
    polled again.
    */
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(self.emit(frame, FrameOrigin::Fresh)));
            }
            match self.state {
                DecodeState::Reading => match self.source.next_packet()? {
                    Some(packet) => {
                        let frames = self.decoder.decode(&packet)?;
                        self.pending.extend(frames);
                    }
                    None => {
                        self.decoder.signal_end()?;
                        self.state = DecodeState::Draining;
                    }
                },
                DecodeState::Draining => match self.decoder.receive_frame()? {
                    Some(frame) => {
                        return Ok(Some(self.emit(frame, FrameOrigin::Drained)));
                    }
                    None => self.state = DecodeState::Done,
                },
                DecodeState::Done => return Ok(None),
            }
        }
    }

    fn emit(&mut self, frame: MediaFrame, origin: FrameOrigin) -> DecodedFrame {
        let index = self.next_index;
        self.next_index += 1;
        DecodedFrame {
            frame,
            index,
            origin,
        }
    }
}

impl Iterator for FrameStream {
    type Item = Result<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

impl std::fmt::Debug for FrameStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStream")
            .field("kind", &self.source.kind())
            .field("state", &self.state)
            .field("next_index", &self.next_index)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
