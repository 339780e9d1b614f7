/*!
Compressed packets as they move between demuxer, decoder, encoder and
muxer. A packet owns its payload bytes, so it stays valid after the
component that produced it moves on.
*/

use std::fmt;

use crate::{MediaDuration, Pts, Rational, StreamKind};

/** One compressed unit of the bound elementary stream. */
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    pub data: Vec<u8>,
    pub pts: Option<Pts>,
    pub dts: Option<Pts>,
    pub duration: MediaDuration,
    /// Time base the pts/dts/duration fields are expressed in.
    pub time_base: Rational,
    pub is_keyframe: bool,
    pub kind: StreamKind,
}

impl Packet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: Vec<u8>,
        pts: Option<Pts>,
        dts: Option<Pts>,
        duration: MediaDuration,
        time_base: Rational,
        is_keyframe: bool,
        kind: StreamKind,
    ) -> Self {
        Packet {
            data,
            pts,
            dts,
            duration,
            time_base,
            is_keyframe,
            kind,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Packet")
            .field("len", &self.data.len())
            .field("pts", &self.pts)
            .field("dts", &self.dts)
            .field("duration", &self.duration)
            .field("time_base", &self.time_base)
            .field("is_keyframe", &self.is_keyframe)
            .field("kind", &self.kind)
            .finish()
    }
}
