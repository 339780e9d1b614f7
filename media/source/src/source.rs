/*!
Demuxing.

[`MediaSource`] opens a container, binds to the best stream of the
requested kind and hands out that stream's packets in demux order.
Packets belonging to other streams are read and dropped; a source never
surfaces data from a stream it was not opened for.
*/

use std::path::Path;

use ffmpeg_next::format;
use ffmpeg_next::format::context::Input;
use ffmpeg_next::media;

use media_types::{
    AudioStreamInfo, Error, Packet, Rational, Result, StreamInfo, StreamKind, VideoStreamInfo,
};

use crate::codec_config::CodecConfig;
use crate::convert;
use crate::probe;

/** A demuxer bound to exactly one elementary stream. */
pub struct MediaSource {
    input: Input,
    kind: StreamKind,
    stream_index: usize,
    time_base: Rational,
    codec_config: CodecConfig,
    info: StreamInfo,
}

impl MediaSource {
    /**
    Open a container and bind to its best stream of `kind`.

    Fails with `Error::SourceOpen` when the file cannot be opened or
    probed, `Error::StreamNotFound` when no stream of the requested
    kind exists, and a decoder error when the stream's codec cannot be
    decoded on this build.
    */
    pub fn open(path: impl AsRef<Path>, kind: StreamKind) -> Result<Self> {
        let path = path.as_ref();
        ffmpeg_next::init().map_err(|e| Error::source_open(path, e.to_string()))?;

        let input =
            format::input(&path).map_err(|e| Error::source_open(path, e.to_string()))?;

        let media_type = match kind {
            StreamKind::Video => media::Type::Video,
            StreamKind::Audio => media::Type::Audio,
        };
        let container_duration_us = input.duration();

        let stream = input
            .streams()
            .best(media_type)
            .ok_or_else(|| Error::stream_not_found(kind))?;
        let stream_index = stream.index();
        let time_base = convert::rational_from_ffmpeg(stream.time_base());
        let info = match kind {
            StreamKind::Video => StreamInfo::Video(probe::video_info(&stream, container_duration_us)?),
            StreamKind::Audio => StreamInfo::Audio(probe::audio_info(&stream, container_duration_us)?),
        };
        let codec_config = CodecConfig::new(stream.parameters());

        Ok(MediaSource {
            input,
            kind,
            stream_index,
            time_base,
            codec_config,
            info,
        })
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /** Time base of the bound stream. */
    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn info(&self) -> &StreamInfo {
        &self.info
    }

    pub fn video_info(&self) -> Option<&VideoStreamInfo> {
        self.info.video()
    }

    pub fn audio_info(&self) -> Option<&AudioStreamInfo> {
        self.info.audio()
    }

    pub fn codec_config(&self) -> &CodecConfig {
        &self.codec_config
    }

    /** Short name of the demuxer handling this container, e.g. `avi`. */
    pub fn container_name(&self) -> String {
        self.input.format().name().to_string()
    }

    /**
    The next packet of the bound stream, or `None` at end of input.
    Packets from other streams are skipped.
    */
    pub fn next_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            let Some((stream, packet)) = self.input.packets().next() else {
                return Ok(None);
            };
            if stream.index() != self.stream_index {
                continue;
            }
            let data = packet.data().map(<[u8]>::to_vec).unwrap_or_default();
            return Ok(Some(Packet::new(
                data,
                convert::pts_from_ffmpeg(packet.pts()),
                convert::pts_from_ffmpeg(packet.dts()),
                convert::duration_from_ffmpeg(packet.duration()),
                self.time_base,
                packet.is_key(),
                self.kind,
            )));
        }
    }
}

impl Iterator for MediaSource {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_packet().transpose()
    }
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaSource")
            .field("kind", &self.kind)
            .field("stream_index", &self.stream_index)
            .field("time_base", &self.time_base)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_file_reports_source_open() {
        let err = MediaSource::open("/nonexistent/clip.mp4", StreamKind::Video).unwrap_err();
        match err {
            Error::SourceOpen { path, .. } => {
                assert_eq!(path, std::path::PathBuf::from("/nonexistent/clip.mp4"));
            }
            other => panic!("expected SourceOpen, got {other:?}"),
        }
    }
}
