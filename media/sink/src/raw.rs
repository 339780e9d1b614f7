/*!
Raw frame dumps.

Writes canonical frame buffers to a file back to back with no framing
or header. Because canonical buffers are tightly packed, the result is
exactly what raw-video and raw-audio tools expect: frame size times
frame count bytes, nothing else.
*/

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use media_types::{Error, FrameBuffer, Result};

/** Appends canonical frame bytes to a file. */
pub struct RawSink {
    writer: BufWriter<File>,
    path: PathBuf,
    frames_written: u64,
    bytes_written: u64,
}

impl RawSink {
    /** Create (or truncate) the dump file. */
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::output_open(path, e.to_string()))?;
        Ok(RawSink {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            frames_written: 0,
            bytes_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /** Append one frame's bytes. */
    pub fn write_frame(&mut self, buffer: &FrameBuffer) -> Result<()> {
        self.writer.write_all(buffer.as_bytes())?;
        self.frames_written += 1;
        self.bytes_written += buffer.len() as u64;
        Ok(())
    }

    /** Flush buffered bytes; consumes the sink. */
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for RawSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSink")
            .field("path", &self.path)
            .field("frames_written", &self.frames_written)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use media_types::{ChannelLayout, SampleFormat};

    #[test]
    fn frames_concatenate_without_framing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.pcm");

        let mut first = FrameBuffer::for_audio(SampleFormat::S16, 2, ChannelLayout::Mono);
        first.plane_mut(0).copy_from_slice(&[1, 2, 3, 4]);
        let mut second = FrameBuffer::for_audio(SampleFormat::S16, 1, ChannelLayout::Mono);
        second.plane_mut(0).copy_from_slice(&[5, 6]);

        let mut sink = RawSink::create(&path).unwrap();
        sink.write_frame(&first).unwrap();
        sink.write_frame(&second).unwrap();
        assert_eq!(sink.frames_written(), 2);
        assert_eq!(sink.bytes_written(), 6);
        sink.finish().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn unwritable_path_reports_output_open() {
        let err = RawSink::create("/nonexistent-dir/dump.yuv").unwrap_err();
        assert!(matches!(err, Error::OutputOpen { .. }));
    }
}
