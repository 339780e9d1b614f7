/*!
    vidpipe: decode one stream from a media file, then dump it raw or
    re-encode it into a new container.

    Usage:
      vidpipe input.mp4 frames.yuv   # raw canonical video frames
      vidpipe input.mp4 tone.pcm     # raw interleaved audio samples
      vidpipe input.mp4 output.avi   # transcode video
      vidpipe input.mp4 output.wav   # transcode audio
*/

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/** Single-stream media transcoder and raw frame dumper. */
#[derive(Parser)]
#[command(name = "vidpipe")]
struct Cli {
    /// Input media file.
    input: PathBuf,

    /// Output file. The extension picks the mode: `.yuv`/`.raw` dump
    /// video frames, `.pcm` dumps audio samples, anything else
    /// transcodes into that container.
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    vidpipe::run(&cli.input, &cli.output)?;
    Ok(())
}
