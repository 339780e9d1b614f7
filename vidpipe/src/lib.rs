/*!
    Single-stream media pipeline.

    Pulls one stream (video or audio) out of an input file, decodes it
    into canonical frames, and either dumps those frames raw or routes
    them through conversion, re-encoding and muxing into a new
    container. The output file name decides which.
*/

pub mod pipeline;
pub mod synth;

pub use pipeline::{PipelineMode, RunSummary, run};
