/*!
Opaque handle to a stream's codec parameters.

Decoder construction needs the full `AVCodecParameters` block from the
demuxer, not just the fields the probe surfaces in stream info. This
wrapper carries that block from the source to the decode crate intact.
*/

use ffmpeg_next::codec;

/** Codec parameters of the bound stream, for building a decoder. */
#[derive(Clone)]
pub struct CodecConfig {
    pub(crate) parameters: codec::Parameters,
}

impl CodecConfig {
    pub(crate) fn new(parameters: codec::Parameters) -> Self {
        CodecConfig { parameters }
    }

    /** FFmpeg's identifier for the stream's codec. */
    pub fn codec_id(&self) -> codec::Id {
        self.parameters.id()
    }

    pub fn into_parameters(self) -> codec::Parameters {
        self.parameters
    }
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("codec_id", &self.parameters.id())
            .finish_non_exhaustive()
    }
}
