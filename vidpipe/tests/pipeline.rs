/*!
End-to-end runs over small synthetic inputs: encode a sample file,
push it back through the pipeline, and check what lands on disk.
*/

use media_decode::{DecodeState, FrameOrigin, FrameStream};
use media_encode::{EncodeState, VideoEncoder, VideoEncoderConfig};
use media_source::MediaSource;
use media_types::{CodecId, Error, Rational, StreamKind};
use vidpipe::synth::{self, write_sample_audio, write_sample_video};
use vidpipe::{PipelineMode, run};

const FRAME_BYTES: u64 = 152_064; // 352x288 yuv420p

#[test]
fn raw_video_dump_is_tightly_packed() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.avi");
    write_sample_video(&input, 10).unwrap();

    let output = dir.path().join("frames.yuv");
    let summary = run(&input, &output).unwrap();

    assert_eq!(summary.mode, PipelineMode::DumpVideo);
    assert_eq!(summary.frames, 10);
    assert_eq!(summary.bytes, 10 * FRAME_BYTES);
    assert_eq!(std::fs::metadata(&output).unwrap().len(), 10 * FRAME_BYTES);
}

#[test]
fn rerunning_a_dump_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.avi");
    write_sample_video(&input, 5).unwrap();

    let output = dir.path().join("frames.yuv");
    run(&input, &output).unwrap();
    let first = std::fs::read(&output).unwrap();
    run(&input, &output).unwrap();
    let second = std::fs::read(&output).unwrap();

    assert_eq!(first.len() as u64, 5 * FRAME_BYTES);
    assert_eq!(first, second);
}

#[test]
fn frame_indices_count_up_without_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.avi");
    write_sample_video(&input, 10).unwrap();

    let source = MediaSource::open(&input, StreamKind::Video).unwrap();
    let mut stream = FrameStream::new(source).unwrap();
    let mut expected = 0;
    while let Some(decoded) = stream.next_frame().unwrap() {
        assert_eq!(decoded.index, expected);
        expected += 1;
    }

    assert_eq!(expected, 10);
    assert_eq!(stream.frames_emitted(), 10);
    assert_eq!(stream.state(), DecodeState::Done);
    assert!(stream.next_frame().unwrap().is_none());
}

#[test]
fn transcoding_preserves_frame_count() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.avi");
    write_sample_video(&input, 10).unwrap();

    let output = dir.path().join("copy.avi");
    let summary = run(&input, &output).unwrap();
    assert_eq!(summary.mode, PipelineMode::Transcode(StreamKind::Video));
    assert_eq!(summary.frames, 10);
    assert_eq!(summary.packets, 10);

    let source = MediaSource::open(&output, StreamKind::Video).unwrap();
    let stream = FrameStream::new(source).unwrap();
    let decoded: Result<Vec<_>, _> = stream.collect();
    assert_eq!(decoded.unwrap().len(), 10);
}

#[test]
fn rerunning_a_transcode_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.avi");
    write_sample_video(&input, 5).unwrap();

    let output = dir.path().join("copy.avi");
    run(&input, &output).unwrap();
    let first = std::fs::read(&output).unwrap();
    run(&input, &output).unwrap();
    let second = std::fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn missing_stream_kind_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_sample_audio(&input, 22_050, 22_050).unwrap();

    let output = dir.path().join("frames.yuv");
    let err = run(&input, &output).unwrap_err();

    assert!(matches!(
        err,
        Error::StreamNotFound {
            kind: StreamKind::Video
        }
    ));
    assert!(!output.exists());
}

#[test]
fn pcm_streams_deliver_everything_before_drain() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_sample_audio(&input, 22_050, 4_096).unwrap();

    let source = MediaSource::open(&input, StreamKind::Audio).unwrap();
    let mut stream = FrameStream::new(source).unwrap();
    let mut frames = 0;
    let mut samples = 0;
    while let Some(decoded) = stream.next_frame().unwrap() {
        // PCM buffers nothing, so the drain phase finds the codec empty.
        assert_eq!(decoded.origin, FrameOrigin::Fresh);
        if let media_types::MediaFrame::Audio(frame) = &decoded.frame {
            samples += frame.samples;
        }
        frames += 1;
    }

    assert!(frames > 0);
    assert_eq!(samples, 4_096);
    assert_eq!(stream.state(), DecodeState::Done);
}

#[test]
fn audio_dump_concatenates_every_sample() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tone.wav");
    write_sample_audio(&input, 22_050, 22_050).unwrap();

    let output = dir.path().join("tone.pcm");
    let summary = run(&input, &output).unwrap();

    // One second of mono s16: two bytes per sample.
    assert_eq!(summary.mode, PipelineMode::DumpAudio);
    assert_eq!(summary.bytes, 22_050 * 2);
    assert_eq!(std::fs::metadata(&output).unwrap().len(), 22_050 * 2);
}

#[test]
fn unknown_extension_falls_back_to_mpeg() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sample.avi");
    write_sample_video(&input, 10).unwrap();

    let output = dir.path().join("out.zzz");
    let summary = run(&input, &output).unwrap();
    assert_eq!(summary.frames, 10);

    let source = MediaSource::open(&output, StreamKind::Video).unwrap();
    let info = source.video_info().unwrap().clone();
    assert_eq!(info.codec_id, Some(CodecId::Mpeg1Video));
    assert_eq!((info.width, info.height), (352, 288));

    let stream = FrameStream::new(source).unwrap();
    let decoded: Result<Vec<_>, _> = stream.collect();
    assert_eq!(decoded.unwrap().len(), 10);
}

#[test]
fn encoder_stamps_sequential_pts() {
    let config = VideoEncoderConfig::new(CodecId::Mpeg4, 352, 288, Rational::new(25, 1));
    let mut encoder = VideoEncoder::new(config).unwrap();

    let mut packets = Vec::new();
    for index in 0..10 {
        let frame = synth::video_test_frame(index, 352, 288).unwrap();
        packets.extend(encoder.encode(&frame).unwrap());
    }
    packets.extend(encoder.finish().unwrap());

    assert_eq!(packets.len(), 10);
    assert_eq!(encoder.time_base(), Rational::new(1, 25));
    let last = packets.iter().filter_map(|p| p.pts).map(|p| p.0).max().unwrap();
    assert_eq!(last, 9);
    // On a 90 kHz mux clock that lands at 9 * 3600.
    assert_eq!(
        Rational::rescale(last, encoder.time_base(), Rational::new(1, 90_000)),
        32_400
    );
}

#[test]
fn finished_encoders_reject_further_input() {
    let config = VideoEncoderConfig::new(CodecId::Mpeg4, 352, 288, Rational::new(25, 1));
    let mut encoder = VideoEncoder::new(config).unwrap();
    let frame = synth::video_test_frame(0, 352, 288).unwrap();

    encoder.encode(&frame).unwrap();
    encoder.finish().unwrap();
    assert_eq!(encoder.state(), EncodeState::Done);
    assert!(matches!(encoder.finish(), Err(Error::Encode { .. })));
    assert!(matches!(encoder.encode(&frame), Err(Error::Encode { .. })));
}
