use super::*;
use crate::foundation::core::Fps;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::NTSC_60,
    }
}

#[test]
fn config_validation_catches_bad_values() {
    assert!(validate_config(&cfg(0, 10)).is_err());
    assert!(validate_config(&cfg(11, 10)).is_err());
    assert!(
        validate_config(&SinkConfig {
            fps: Fps { num: 0, den: 1 },
            ..cfg(10, 10)
        })
        .is_err()
    );
    assert!(validate_config(&cfg(512, 512)).is_ok());
}

#[test]
fn args_carry_size_rate_and_output() {
    let opts = FfmpegSinkOpts::new("out/001-000 - x.mp4");
    let args: Vec<String> = ffmpeg_args(&cfg(512, 32), &opts)
        .into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(args[0], "-y");
    let pos = |s: &str| args.iter().position(|a| a == s).unwrap();
    assert_eq!(args[pos("-s") + 1], "512x32");
    assert_eq!(args[pos("-r") + 1], "60000/1001");
    assert!(pos("-r") < pos("-i"));
    assert_eq!(args.last().map(String::as_str), Some("out/001-000 - x.mp4"));
}

#[test]
fn args_refuse_overwrite_when_disabled() {
    let mut opts = FfmpegSinkOpts::new("a.mp4");
    opts.overwrite = false;
    let args = ffmpeg_args(&cfg(2, 2), &opts);
    assert_eq!(args[0], "-n");
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, src);
}

#[test]
fn flatten_premul_half_alpha_over_black() {
    let src = vec![128u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_rejects_length_mismatch() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg_to_opaque_rgba8(&mut dst, &[0; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn push_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("never.mp4"));
    let frame = FrameRGBA::new(2, 2);
    assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    assert!(sink.end().is_err());
}
