use super::*;

#[test]
fn mul_div255_rounds_to_nearest() {
    assert_eq!(mul_div255_u16(255, 255), 255);
    assert_eq!(mul_div255_u16(128, 255), 128);
    assert_eq!(mul_div255_u16(0, 200), 0);
    assert_eq!(mul_div255_u8(255, 128), 128);
}

#[test]
fn premultiply_scales_color_by_alpha() {
    let mut px = vec![255u8, 100, 0, 128, 9, 9, 9, 0, 1, 2, 3, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(&px[0..4], &[128, 50, 0, 128]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
    assert_eq!(&px[8..12], &[1, 2, 3, 255]);
}

#[test]
fn over_opaque_replaces_and_transparent_keeps() {
    let mut dst = [10u8, 20, 30, 255];
    premul_over_px(&mut dst, &[0, 0, 0, 0]);
    assert_eq!(dst, [10, 20, 30, 255]);
    premul_over_px(&mut dst, &[1, 2, 3, 255]);
    assert_eq!(dst, [1, 2, 3, 255]);
}

#[test]
fn over_half_alpha_blends() {
    let mut dst = [0u8, 0, 255, 255];
    premul_over_px(&mut dst, &[128, 0, 0, 128]);
    assert_eq!(dst, [128, 0, 127, 255]);
}
