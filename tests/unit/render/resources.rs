use std::io::Cursor;

use super::*;

fn write_png(path: &Path, w: u32, h: u32) {
    let mut img = image::RgbaImage::from_pixel(w, h, image::Rgba([0, 0, 0, 0]));
    // Mark the top row so flips are observable.
    for x in 0..w {
        img.put_pixel(x, 0, image::Rgba([255, 0, 0, 255]));
    }
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, buf).unwrap();
}

fn resource_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gpsmap-res-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    write_png(&dir.join(DOT_FILE), 32, 32);
    write_png(&dir.join(START_PIN_FILE), 90, 128);
    write_png(&dir.join(FINISH_PIN_FILE), 90, 128);
    write_png(&dir.join(ARROW_FILE), 64, 64);
    std::fs::write(
        dir.join(MAP_DESCRIPTOR_FILE),
        "<map><url>https://example.org/$z/$x/$y.png</url></map>",
    )
    .unwrap();
    std::fs::write(dir.join(FONT_FILE), b"font bytes").unwrap();
    dir
}

#[test]
fn loads_and_resizes_markers() {
    let dir = resource_dir("ok");
    let res = Resources::load(&dir).unwrap();
    assert_eq!((res.dot().width, res.dot().height), (16, 16));
    assert_eq!((res.start_pin().width, res.start_pin().height), (45, 64));
    assert_eq!((res.finish_pin().width, res.finish_pin().height), (45, 64));
    assert_eq!(res.font_bytes(), b"font bytes");
    assert!(res.map_descriptor().ends_with(MAP_DESCRIPTOR_FILE));

    // The start pin keeps its marked row on top; the finish pin has it at the bottom.
    assert!(res.start_pin().pixel(20, 0).unwrap()[3] > 0);
    assert!(res.finish_pin().pixel(20, 63).unwrap()[3] > 0);
    assert_eq!(res.finish_pin().pixel(20, 0).unwrap()[3], 0);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn any_missing_file_fails() {
    for name in [
        DOT_FILE,
        START_PIN_FILE,
        FINISH_PIN_FILE,
        ARROW_FILE,
        MAP_DESCRIPTOR_FILE,
        FONT_FILE,
    ] {
        let dir = resource_dir(&format!("missing-{}", name.replace('.', "_")));
        std::fs::remove_file(dir.join(name)).unwrap();
        let err = Resources::load(&dir).unwrap_err();
        assert!(err.to_string().contains(name), "{name}: {err}");
        std::fs::remove_dir_all(&dir).ok();
    }
}

#[test]
fn missing_directory_fails() {
    let dir = std::env::temp_dir().join("gpsmap-res-nowhere-xyz");
    let _ = std::fs::remove_dir_all(&dir);
    assert!(Resources::load(&dir).is_err());
}

#[test]
fn arrows_are_cached_per_whole_degree() {
    let dir = resource_dir("arrows");
    let res = Resources::load(&dir).unwrap();
    let mut raster = Rasterizer::new();

    let a = res.arrow(&mut raster, 359.7).unwrap();
    let b = res.arrow(&mut raster, 359.2).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!((a.width, a.height), (96, 96));

    let zero = res.arrow(&mut raster, 0.0).unwrap();
    let full = res.arrow(&mut raster, 360.0).unwrap();
    assert!(Arc::ptr_eq(&zero, &full));
    assert_eq!(res.cached_arrows(), 2);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn concurrent_rotations_share_one_cached_arrow() {
    let dir = resource_dir("arrows-shared");
    let res = Resources::load(&dir).unwrap();
    let barrier = std::sync::Barrier::new(4);
    let arrows: Vec<Arc<FrameRGBA>> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    let mut raster = Rasterizer::new();
                    barrier.wait();
                    res.arrow(&mut raster, 45.5).unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(res.cached_arrows(), 1);
    let cached = res.arrow(&mut Rasterizer::new(), 45.0).unwrap();
    // Callers whose rotation lost the race still get the cached image.
    assert!(arrows.iter().all(|a| Arc::ptr_eq(a, &cached)));
    std::fs::remove_dir_all(&dir).ok();
}
