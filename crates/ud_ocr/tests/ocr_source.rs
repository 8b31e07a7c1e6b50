use ud_ocr::{OcrConfig, PaddleOcrSource};
use ud_platform::{OcrSource, Screenshot, TierError};

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn missing_models_make_the_tier_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let source = PaddleOcrSource::new(OcrConfig::new(dir.path(), "english"));

    let shot = Screenshot::new(png_bytes(32, 32), 32, 32);
    match source.recognize(&shot) {
        Err(TierError::Unavailable(msg)) => assert!(msg.contains("no OCR language model")),
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[test]
fn undecodable_screenshot_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let source = PaddleOcrSource::new(OcrConfig::new(dir.path(), "english"));

    let shot = Screenshot::new(vec![1u8, 2, 3, 4], 2, 2);
    assert!(matches!(source.recognize(&shot), Err(TierError::Failed(_))));
}
