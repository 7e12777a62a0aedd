// End-to-end validation scenarios: remote, inline and uploads-root sources.
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use imgin::image_handler::{
    CropRegion, ImageConfig, ImageError, ImageHandler, ImageReference, crop_image, encode_to_jpeg,
    jpeg_to_data_url,
};

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode fixture");
    buf.into_inner()
}

fn checkerboard() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(16, 16, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    }))
}

#[tokio::test]
async fn missing_remote_image_is_bad_request() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server failed");
    let addr = listener.local_addr().expect("read local addr failed");

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept failed");
        let mut req_buf = [0u8; 1024];
        let _ = stream.read(&mut req_buf);

        stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .expect("write response failed");
        stream.flush().expect("flush failed");
    });

    let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");
    let mut reference = ImageReference::new(format!("http://127.0.0.1:{}/missing.png", addr.port()));
    let result = handler.validate(&mut reference).await;

    server.join().expect("server thread failed");

    let err = result.expect_err("404 must fail");
    assert_eq!(err.status().as_u16(), 400);
    assert!(err.cause().is_none());
    assert!(reference.raster().is_none());
}

#[tokio::test]
async fn inline_gif_decodes_by_content() {
    let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");

    // Declared type deliberately disagrees with the payload.
    let gif = encode(&checkerboard(), ImageFormat::Gif);
    let source = format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(gif));

    let reference = handler.validate_source(source).await.expect("validate gif");
    assert_eq!(reference.raster().expect("raster").image().dimensions(), (16, 16));
    assert!(
        reference
            .to_data_url()
            .expect("data url")
            .starts_with("data:image/jpeg;base64,")
    );
}

#[tokio::test]
async fn local_upload_validates_and_crops() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("nested")).expect("mkdir");
    std::fs::write(
        dir.path().join("nested/board.png"),
        encode(&checkerboard(), ImageFormat::Png),
    )
    .expect("write fixture");

    let handler =
        ImageHandler::new(ImageConfig::with_uploads_root(dir.path())).expect("handler init failed");
    let reference = handler
        .validate_source("nested/board.png")
        .await
        .expect("validate local");

    let raster = reference.raster().expect("raster");
    let cropped = crop_image(raster, CropRegion::new(4, 0, 8, 4)).expect("crop");

    assert_eq!(cropped.image().dimensions(), (4, 4));
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(
                cropped.image().get_pixel(x, y),
                raster.image().get_pixel(x + 4, y)
            );
        }
    }
}

#[tokio::test]
async fn traversal_outside_uploads_root_is_internal() {
    let handler = ImageHandler::new(ImageConfig::with_uploads_root("/srv/uploads"))
        .expect("handler init failed");

    let err = handler
        .validate_source("../../etc/passwd")
        .await
        .expect_err("traversal must fail");
    assert!(matches!(err, ImageError::Internal(_)));
    assert_eq!(err.status().as_u16(), 500);
}

#[tokio::test]
async fn unguarded_traversal_still_fails_as_internal() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = ImageConfig::with_uploads_root(dir.path().join("uploads"));
    config.contain_uploads = false;
    std::fs::create_dir(dir.path().join("uploads")).expect("mkdir");
    std::fs::write(dir.path().join("secret.txt"), b"root:x:0:0").expect("write");

    let handler = ImageHandler::new(config).expect("handler init failed");
    let err = handler
        .validate_source("../secret.txt")
        .await
        .expect_err("non-image must fail");

    assert!(matches!(err, ImageError::Internal(_)));
}

#[tokio::test]
async fn non_image_upload_is_internal() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("notes.txt"), b"plain text").expect("write");

    let handler =
        ImageHandler::new(ImageConfig::with_uploads_root(dir.path())).expect("handler init failed");
    let err = handler
        .validate_source("notes.txt")
        .await
        .expect_err("must fail");

    assert_eq!(err.code(), "internal");
}

#[tokio::test]
async fn canonical_bytes_match_reencoded_raster() {
    let source = format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(encode(&checkerboard(), ImageFormat::Png))
    );
    let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");
    let reference = handler.validate_source(source).await.expect("validate");

    let again = encode_to_jpeg(reference.raster().expect("raster"), 75).expect("encode");
    assert_eq!(reference.canonical_bytes().expect("bytes"), again.as_slice());
    assert_eq!(
        reference.to_data_url().expect("data url"),
        jpeg_to_data_url(&again)
    );
}

#[tokio::test]
async fn transparent_inline_png_is_composited_onto_black() {
    let transparent = DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        8,
        8,
        image::Rgba([255, 255, 255, 0]),
    ));
    let source = format!(
        "data:image/png;base64,{}",
        general_purpose::STANDARD.encode(encode(&transparent, ImageFormat::Png))
    );
    let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");
    let reference = handler.validate_source(source).await.expect("validate");

    let canonical = image::load_from_memory(reference.canonical_bytes().expect("bytes"))
        .expect("decode canonical")
        .to_rgb8();
    let Rgb([r, g, b]) = *canonical.get_pixel(4, 4);
    assert!(r < 8 && g < 8 && b < 8, "unexpected color: {r},{g},{b}");
}
