//! End-to-end tests of captioning.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use image::{self, DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use spectral::prelude::*;
use tempfile::NamedTempFile;
use url::Url;

use crate::acquire::{self, AcquireError, HttpClient};
use crate::model::{Animation, ColorMode, DecodedImage, Frame, ImageSource};
use crate::resources::tests::test_font;
use crate::util::animated_gif;
use super::{CaptionError, Engine, EngineBuilder, TextBox, MIN_FONT_SIZE};


/// HTTP client serving canned responses.
#[derive(Default)]
struct MockClient {
    responses: HashMap<String, Vec<u8>>,
}

impl MockClient {
    fn serve<B: Into<Vec<u8>>>(mut self, url: &str, body: B) -> Self {
        self.responses.insert(url.to_owned(), body.into());
        self
    }
}

impl HttpClient for MockClient {
    fn get(&self, url: &Url, limit: u64) -> Result<Vec<u8>, AcquireError> {
        match self.responses.get(url.as_str()) {
            Some(body) if body.len() as u64 <= limit => Ok(body.clone()),
            Some(_) => Err(AcquireError::Http(url.to_string(), "body too large".into())),
            None => Err(AcquireError::Status(404, url.to_string())),
        }
    }
}

fn engine() -> Engine {
    engine_with(MockClient::default())
}

fn engine_with(client: MockClient) -> Engine {
    EngineBuilder::new().font(test_font()).http_client(client).build().unwrap()
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(vec![]);
    img.write_to(&mut bytes, format).unwrap();
    bytes.into_inner()
}

fn gray_rgb(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0x60, 0x60, 0x60])))
}

fn animated_gif_bytes(delays: &[u32], loop_count: u16, alpha: u8) -> Vec<u8> {
    let frames: Vec<_> = delays.iter().enumerate().map(|(i, &delay)| {
        let shade = 40 * i as u8;
        let img = RgbaImage::from_pixel(120, 90, Rgba([shade, 0x80, 0xff - shade, alpha]));
        Frame::new(DynamicImage::ImageRgba8(img), delay)
    }).collect();
    let mut bytes = vec![];
    animated_gif::encode(&frames, loop_count, 60, &mut bytes).unwrap();
    bytes
}


#[test]
fn still_png_keeps_format_and_size() {
    let png = encode(&gray_rgb(400, 300), ImageFormat::Png);
    let output = engine().caption(ImageSource::Bytes(png), "one does not simply").unwrap();

    assert_eq!(ImageFormat::Png, output.format());
    assert_eq!("result.png", output.filename());
    let result = image::load_from_memory(&output).unwrap();
    assert_eq!((400, 300), result.dimensions());
    assert_that!(result.color().has_alpha()).is_false();
}

#[test]
fn text_is_drawn_at_the_bottom() {
    let original = gray_rgb(400, 300);
    let png = encode(&original, ImageFormat::Png);
    let output = engine().caption(ImageSource::Bytes(png), "bottom text").unwrap();
    let result = image::load_from_memory(&output).unwrap().to_rgb8();
    let original = original.to_rgb8();

    let changed = |y: u32| (0..400).any(|x| result.get_pixel(x, y) != original.get_pixel(x, y));
    let text_box = TextBox::for_image(400, 300);
    // Nothing is drawn in the top half or within the bottom padding.
    assert_that!((0..150).any(&changed)).is_false();
    assert_that!(((300 - text_box.padding + 1)..300).any(&changed)).is_false();
    // But there's both white fill & black outline somewhere in the caption block.
    assert_that!(result.pixels().any(|p| *p == Rgb([0xff, 0xff, 0xff]))).is_true();
    assert_that!(result.pixels().any(|p| *p == Rgb([0, 0, 0]))).is_true();
}

#[test]
fn long_caption_still_renders() {
    let png = encode(&gray_rgb(120, 80), ImageFormat::Png);
    let text = "this caption is way too long to ever fit in such a tiny image no matter what";
    let output = engine().caption(ImageSource::Bytes(png), text).unwrap();
    assert_eq!((120, 80), image::load_from_memory(&output).unwrap().dimensions());

    let text_box = TextBox::for_image(120, 80);
    assert_that!(text_box.max_font_size()).is_greater_than_or_equal_to(MIN_FONT_SIZE);
}

#[test]
fn rgba_roundtrip_keeps_alpha() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 150, Rgba([10, 20, 30, 0])));
    let output = engine().caption(ImageSource::Bytes(encode(&img, ImageFormat::Png)), "hi").unwrap();

    let result = image::load_from_memory(&output).unwrap();
    assert_eq!((200, 150), result.dimensions());
    assert_that!(result.color().has_alpha()).is_true();
    // Corners stay fully transparent.
    assert_eq!(0, result.to_rgba8().get_pixel(0, 0)[3]);
}

#[test]
fn jpeg_stays_jpeg() {
    let jpeg = encode(&gray_rgb(320, 240), ImageFormat::Jpeg);
    let output = engine().caption(ImageSource::Bytes(jpeg), "such wow").unwrap();
    assert_eq!(ImageFormat::Jpeg, output.format());
    assert_eq!("result.jpeg", output.filename());
    assert_eq!(ImageFormat::Jpeg, image::guess_format(&output).unwrap());
}

#[test]
fn still_gif_stays_still() {
    let mut gif = vec![];
    animated_gif::encode_still(&gray_rgb(100, 100), 60, &mut gif).unwrap();
    let output = engine().caption(ImageSource::Bytes(gif), "gif").unwrap();

    assert_eq!(ImageFormat::Gif, output.format());
    let decoded = acquire::decode(&output).unwrap();
    assert!(!decoded.is_animated());
    assert_eq!((100, 100), decoded.dimensions());
}

#[test]
fn animation_keeps_frames_timing_and_loop() {
    let delays = [100, 40, 250];
    let gif = animated_gif_bytes(&delays, 4, 0xff);
    let output = engine().caption(ImageSource::Bytes(gif), "animated").unwrap();

    assert_eq!(ImageFormat::Gif, output.format());
    assert_eq!("result.gif", output.filename());
    let decoded = acquire::decode(&output).unwrap();
    assert!(decoded.is_animated());
    assert_eq!((120, 90), decoded.dimensions());
    assert_eq!(3, decoded.image_count());
    assert_eq!(delays.to_vec(), decoded.frame_delays());
    assert_eq!(Some(4), decoded.loop_count());
    assert_eq!(ColorMode::Opaque, decoded.color_mode());
}

#[test]
fn infinite_animation_stays_infinite() {
    let gif = animated_gif_bytes(&[50, 50], 0, 0xff);
    let output = engine().caption(ImageSource::Bytes(gif), "forever").unwrap();
    assert_eq!(Some(0), acquire::decode(&output).unwrap().loop_count());
}

#[test]
fn apng_becomes_gif_with_frames_timing_and_loop() {
    let frames = [([0x30, 0x60, 0x90, 0xff], 120), ([0x90, 0x60, 0x30, 0xff], 60)];
    let apng = acquire::decode_tests::apng_bytes(160, 120, &frames, 3);
    let output = engine().caption(ImageSource::Bytes(apng), "apng").unwrap();

    assert_eq!(ImageFormat::Gif, output.format());
    assert_eq!("result.gif", output.filename());
    let decoded = acquire::decode(&output).unwrap();
    assert!(decoded.is_animated());
    assert_eq!((160, 120), decoded.dimensions());
    assert_eq!(2, decoded.image_count());
    assert_eq!(vec![120, 60], decoded.frame_delays());
    assert_eq!(Some(3), decoded.loop_count());
}

#[test]
fn transparent_animation_stays_transparent() {
    let gif = animated_gif_bytes(&[50, 50], 0, 0);
    let output = engine().caption(ImageSource::Bytes(gif), "ghost").unwrap();
    assert_eq!(ColorMode::Transparent, acquire::decode(&output).unwrap().color_mode());
}

#[test]
fn non_gif_animation_becomes_gif() {
    let frames: Vec<_> = [70, 120].iter().map(|&delay| {
        let img = RgbaImage::from_pixel(80, 60, Rgba([0x20, 0x40, 0x60, 0xff]));
        Frame::new(DynamicImage::ImageRgba8(img), delay)
    }).collect();
    let anim = Animation::new(frames, ImageFormat::WebP, ColorMode::Opaque, 0).unwrap();
    let output = engine().overlay(DecodedImage::Animation(anim), "webp").unwrap();

    assert_eq!(ImageFormat::Gif, output.format());
    assert_eq!(vec![70, 120], acquire::decode(&output).unwrap().frame_delays());
}

#[test]
fn decoded_source() {
    let image = DecodedImage::still(gray_rgb(50, 50), ImageFormat::Bmp);
    let output = engine().caption(ImageSource::Decoded(image), "bmp").unwrap();
    assert_eq!(ImageFormat::Bmp, output.format());
    assert_eq!("result.bmp", output.filename());
}

#[test]
fn local_path() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&encode(&gray_rgb(64, 64), ImageFormat::Png)).unwrap();
    let source = ImageSource::from_locator(file.path().to_str().unwrap()).unwrap();
    let output = engine().caption(source, "file").unwrap();
    assert_eq!(ImageFormat::Png, output.format());
}

#[test]
fn remote_url() {
    let png = encode(&gray_rgb(64, 48), ImageFormat::Png);
    let client = MockClient::default().serve("https://example.com/meme.png", png);
    let output = engine_with(client)
        .caption(ImageSource::Url("https://example.com/meme.png".into()), "remote")
        .unwrap();
    assert_eq!((64, 48), image::load_from_memory(&output).unwrap().dimensions());
}

#[test]
fn landing_page() {
    let page = r#"<html><head>
        <meta property="og:image" content="https://media.tenor.com/xyz/cat.gif">
    </head></html>"#;
    let gif = animated_gif_bytes(&[30, 30], 0, 0xff);
    let client = MockClient::default()
        .serve("https://tenor.com/view/cat-123", page)
        .serve("https://media.tenor.com/xyz/cat.gif", gif);
    let output = engine_with(client)
        .caption(ImageSource::Url("https://tenor.com/view/cat-123".into()), "cat")
        .unwrap();
    assert_eq!(ImageFormat::Gif, output.format());
}

#[test]
fn download_size_limit() {
    let png = encode(&gray_rgb(64, 48), ImageFormat::Png);
    let client = MockClient::default().serve("https://example.com/big.png", png);
    let engine = EngineBuilder::new()
        .font(test_font()).http_client(client).max_download_size(16)
        .build().unwrap();
    let result = engine.caption(ImageSource::Url("https://example.com/big.png".into()), "big");
    assert_that!(matches!(result, Err(CaptionError::Acquire(AcquireError::Http(..))))).is_true();
}

#[test]
fn empty_text() {
    let png = encode(&gray_rgb(64, 64), ImageFormat::Png);
    let result = engine().caption(ImageSource::Bytes(png), "  \t ");
    assert_that!(matches!(result, Err(CaptionError::EmptyText))).is_true();

    let result = engine().overlay(DecodedImage::still(gray_rgb(8, 8), ImageFormat::Png), "");
    assert_that!(matches!(result, Err(CaptionError::EmptyText))).is_true();
}

#[test]
fn undecodable_bytes() {
    let result = engine().caption(ImageSource::Bytes(b"not an image".to_vec()), "text");
    assert_that!(matches!(result, Err(CaptionError::Decode(_)))).is_true();
}
