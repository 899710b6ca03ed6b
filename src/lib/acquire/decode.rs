//! Decoding of image data into `DecodedImage`s.

use std::io::Cursor;

use image::{self, AnimationDecoder, DynamicImage, ImageDecoder, ImageFormat};
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::metadata::LoopCount;

use crate::caption::DecodeError;
use crate::model::{Animation, ColorMode, DecodedImage, Frame, StillImage};
use crate::util::animated_gif;


/// Decode image data, sniffing its format from the content.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let format = image::guess_format(bytes)?;
    trace!("Decoding {} byte(s) of {:?} image", bytes.len(), format);
    let image = match format {
        ImageFormat::Gif => decode_gif(bytes)?,
        ImageFormat::Png => decode_png(bytes)?,
        ImageFormat::WebP => decode_webp(bytes)?,
        f => decode_still(bytes, f)?,
    };
    debug!("Decoded {:?}", image);
    Ok(image)
}

fn decode_still(bytes: &[u8], format: ImageFormat) -> Result<DecodedImage, DecodeError> {
    let img = image::load_from_memory_with_format(bytes, format)?;
    Ok(DecodedImage::Still(StillImage::new(img, format)))
}

fn decode_gif(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let gif = animated_gif::decode(bytes)?;
    let color_mode = if gif.transparent { ColorMode::Transparent } else { ColorMode::Opaque };

    let mut frames = gif.frames;
    if frames.len() == 1 {
        let frame = frames.remove(0);
        let image = color_mode.convert(frame.image);
        return Ok(DecodedImage::Still(StillImage{image, format: ImageFormat::Gif, color_mode}));
    }
    Animation::new(frames, ImageFormat::Gif, color_mode, gif.loop_count)
        .map(DecodedImage::Animation)
        .ok_or(DecodeError::FrameSize)
}

fn decode_png(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let decoder = PngDecoder::new(Cursor::new(bytes))?;
    if decoder.is_apng()? {
        let color_mode = color_mode_of(&decoder);
        let apng = decoder.apng()?;
        let loop_count = loop_count(apng.loop_count());
        let frames = apng.into_frames().collect_frames()?;
        if frames.len() > 1 {
            return animation(frames, ImageFormat::Png, color_mode, loop_count);
        }
    }
    decode_still(bytes, ImageFormat::Png)
}

fn decode_webp(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let decoder = WebPDecoder::new(Cursor::new(bytes))?;
    if decoder.has_animation() {
        let color_mode = color_mode_of(&decoder);
        let loop_count = loop_count(decoder.loop_count());
        let frames = decoder.into_frames().collect_frames()?;
        if frames.len() > 1 {
            return animation(frames, ImageFormat::WebP, color_mode, loop_count);
        }
    }
    decode_still(bytes, ImageFormat::WebP)
}

fn color_mode_of<D: ImageDecoder>(decoder: &D) -> ColorMode {
    if decoder.color_type().has_alpha() { ColorMode::Transparent } else { ColorMode::Opaque }
}

/// Loop count as stored in `Animation` (0 is forever).
fn loop_count(count: LoopCount) -> u16 {
    match count {
        LoopCount::Infinite => 0,
        LoopCount::Finite(n) => n.get().min(u16::MAX as u32) as u16,
    }
}

/// Convert frames decoded by the `image` crate into an `Animation`.
fn animation(frames: Vec<image::Frame>, format: ImageFormat,
             color_mode: ColorMode, loop_count: u16) -> Result<DecodedImage, DecodeError> {
    let frames: Vec<_> = frames.into_iter().map(|f| {
        let (numer, denom) = f.delay().numer_denom_ms();
        let delay_ms = if denom == 0 { 0 } else { (numer as f64 / denom as f64).round() as u32 };
        Frame::new(DynamicImage::ImageRgba8(f.into_buffer()), delay_ms)
    }).collect();
    Animation::new(frames, format, color_mode, loop_count)
        .map(DecodedImage::Animation)
        .ok_or(DecodeError::FrameSize)
}
