//! Module handling the decoding & encoding of (animated) GIFs.
//! This is done by wrapping over the API exposed by several image-related crates.

use std::borrow::Cow;
use std::fmt;
use std::io::Write;

use color_quant::NeuQuant;
use gif::{self, DisposalMethod, Repeat};
use gif_dispose::Screen;
use image::{DynamicImage, RgbaImage};

use crate::caption::{DecodeError, EncodeError};
use crate::model::Frame;


// Decoding

/// Animation loaded from a GIF file.
/// The frames are kept in their decoded (RGBA) form, with frame disposal applied.
pub struct GifAnimation {
    /// Width of the animation canvas (logical screen).
    pub width: u32,
    /// Height of the animation canvas (logical screen).
    pub height: u32,
    /// Whether any of the frames declares a transparent color.
    pub transparent: bool,
    /// How many times the animation repeats; 0 means forever.
    pub loop_count: u16,
    pub frames: Vec<Frame>,
}

impl fmt::Debug for GifAnimation {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("GifAnimation")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("transparent", &self.transparent)
            .field("loop_count", &self.loop_count)
            .field("frames", &format_args!("<{} frames>", self.frames.len()))
            .finish()
    }
}

/// Decode a GIF file, animated or not.
pub fn decode(bytes: &[u8]) -> Result<GifAnimation, DecodeError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(bytes)?;
    let width = decoder.width() as u32;
    let height = decoder.height() as u32;

    // Read the frames and "draw" them on a virtual screen to ensure
    // that the frame disposal mechanics are applied correctly.
    let mut screen = Screen::new_decoder(&decoder);
    let mut frames = vec![];
    let mut transparent = false;
    while let Some(frame) = decoder.read_next_frame()? {
        transparent |= frame.transparent.is_some();
        let delay_ms = frame.delay as u32 * 10;  // GIF delay unit is 10ms.
        screen.blit_frame(frame)
            .map_err(|e| DecodeError::Dispose(format!("{:?}", e)))?;

        // Take the current state of the logical screen as the new frame.
        let pixels = screen.pixels_rgba();
        let mut buffer = Vec::with_capacity(pixels.width() * pixels.height() * RGBA_SIZE_BYTES);
        for px in pixels.pixels() {
            buffer.extend_from_slice(&[px.r, px.g, px.b, px.a]);
        }
        let image = RgbaImage::from_raw(pixels.width() as u32, pixels.height() as u32, buffer)
            .ok_or(DecodeError::FrameSize)?;
        trace!("Decoded GIF frame #{} ({}ms)", frames.len() + 1, delay_ms);
        frames.push(Frame::new(DynamicImage::ImageRgba8(image), delay_ms));
    }
    if frames.is_empty() {
        return Err(DecodeError::NoFrames);
    }

    // `Finite(0)` is also what a GIF without the looping extension reports.
    let loop_count = match decoder.repeat() {
        Repeat::Infinite => 0,
        Repeat::Finite(n) => n,
    };
    debug!("GIF successfully decoded: {}x{} with {} frame(s), loop count {}",
        width, height, frames.len(), loop_count);
    Ok(GifAnimation{width, height, transparent, loop_count, frames})
}

const RGBA_SIZE_BYTES: usize = 4;


// Encoding

/// Map GIF quality percentage to the sample factor of NeuQuant color quantizer.
/// Range 1..=30. Lower values mean better quality.
pub fn sample_factor(quality: u8) -> i32 {
    let quality = quality.min(100) as i32;
    30 - quality * 29 / 100
}

/// Encode animation frames as an animated GIF.
///
/// Frame delays are kept (rounded to GIF's 10ms units)
/// and every frame replaces the previous one entirely.
pub fn encode<W: Write>(frames: &[Frame], loop_count: u16,
                        quality: u8, output: W) -> Result<(), EncodeError> {
    let repeat = match loop_count {
        0 => Repeat::Infinite,
        n => Repeat::Finite(n),
    };
    write_frames(frames, Some(repeat), quality, output)
}

/// Encode a single image as a still GIF.
pub fn encode_still<W: Write>(image: &DynamicImage,
                              quality: u8, output: W) -> Result<(), EncodeError> {
    let frame = Frame::new(image.clone(), 0);
    write_frames(&[frame], None, quality, output)
}

fn write_frames<W: Write>(frames: &[Frame], repeat: Option<Repeat>,
                          quality: u8, output: W) -> Result<(), EncodeError> {
    let (width, height) = match frames.first() {
        Some(f) => (f.image.width(), f.image.height()),
        None => return Ok(()),
    };
    if width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(EncodeError::TooLarge(width, height));
    }
    let sample_factor = sample_factor(quality);
    trace!("Writing GIF with {} frame(s), sample factor {}", frames.len(), sample_factor);

    let mut encoder = gif::Encoder::new(output, width as u16, height as u16, &[])?;
    if let Some(repeat) = repeat {
        encoder.set_repeat(repeat)?;
    }
    for (i, frame) in frames.iter().enumerate() {
        trace!("Writing frame #{}", i + 1);
        let (buffer, palette, transparent) = quantize_image(&frame.image, sample_factor);

        let mut gif_frame = gif::Frame::default();
        gif_frame.width = width as u16;
        gif_frame.height = height as u16;
        gif_frame.delay = (frame.delay_ms.saturating_add(5) / 10).min(u16::MAX as u32) as u16;
        gif_frame.dispose = DisposalMethod::Background;
        gif_frame.buffer = Cow::Owned(buffer);
        gif_frame.palette = Some(palette);
        gif_frame.transparent = transparent;
        encoder.write_frame(&gif_frame)?;
    }
    Ok(())  // dropping the encoder writes the GIF trailer
}

/// Low-level function that performs color quantization of an image.
///
/// Returns (buffer, palette, transparent) where:
/// * `buffer` is the image where pixels are palette indexes
/// * `palette` is a contiguous buffer of RGB colors in the palette used
/// * `transparent` is optional palette index of the transparent color
pub fn quantize_image(image: &DynamicImage, sample_factor: i32) -> (Vec<u8>, Vec<u8>, Option<u8>) {
    let mut pixels = image.to_rgba8().into_raw();

    //
    // This is essentially gif::Frame::from_rgba_speed(),
    // except that the NeuQuant sample factor is configurable.
    //

    let mut transparent = None;
    for pix in pixels.chunks_mut(RGBA_SIZE_BYTES) {
        if pix[3] != 0 {
            pix[3] = 0xff;
        } else {
            transparent = Some([pix[0], pix[1], pix[2], pix[3]])
        }
    }

    let quantizer = NeuQuant::new(sample_factor, 256, &pixels[..]);

    let buffer = pixels.chunks(RGBA_SIZE_BYTES)
        .map(|pix| quantizer.index_of(pix) as u8)
        .collect();
    let palette = quantizer.color_map_rgb();
    let transparent = transparent.map(|t| quantizer.index_of(&t) as u8);

    (buffer, palette, transparent)
}
