//! Module implementing the actual captioning task.
//! Most if not all captioning logic lives here.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};
use image::codecs::jpeg::JpegEncoder;

use crate::model::{Color, ColorMode, DecodedImage, Frame};
use crate::util::animated_gif;
use crate::util::text::{self, Canvas, Ink, Outline, Stamp, Style};
use super::engine;
use super::error::{CaptionError, EncodeError};
use super::fit::{self, TextBox};
use super::output::CaptionOutput;


/// Width of the outline drawn around caption text, in pixels.
const STROKE_WIDTH: u32 = 2;


/// Represents a single captioning task and contains all the relevant logic.
///
/// All the code here is executed in a background thread,
/// and so it can be synchronous.
pub(super) struct CaptionTask {
    image: DecodedImage,
    text: String,
    engine: Arc<engine::Inner>,
}

impl CaptionTask {
    #[inline]
    pub fn new(image: DecodedImage, text: &str, engine: Arc<engine::Inner>) -> Self {
        CaptionTask{image, text: text.to_owned(), engine}
    }
}

impl CaptionTask {
    /// Perform the captioning task.
    pub fn perform(self) -> Result<CaptionOutput, CaptionError> {
        debug!("Captioning {:?} with {:?}", self.image, self.text);

        let text = fit::prepare_text(&self.text);
        if text.trim().is_empty() {
            return Err(CaptionError::EmptyText);
        }
        let font = &self.engine.font;
        trace!("Checking if font `{}` has all glyphs for caption: {}", font.name(), text);
        text::check(font, &text);

        // Font size is computed once and used for all the frames.
        let stamps = self.layout_text(&text);

        match self.image {
            DecodedImage::Still(ref still) => {
                let image = draw(still.image.clone(), still.color_mode, &stamps);
                let bytes = self.encode_still(&image, still.format)?;
                Ok(CaptionOutput::new(still.format, bytes))
            }
            DecodedImage::Animation(ref anim) => {
                debug!("Captioning animation with {} frames", anim.frames_count());
                let frames: Vec<_> = anim.frames().iter().map(|f| {
                    Frame::new(draw(f.image.clone(), anim.color_mode, &stamps), f.delay_ms)
                }).collect();

                trace!("Writing animated GIF with {} frame(s)", frames.len());
                let mut bytes = vec![];
                animated_gif::encode(
                    &frames, anim.loop_count, self.engine.config.gif_quality, &mut bytes)?;
                Ok(CaptionOutput::new(ImageFormat::Gif, bytes))
            }
        }
    }

    /// Fit the text into the image and rasterize all of its lines.
    fn layout_text(&self, text: &str) -> Vec<Stamp> {
        let font = &self.engine.font;
        let (width, height) = self.image.dimensions();
        let text_box = TextBox::for_image(width, height);

        let fit = fit::fit(text, font, &text_box);
        debug!("Caption fitted at font size {} into {} line(s) of {}px",
            fit.font_size, fit.lines.len(), fit.line_height);

        let style = Style::new(font, fit.font_size as f32, Color::white())
            .outlined(Outline::new(Color::black(), STROKE_WIDTH));
        let positions = fit::placement(&fit, font, &text_box);
        fit.lines.iter().zip(positions)
            .filter_map(|(line, (x, y))| Stamp::new(line, x, y, style))
            .collect()
    }

    /// Encode final still image as bytes of the appropriate image format.
    fn encode_still(&self, image: &DynamicImage,
                    format: ImageFormat) -> Result<Vec<u8>, EncodeError> {
        debug!("Encoding final image as {:?}...", format);

        let mut result = vec![];
        match format {
            ImageFormat::Jpeg => {
                let quality = self.engine.config.jpeg_quality;
                trace!("Writing JPEG with quality {}", quality);
                JpegEncoder::new_with_quality(&mut result, quality)
                    .encode_image(&image.to_rgb8())?;
            }
            ImageFormat::Gif => {
                trace!("Writing regular (still) GIF");
                animated_gif::encode_still(image, self.engine.config.gif_quality, &mut result)?;
            }
            f => {
                trace!("Writing {:?} image", f);
                image.write_to(&mut Cursor::new(&mut result), f)?;
            }
        }
        Ok(result)
    }
}

/// Draw the rasterized text onto a single image (or animation frame),
/// converting it to the target color mode first.
fn draw(image: DynamicImage, color_mode: ColorMode, stamps: &[Stamp]) -> DynamicImage {
    match color_mode.convert(image) {
        DynamicImage::ImageRgb8(mut img) => {
            apply_all(&mut img, stamps);
            DynamicImage::ImageRgb8(img)
        }
        other => {
            let mut img = other.into_rgba8();
            apply_all(&mut img, stamps);
            DynamicImage::ImageRgba8(img)
        }
    }
}

fn apply_all<P: Ink>(img: &mut Canvas<P>, stamps: &[Stamp]) {
    for stamp in stamps {
        stamp.apply(img);
    }
}
