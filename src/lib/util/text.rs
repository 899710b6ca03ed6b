//! Module responsible for measuring & rendering text.

use std::cmp;

use image::{ImageBuffer, Pixel, Rgb, Rgba};
use itertools::Itertools;
use rusttype::{point, Point, PositionedGlyph};

use crate::model::Color;
use crate::resources::Font;


/// Pixel type that text can be drawn onto.
pub trait Ink: Pixel<Subpixel=u8> + 'static {
    /// Fully opaque pixel of given color.
    fn from_color(color: Color) -> Self;
}

impl Ink for Rgb<u8> {
    #[inline]
    fn from_color(color: Color) -> Self {
        color.to_rgb()
    }
}

impl Ink for Rgba<u8> {
    #[inline]
    fn from_color(color: Color) -> Self {
        color.to_rgba(0xff)
    }
}

/// Image buffer that text can be drawn onto.
pub type Canvas<P> = ImageBuffer<P, Vec<u8>>;


/// Style of the rendered text.
#[derive(Clone, Copy, Debug)]
pub struct Style<'f> {
    pub font: &'f Font,
    /// Em size of the font in pixels.
    pub size: f32,
    pub color: Color,
    pub outline: Option<Outline>,
}

impl<'f> Style<'f> {
    #[inline]
    pub fn new(font: &'f Font, size: f32, color: Color) -> Self {
        Style{font, size, color, outline: None}
    }

    #[inline]
    pub fn outlined(self, outline: Outline) -> Self {
        Style{outline: Some(outline), ..self}
    }
}

/// Outline (stroke) around the glyphs of rendered text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outline {
    pub color: Color,
    /// Stroke width in pixels.
    pub width: u32,
}

impl Outline {
    #[inline]
    pub fn new(color: Color, width: u32) -> Self {
        Outline{color, width}
    }
}


// Measuring

/// Compute the advance width of a single line of text.
pub fn text_width(s: &str, font: &Font, size: f32) -> f32 {
    let scale = font.scale(size);
    font.layout(s, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Compute the height of a line of text,
/// measured from the top of the line down to the bottom
/// of the tallest glyphs with descenders.
pub fn line_height(font: &Font, size: f32) -> u32 {
    let scale = font.scale(size);
    let ascent = font.v_metrics(scale).ascent;
    font.layout("Ay", scale, point(0.0, ascent))
        .filter_map(|g| g.pixel_bounding_box())
        .map(|bb| cmp::max(bb.max.y, 0) as u32)
        .max()
        .unwrap_or_else(|| size.ceil() as u32)
}

/// Ascent of the font at given size, in pixels.
#[inline]
pub fn ascent(font: &Font, size: f32) -> f32 {
    font.v_metrics(font.scale(size)).ascent
}

/// Check if the font has glyphs for all the characters of the text.
/// Missing ones are only logged.
pub fn check(font: &Font, text: &str) {
    let missing: Vec<_> = text.chars()
        .filter(|c| !c.is_whitespace())
        .filter(|&c| font.glyph(c).id().0 == 0)
        .unique()
        .collect();
    if !missing.is_empty() {
        let chars = missing.iter().format_with(", ", |c, f| f(&format_args!("{:?}", c)));
        warn!("Missing glyphs for {} character(s) in font `{}`: {}",
            missing.len(), font.name(), chars);
    }
}


// Rendering

/// Coverage of the image pixels by some rendered shape,
/// confined to the shape's bounding box.
#[derive(Clone, Debug)]
pub struct Mask {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl Mask {
    /// Rasterize a line of text whose baseline starts at given position.
    /// Returns `None` if the text has no visible glyphs.
    pub fn of_text(s: &str, font: &Font, size: f32, position: Point<f32>) -> Option<Mask> {
        let glyphs: Vec<PositionedGlyph> = font.layout(s, font.scale(size), position).collect();

        let (mut left, mut top) = (i32::MAX, i32::MAX);
        let (mut right, mut bottom) = (i32::MIN, i32::MIN);
        for bb in glyphs.iter().filter_map(|g| g.pixel_bounding_box()) {
            left = cmp::min(left, bb.min.x);
            top = cmp::min(top, bb.min.y);
            right = cmp::max(right, bb.max.x);
            bottom = cmp::max(bottom, bb.max.y);
        }
        if left >= right || top >= bottom {
            return None;
        }

        let mut mask = Mask::empty(left, top, (right - left) as u32, (bottom - top) as u32);
        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|x, y, v| {
                    let mx = (bb.min.x - mask.left) as u32 + x;
                    let my = (bb.min.y - mask.top) as u32 + y;
                    let idx = mask.index(mx, my);
                    if mask.coverage[idx] < v {
                        mask.coverage[idx] = v;
                    }
                });
            }
        }
        Some(mask)
    }

    fn empty(left: i32, top: i32, width: u32, height: u32) -> Self {
        let coverage = vec![0.0; (width * height) as usize];
        Mask{left, top, width, height, coverage}
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Bounding box of the mask in image coordinates, as `(left, top, width, height)`.
    #[inline]
    pub fn bounds(&self) -> (i32, i32, u32, u32) {
        (self.left, self.top, self.width, self.height)
    }

    /// Coverage value at given image coordinates.
    pub fn at(&self, x: i32, y: i32) -> f32 {
        if x < self.left || y < self.top {
            return 0.0;
        }
        let (mx, my) = ((x - self.left) as u32, (y - self.top) as u32);
        if mx >= self.width || my >= self.height {
            return 0.0;
        }
        self.coverage[self.index(mx, my)]
    }

    /// Grow the covered area by a disc of given radius.
    pub fn dilate(&self, radius: u32) -> Mask {
        if radius == 0 {
            return self.clone();
        }
        let r = radius as i32;
        let offsets: Vec<(i32, i32)> = (-r..=r).cartesian_product(-r..=r)
            .filter(|&(dx, dy)| dx * dx + dy * dy <= r * r)
            .collect();

        let mut result = Mask::empty(
            self.left - r, self.top - r, self.width + 2 * radius, self.height + 2 * radius);
        for my in 0..result.height {
            for mx in 0..result.width {
                let (x, y) = (result.left + mx as i32, result.top + my as i32);
                let value = offsets.iter()
                    .map(|&(dx, dy)| self.at(x + dx, y + dy))
                    .fold(0.0, f32::max);
                let idx = result.index(mx, my);
                result.coverage[idx] = value;
            }
        }
        result
    }

    /// Blend given color onto the image, weighted by the mask's coverage.
    /// Parts of the mask outside of the image are ignored.
    pub fn blend<P: Ink>(&self, img: &mut Canvas<P>, color: Color) {
        let ink = P::from_color(color);
        let (width, height) = img.dimensions();
        for my in 0..self.height {
            let y = self.top + my as i32;
            if y < 0 || y as u32 >= height {
                continue;
            }
            for mx in 0..self.width {
                let x = self.left + mx as i32;
                if x < 0 || x as u32 >= width {
                    continue;
                }
                let v = self.coverage[self.index(mx, my)];
                if v <= 0.0 {
                    continue;
                }
                let pixel = img.get_pixel_mut(x as u32, y as u32);
                for (c, &t) in pixel.channels_mut().iter_mut().zip(ink.channels()) {
                    *c = lerp(*c, t, v);
                }
            }
        }
    }
}

#[inline]
fn lerp(from: u8, to: u8, amount: f32) -> u8 {
    let amount = amount.min(1.0);
    let value = from as f32 + (to as f32 - from as f32) * amount;
    value.round().max(0.0).min(255.0) as u8
}


/// A line of text rasterized once, ready to be applied onto any number of images
/// (e.g. all frames of an animation).
#[derive(Clone, Debug)]
pub struct Stamp {
    outline: Option<(Mask, Color)>,
    fill: (Mask, Color),
}

impl Stamp {
    /// Rasterize a line of text with its top-left corner at given position.
    /// Returns `None` if there is nothing to draw.
    pub fn new(s: &str, x: i32, y: i32, style: Style) -> Option<Self> {
        trace!("Stamp::new({:?}, x={}, y={}, size={})", s, x, y, style.size);
        let baseline = point(x as f32, y as f32 + ascent(style.font, style.size));
        let mask = Mask::of_text(s, style.font, style.size, baseline)?;
        let outline = style.outline.map(|o| (mask.dilate(o.width), o.color));
        Some(Stamp{outline, fill: (mask, style.color)})
    }

    /// Draw the text onto given image.
    pub fn apply<P: Ink>(&self, img: &mut Canvas<P>) {
        if let Some((ref mask, color)) = self.outline {
            mask.blend(img, color);
        }
        let (ref mask, color) = self.fill;
        mask.blend(img, color);
    }
}
