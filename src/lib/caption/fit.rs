//! Module for fitting caption text into the image.
//!
//! Caption is placed at the bottom of the image, centered horizontally,
//! and uses the largest font size for which it wraps into at most two lines
//! that take at most 30% of image height.

use unicode_normalization::UnicodeNormalization;

use crate::resources::Font;
use crate::util::text;


/// Smallest font size that's ever used, even if the text doesn't fit with it.
pub const MIN_FONT_SIZE: u32 = 10;
/// Maximum number of lines the caption can be wrapped into.
pub const MAX_LINES: usize = 2;
/// Vertical space between lines, in pixels.
pub const LINE_SPACING: u32 = 5;

const PADDING_RATIO: f32 = 0.05;
const MAX_HEIGHT_RATIO: f32 = 0.3;
const MAX_FONT_SIZE_RATIO: f32 = 0.2;


/// Normalize caption text before it's measured & rendered.
pub fn prepare_text(text: &str) -> String {
    text.nfc().collect::<String>().to_uppercase()
}


/// Area of the image that caption text should fit in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBox {
    pub image_width: u32,
    pub image_height: u32,
    /// Distance of the text from the image edges.
    pub padding: u32,
    /// Width available for a single line of text.
    pub max_width: f32,
    /// Height available for the whole block of text.
    pub max_height: f32,
}

impl TextBox {
    pub fn for_image(width: u32, height: u32) -> Self {
        let padding = (height as f32 * PADDING_RATIO).floor() as u32;
        TextBox{
            image_width: width,
            image_height: height,
            padding,
            max_width: width as f32 - 2.0 * padding as f32,
            max_height: height as f32 * MAX_HEIGHT_RATIO,
        }
    }

    /// Largest font size that's considered for this box.
    #[inline]
    pub fn max_font_size(&self) -> u32 {
        (self.image_height as f32 * MAX_FONT_SIZE_RATIO).floor() as u32
    }
}


/// Result of fitting caption text into a `TextBox`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FitResult {
    pub font_size: u32,
    /// Wrapped lines of the text.
    pub lines: Vec<String>,
    pub line_height: u32,
    /// Height of all the lines, including spacing between them.
    pub block_height: u32,
}

impl FitResult {
    fn new(font_size: u32, lines: Vec<String>, line_height: u32) -> Self {
        let block_height = block_height(lines.len(), line_height);
        FitResult{font_size, lines, line_height, block_height}
    }
}

/// Height of a block of given number of lines.
#[inline]
pub fn block_height(line_count: usize, line_height: u32) -> u32 {
    let line_count = line_count as u32;
    line_count * line_height + line_count.saturating_sub(1) * LINE_SPACING
}


/// Wrap the text into lines no wider than `max_width`, greedily.
///
/// A word that's wider than `max_width` on its own is put on a separate line.
pub fn wrap(text: &str, font: &Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if text::text_width(&candidate, font, size) <= max_width {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_owned();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap the text at given font size and check if it fits the box.
/// Returns the wrapping in either case, along with the verdict.
fn try_size(text: &str, font: &Font, size: u32, text_box: &TextBox) -> (FitResult, bool) {
    let lines = wrap(text, font, size as f32, text_box.max_width);
    let line_height = text::line_height(font, size as f32);
    let result = FitResult::new(size, lines, line_height);
    let ok = result.lines.len() <= MAX_LINES
        && result.block_height as f32 <= text_box.max_height;
    (result, ok)
}

/// Check whether the text fits the box when rendered with given font size.
pub fn fits(text: &str, font: &Font, size: u32, text_box: &TextBox) -> Option<FitResult> {
    match try_size(text, font, size, text_box) {
        (result, true) => Some(result),
        (_, false) => None,
    }
}

/// Find the largest font size at which the text fits into the box.
///
/// If it doesn't fit even at `MIN_FONT_SIZE`, that size is used anyway.
pub fn fit(text: &str, font: &Font, text_box: &TextBox) -> FitResult {
    let (mut lo, mut hi) = (MIN_FONT_SIZE, text_box.max_font_size());
    let mut best = None;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        match fits(text, font, mid, text_box) {
            Some(result) => {
                best = Some(result);
                lo = mid + 1;
            }
            None => hi = mid - 1,
        }
    }

    best.unwrap_or_else(|| {
        debug!("Caption doesn't fit the {}x{} image even at minimum font size",
            text_box.image_width, text_box.image_height);
        try_size(text, font, MIN_FONT_SIZE, text_box).0
    })
}


/// Compute the top-left positions of all the lines of fitted text.
///
/// The block is centered horizontally and sits `padding` pixels above
/// the bottom edge of the image.
pub fn placement(fit: &FitResult, font: &Font, text_box: &TextBox) -> Vec<(i32, i32)> {
    let bottom = text_box.image_height as i32 - text_box.padding as i32;
    let top = bottom - fit.block_height as i32;
    let step = (fit.line_height + LINE_SPACING) as i32;

    fit.lines.iter().enumerate().map(|(i, line)| {
        let width = text::text_width(line, font, fit.font_size as f32);
        let x = ((text_box.image_width as f32 - width) / 2.0).floor() as i32;
        let y = top + i as i32 * step;
        (x, y)
    }).collect()
}


#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use spectral::prelude::*;

    use crate::resources::tests::test_font;
    use super::{fit, fits, placement, prepare_text, wrap, TextBox, MIN_FONT_SIZE};

    #[test]
    fn text_box_dimensions() {
        let text_box = TextBox::for_image(500, 400);
        assert_eq!(20, text_box.padding);
        assert_eq!(460.0, text_box.max_width);
        assert_that!(text_box.max_height).is_close_to(120.0, 0.001);
        assert_eq!(80, text_box.max_font_size());
    }

    #[test]
    fn text_is_normalized() {
        assert_eq!("HELLO THERE", prepare_text("hello there"));
        // Decomposed "e" + combining acute accent.
        assert_eq!("CAF\u{c9}", prepare_text("cafe\u{301}"));
    }

    #[test]
    fn wrap_single_line() {
        let font = test_font();
        assert_eq!(vec!["HI"], wrap("HI", &font, 20.0, 500.0));
        assert_that!(wrap("", &font, 20.0, 500.0)).is_empty();
        assert_eq!(vec!["A B"], wrap("  A \t B  ", &font, 20.0, 500.0));
    }

    #[test]
    fn wrap_breaks_lines() {
        let font = test_font();
        let lines = wrap("ONE TWO THREE FOUR FIVE SIX", &font, 30.0, 150.0);
        assert_that!(lines.len()).is_greater_than(1);
        assert_eq!("ONE TWO THREE FOUR FIVE SIX", lines.join(" "));
    }

    #[test]
    fn wrap_overlong_word() {
        let font = test_font();
        let lines = wrap("A SUPERCALIFRAGILISTIC B", &font, 30.0, 60.0);
        assert_eq!(vec!["A", "SUPERCALIFRAGILISTIC", "B"], lines);
    }

    #[test]
    fn short_caption_fits_big() {
        let font = test_font();
        let text_box = TextBox::for_image(500, 400);
        let result = fit("LOL", &font, &text_box);
        assert_that!(result.font_size).is_greater_than(MIN_FONT_SIZE);
        assert_that!(result.font_size).is_less_than_or_equal_to(text_box.max_font_size());
        assert_eq!(vec!["LOL"], result.lines);
        assert_that!(result.block_height as f32).is_less_than_or_equal_to(text_box.max_height);
    }

    #[test]
    fn long_caption_gets_minimum_size() {
        let font = test_font();
        let text_box = TextBox::for_image(60, 60);
        let text = "THIS IS A VERY LONG CAPTION THAT CANNOT POSSIBLY FIT THE TINY IMAGE";
        let result = fit(text, &font, &text_box);
        assert_eq!(MIN_FONT_SIZE, result.font_size);
        assert_that!(result.lines.len()).is_greater_than(2);
    }

    #[test]
    fn tiny_image_gets_minimum_size() {
        let font = test_font();
        let text_box = TextBox::for_image(30, 20);
        assert_that!(text_box.max_font_size()).is_less_than(MIN_FONT_SIZE);
        assert_eq!(MIN_FONT_SIZE, fit("A", &font, &text_box).font_size);
    }

    #[test]
    fn placement_is_bottom_centered() {
        let font = test_font();
        let text_box = TextBox::for_image(400, 300);
        let result = fit("TOP TEXT BOTTOM TEXT", &font, &text_box);
        let positions = placement(&result, &font, &text_box);
        assert_eq!(result.lines.len(), positions.len());

        let (_, first_y) = positions[0];
        assert_eq!(300 - 15 - result.block_height as i32, first_y);
        for &(x, _) in &positions {
            assert_that!(x).is_greater_than_or_equal_to(0);
            assert_that!(x).is_less_than(200);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn chosen_size_is_largest(words in prop::collection::vec("[A-Z]{1,9}", 1..8),
                                  width in 80u32..600, height in 60u32..500) {
            let font = test_font();
            let text = words.join(" ");
            let text_box = TextBox::for_image(width, height);
            let result = fit(&text, &font, &text_box);

            prop_assert!(result.font_size >= MIN_FONT_SIZE);
            if fits(&text, &font, MIN_FONT_SIZE, &text_box).is_some() {
                prop_assert!(result.lines.len() <= 2);
                prop_assert!(result.block_height as f32 <= text_box.max_height);
            }
            for size in (result.font_size + 1)..=text_box.max_font_size() {
                prop_assert!(fits(&text, &font, size, &text_box).is_none(),
                    "size {} fits but {} was chosen", size, result.font_size);
            }
        }
    }
}
