//! Module defining decoded images that can be captioned.

use std::fmt;

use image::{DynamicImage, GenericImageView, ImageFormat};


/// Color mode of an image, as far as captioning is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// Plain three-channel color, no transparency.
    Opaque,
    /// Image carries an alpha channel (or a transparent palette entry).
    Transparent,
}

impl ColorMode {
    /// Color mode matching the pixel layout of given image.
    #[inline]
    pub fn of(img: &DynamicImage) -> Self {
        if img.color().has_alpha() { ColorMode::Transparent } else { ColorMode::Opaque }
    }

    #[inline]
    pub fn has_alpha(self) -> bool {
        self == ColorMode::Transparent
    }

    /// Convert an image into the pixel layout of this color mode.
    pub fn convert(self, img: DynamicImage) -> DynamicImage {
        match (self, img) {
            (ColorMode::Transparent, img @ DynamicImage::ImageRgba8(..)) => img,
            (ColorMode::Transparent, img) => DynamicImage::ImageRgba8(img.to_rgba8()),
            (ColorMode::Opaque, img @ DynamicImage::ImageRgb8(..)) => img,
            (ColorMode::Opaque, img) => DynamicImage::ImageRgb8(img.to_rgb8()),
        }
    }
}


/// A single frame of an animation.
#[derive(Clone)]
pub struct Frame {
    /// The (fully composed) image of the frame.
    pub image: DynamicImage,
    /// How long the frame is displayed, in milliseconds.
    pub delay_ms: u32,
}

impl Frame {
    #[inline]
    pub fn new(image: DynamicImage, delay_ms: u32) -> Self {
        Frame{image, delay_ms}
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let (w, h) = self.image.dimensions();
        fmt.debug_struct("Frame")
            .field("image", &format_args!("{}x{}", w, h))
            .field("delay_ms", &self.delay_ms)
            .finish()
    }
}


/// Single still image.
#[derive(Clone)]
pub struct StillImage {
    pub image: DynamicImage,
    /// Format the image has been decoded from.
    pub format: ImageFormat,
    pub color_mode: ColorMode,
}

impl StillImage {
    /// Create a still image whose color mode follows its pixel layout.
    #[inline]
    pub fn new(image: DynamicImage, format: ImageFormat) -> Self {
        let color_mode = ColorMode::of(&image);
        StillImage{image, format, color_mode}
    }
}


/// Multi-frame animation.
#[derive(Clone)]
pub struct Animation {
    /// Format the animation has been decoded from.
    pub format: ImageFormat,
    pub color_mode: ColorMode,
    /// How many times the animation repeats; 0 means forever.
    pub loop_count: u16,
    frames: Vec<Frame>,
}

impl Animation {
    /// Create the animation from its frames.
    ///
    /// Returns `None` if there are no frames,
    /// or if they don't all share the same dimensions.
    pub fn new(frames: Vec<Frame>, format: ImageFormat,
               color_mode: ColorMode, loop_count: u16) -> Option<Self> {
        let dims = frames.first()?.image.dimensions();
        if frames.iter().any(|f| f.image.dimensions() != dims) {
            return None;
        }
        Some(Animation{format, color_mode, loop_count, frames})
    }

    #[inline]
    pub fn frames_count(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames[..]
    }

    /// Dimensions of the animation canvas.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.frames[0].image.dimensions()
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let (w, h) = self.dimensions();
        fmt.debug_struct("Animation")
            .field("size", &format_args!("{}x{}", w, h))
            .field("format", &self.format)
            .field("color_mode", &self.color_mode)
            .field("loop_count", &self.loop_count)
            .field("frames", &format_args!("<{} frames>", self.frames.len()))
            .finish()
    }
}


/// Image decoded from some source, ready to be captioned.
#[derive(Clone)]
pub enum DecodedImage {
    /// Single still image.
    Still(StillImage),
    /// An animation (of at least one frame).
    Animation(Animation),
}

impl DecodedImage {
    /// Create a still image from already decoded pixels.
    #[inline]
    pub fn still(image: DynamicImage, format: ImageFormat) -> Self {
        DecodedImage::Still(StillImage::new(image, format))
    }
}

impl DecodedImage {
    /// Whether this is an animated image.
    #[inline]
    pub fn is_animated(&self) -> bool {
        matches!(*self, DecodedImage::Animation(..))
    }

    /// Format the image has been decoded from.
    #[inline]
    pub fn format(&self) -> ImageFormat {
        match *self {
            DecodedImage::Still(ref s) => s.format,
            DecodedImage::Animation(ref a) => a.format,
        }
    }

    #[inline]
    pub fn color_mode(&self) -> ColorMode {
        match *self {
            DecodedImage::Still(ref s) => s.color_mode,
            DecodedImage::Animation(ref a) => a.color_mode,
        }
    }

    /// Width & height of the image (or animation canvas).
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        match *self {
            DecodedImage::Still(ref s) => s.image.dimensions(),
            DecodedImage::Animation(ref a) => a.dimensions(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 { self.dimensions().0 }
    #[inline]
    pub fn height(&self) -> u32 { self.dimensions().1 }

    /// Number of images this one consists of.
    #[inline]
    pub fn image_count(&self) -> usize {
        match *self {
            DecodedImage::Still(..) => 1,
            DecodedImage::Animation(ref a) => a.frames_count(),
        }
    }

    /// Loop count of the animation, if this is one. 0 means infinite.
    #[inline]
    pub fn loop_count(&self) -> Option<u16> {
        match *self {
            DecodedImage::Still(..) => None,
            DecodedImage::Animation(ref a) => Some(a.loop_count),
        }
    }

    /// Delays of animation frames, in milliseconds. Empty for still images.
    pub fn frame_delays(&self) -> Vec<u32> {
        match *self {
            DecodedImage::Still(..) => vec![],
            DecodedImage::Animation(ref a) => a.frames.iter().map(|f| f.delay_ms).collect(),
        }
    }
}

impl From<StillImage> for DecodedImage {
    fn from(still: StillImage) -> Self {
        DecodedImage::Still(still)
    }
}
impl From<Animation> for DecodedImage {
    fn from(anim: Animation) -> Self {
        DecodedImage::Animation(anim)
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodedImage::Still(ref s) => {
                let (width, height) = s.image.dimensions();
                write!(fmt, "DecodedImage::Still({}x{}, {:?}, {:?})",
                    width, height, s.format, s.color_mode)
            }
            DecodedImage::Animation(ref a) => {
                write!(fmt, "DecodedImage::{:?}", a)
            }
        }
    }
}
