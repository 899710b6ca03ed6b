//! Module with captioning engine configuration.


/// Default quality of generated JPEG images (in %).
pub const DEFAULT_JPEG_QUALITY: u8 = 85;
/// Default quality of generated GIF images (in %).
pub const DEFAULT_GIF_QUALITY: u8 = 60;
/// Default limit on the size of downloaded images.
pub const DEFAULT_MAX_DOWNLOAD_SIZE: u64 = 32 * 1024 * 1024;


/// Structure holding configuration for the `Engine`.
///
/// This is shared with `CaptionTask`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Quality of the generated JPEG images (in %).
    pub jpeg_quality: u8,
    /// Quality of the generated GIF images (in %).
    pub gif_quality: u8,
    /// Maximum size of image data downloaded from the web (in bytes).
    pub max_download_size: u64,
}

impl Default for Config {
    /// Initialize Config with default values.
    fn default() -> Self {
        Config {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            gif_quality: DEFAULT_GIF_QUALITY,
            max_download_size: DEFAULT_MAX_DOWNLOAD_SIZE,
        }
    }
}
