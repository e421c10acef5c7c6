pub mod bitmap;
pub mod color;
pub mod decoder;
pub mod post;

pub use bitmap::{ColorBitmap, MonochromeBitmap, RgbBitmap};
pub use color::Rgb;
pub use decoder::{ImageDecoder, Palette, pixel_index};
pub use post::{
    ColorInvert, GaussianBlur, GrayscaleGaussianBlur, PostProcessor, ProcessOutcome,
};
