pub mod mask;
pub mod pixel_buffer;
pub mod point;
pub mod rect;

pub use mask::BinaryMask;
pub use pixel_buffer::PixelBuffer;
pub use point::ResultPoint;
pub use rect::CropRect;
