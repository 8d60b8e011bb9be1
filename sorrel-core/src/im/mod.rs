mod buffer;
mod image;
mod mask;
mod points;

pub use buffer::SorrelBuffer;
pub use image::SorrelImage;

pub use mask::BinaryMask;
pub use mask::LabelImage;

pub use points::PointPrompt;
pub use points::Points;
