//! Pure content transforms: HTML cleanup, chunking, image normalization,
//! and delivery-unit assembly.

pub mod image;
pub mod text;
pub mod unit;

pub use image::normalize_image;
pub use text::{chunk, clean_html, truncate_chars};
pub use unit::{DeliveryUnit, UnitLimits, build_unit};
