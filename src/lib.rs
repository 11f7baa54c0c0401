
//! Compress color table indices into gif image data, and write complete gif files.
//!
//! The compressor assigns lzw codes in the same order as common gif encoders,
//! so the output is byte-identical for the same pixels and code size.
//! Use `compression::compress` for the raw image data blocks,
//! or build an `image::Image` and write a whole file.

#![forbid(unsafe_code)]
#![forbid(
    clippy::all,
    clippy::restriction,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
)]

#![warn(missing_docs)]


pub mod io;
pub mod math;
pub mod compression;
pub mod meta;
pub mod image;
pub mod error;

#[macro_use]
extern crate smallvec;


/// Export the most important items from `giflzw`.
/// _Note: This includes a type called `Result`, possibly overwriting the default `std::Result` type usage._
pub mod prelude {

    // main exports
    pub use crate::image::{Image, Frame, IndexedPixels, LineOrder, GetPixel, write_indexed_file};
    pub use crate::compression::{Compression, MinCodeSize, EncoderState, compress, decompress};

    // secondary data types
    pub use crate::meta::{Palette, Rgb};
    pub use crate::meta::extension::{Disposal, Repetitions};
    pub use crate::math::Vec2;

    pub use crate::error::{Result, Error};
    pub use crate::meta;
    pub use crate::error;
}
