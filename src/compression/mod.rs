//! Contains the compression method definition
//! and methods to compress and decompress gif image data.


// private modules make non-breaking changes easier
mod table;
mod lzw;
mod packets;
mod decode;


pub use self::lzw::EncoderState;
pub use self::packets::{SubBlockWriter, read_sub_blocks, MAX_PACKET_LEN};
pub use self::decode::{CodeStream, PackedCode, decompress};

use crate::error::{Error, Result, UnitResult};
use crate::io::Write;
use crate::math::bits_per_pixel;


/// A byte vector.
pub type ByteVec = Vec<u8>;

/// A byte slice.
pub type Bytes<'s> = &'s [u8];

/// A compression code, either a pixel index, a control code, or a string of pixel indices.
pub type Code = u16;

/// The gif format never uses codes wider than this.
pub const MAX_CODE_BITS: u8 = 12;

/// The number of distinct codes with the maximum width.
/// The compressor clears the string table before ever assigning this code.
pub const MAX_CODE_COUNT: Code = 1 << MAX_CODE_BITS;


/// Specifies how the compressor assigns codes to the pixel indices.
/// All methods produce standard gif image data that any decoder can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {

    /// Every repeated sequence of pixel indices is replaced by a single code.
    /// Produces the smallest files. This is what all common gif encoders do.
    LZW,

    /// Only repetitions of a single pixel index are merged into longer codes.
    /// Works well for images with large flat areas, such as masks and abstract graphics,
    /// but falls behind `LZW` for dithered images and patterns.
    RLE,

    /// Every pixel index is written as its own code.
    /// The result is larger than the raw pixel indices,
    /// but the table bookkeeping still matches what decoders expect.
    Uncompressed,
}

impl Default for Compression {
    fn default() -> Self { Compression::LZW }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} compression", match self {
            Compression::LZW => "lzw",
            Compression::RLE => "rle",
            Compression::Uncompressed => "no",
        })
    }
}

impl Compression {

    /// Compress the pixel indices and write the sub-blocks, including the terminating empty block, to the writer.
    /// Does not write the minimum code size byte that precedes the sub-blocks in a gif file.
    /// Allocates a new string table. Use an `EncoderState` to compress multiple images with one allocation.
    /// Returns the writer after everything has been written.
    pub fn compress_to<W: Write>(
        self, min_code_size: MinCodeSize,
        pixels: impl IntoIterator<Item = u8>, write: W
    ) -> Result<W>
    {
        EncoderState::new().compress(self, min_code_size, pixels, write)
    }

    /// Compress the pixel indices into a new byte vector of sub-blocks.
    pub fn compress_to_vec(self, min_code_size: MinCodeSize, pixels: impl IntoIterator<Item = u8>) -> Result<ByteVec> {
        self.compress_to(min_code_size, pixels, ByteVec::new())
    }
}

/// Compress the pixel indices with `Compression::LZW`.
/// Writes all sub-blocks, including the terminating empty block.
/// Aborts at the first failed write, leaving the writer with an incomplete stream.
pub fn compress(min_code_size: MinCodeSize, pixels: impl IntoIterator<Item = u8>, write: impl Write) -> UnitResult {
    Compression::LZW.compress_to(min_code_size, pixels, write)?;
    Ok(())
}


/// The number of bits per pixel index, as written before the compressed data of each frame.
/// The first code width of the compressor is one bit more,
/// which leaves room for the clear code and the end code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MinCodeSize(u8);

impl MinCodeSize {

    /// The smallest minimum code size.
    /// Images with only two colors still use two bits,
    /// because the two control codes must fit into the first code width.
    pub const MIN: MinCodeSize = MinCodeSize(2);

    /// The largest minimum code size, for 256 colors.
    pub const MAX: MinCodeSize = MinCodeSize(8);

    /// Returns an error for values outside of `2 ..= 8`.
    pub fn new(bits: u8) -> Result<Self> {
        if bits < Self::MIN.0 || bits > Self::MAX.0 {
            Err(Error::unsupported(format!("minimum code size of {} bits", bits)))
        }
        else {
            Ok(MinCodeSize(bits))
        }
    }

    /// The minimum code size for pixel indices with the specified number of bits.
    /// Raises one bit to two bits.
    pub fn for_bits_per_pixel(bits_per_pixel: u8) -> Result<Self> {
        Self::new(bits_per_pixel.max(Self::MIN.0))
    }

    /// The minimum code size for a color table with the specified number of colors.
    pub fn for_color_count(color_count: usize) -> Result<Self> {
        if color_count > 256 {
            return Err(Error::invalid(format!("color table with {} colors", color_count)));
        }

        Self::for_bits_per_pixel(bits_per_pixel(color_count))
    }

    /// The number of bits, as written to the file.
    #[inline] pub fn bits(self) -> u8 { self.0 }

    /// The code that tells the decoder to reset its string table.
    #[inline] pub fn clear_code(self) -> Code { 1 << self.0 }

    /// The code that marks the end of the image data.
    #[inline] pub fn end_code(self) -> Code { self.clear_code() + 1 }

    /// The first code that stands for a string of pixel indices.
    #[inline] pub fn first_string_code(self) -> Code { self.clear_code() + 2 }

    /// The width of the first code after each clear code.
    #[inline] pub fn initial_code_bits(self) -> u8 { self.0 + 1 }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn min_code_sizes(){
        assert!(MinCodeSize::new(1).is_err());
        assert!(MinCodeSize::new(9).is_err());
        assert_eq!(MinCodeSize::new(5).unwrap().bits(), 5);

        assert_eq!(MinCodeSize::for_bits_per_pixel(1).unwrap(), MinCodeSize::MIN);
        assert_eq!(MinCodeSize::for_color_count(2).unwrap(), MinCodeSize::MIN);
        assert_eq!(MinCodeSize::for_color_count(5).unwrap().bits(), 3);
        assert_eq!(MinCodeSize::for_color_count(256).unwrap(), MinCodeSize::MAX);
        assert!(matches!(MinCodeSize::for_color_count(257), Err(Error::Invalid(_))));
    }

    #[test]
    fn control_codes(){
        let two = MinCodeSize::MIN;
        assert_eq!(two.clear_code(), 4);
        assert_eq!(two.end_code(), 5);
        assert_eq!(two.first_string_code(), 6);
        assert_eq!(two.initial_code_bits(), 3);

        let eight = MinCodeSize::MAX;
        assert_eq!(eight.clear_code(), 256);
        assert_eq!(eight.end_code(), 257);
        assert_eq!(eight.initial_code_bits(), 9);
    }

    #[test]
    fn every_method_round_trips(){
        let pixels: Vec<u8> = (0 .. 3000_u32)
            .map(|index| ((index / 7) % 13 + (index % 3)) as u8)
            .collect();

        let min_code_size = MinCodeSize::for_color_count(16).unwrap();

        for &compression in &[ Compression::LZW, Compression::RLE, Compression::Uncompressed ] {
            let compressed = compression.compress_to_vec(min_code_size, pixels.iter().copied()).unwrap();
            let decompressed = decompress(min_code_size, &compressed, pixels.len(), true).unwrap();
            assert_eq!(decompressed, pixels, "{}", compression);
        }
    }

    #[test]
    fn lzw_is_smallest_for_patterns(){
        let pixels: Vec<u8> = (0 .. 4000_u32).map(|index| (index % 5) as u8).collect();
        let min_code_size = MinCodeSize::for_color_count(8).unwrap();

        let size = |compression: Compression| compression
            .compress_to_vec(min_code_size, pixels.iter().copied())
            .unwrap().len();

        assert!(size(Compression::LZW) < size(Compression::RLE));
        assert!(size(Compression::RLE) <= size(Compression::Uncompressed));
        assert!(size(Compression::LZW) < pixels.len());
    }
}
