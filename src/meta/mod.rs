
//! Describes the blocks of a gif file that surround the compressed image data.
//! Contains the file header, the logical screen, the color table and the image descriptor.

pub mod extension;

use bit_field::BitField;
use crate::compression::MinCodeSize;
use crate::error::{Error, Result, UnitResult};
use crate::io::{Data, Write};
use crate::math::{Vec2, bits_per_pixel};


/// Starts every image descriptor.
pub const IMAGE_SEPARATOR: u8 = 0x2C;

/// Starts every extension block.
pub const EXTENSION_INTRODUCER: u8 = 0x21;

/// The last byte of every gif file.
pub const TRAILER: u8 = 0x3B;


/// The revision of the gif format that a file requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Version {

    /// The original format, without any extension blocks.
    Gif87a,

    /// Adds extension blocks, which are required for comments, transparency and animations.
    Gif89a,
}

impl Version {

    /// The first six bytes of the file.
    pub fn signature(self) -> &'static [u8; 6] {
        match self {
            Version::Gif87a => b"GIF87a",
            Version::Gif89a => b"GIF89a",
        }
    }

    /// Write the signature.
    pub fn write(self, write: &mut impl Write) -> UnitResult {
        u8::write_slice(write, self.signature())
    }
}


/// A color of the color table.
pub type Rgb = [u8; 3];

/// The global color table of the image.
/// Contains between one and 256 colors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {

    /// Returns an error if there are no colors or more than 256 colors.
    pub fn new(colors: impl Into<Vec<Rgb>>) -> Result<Self> {
        let colors = colors.into();

        if colors.is_empty() { return Err(Error::invalid("empty color table")); }
        if colors.len() > 256 { return Err(Error::invalid("more than 256 colors")); }

        Ok(Palette { colors })
    }

    /// Evenly spaced shades of gray, from black to white.
    pub fn grayscale(color_count: usize) -> Result<Self> {
        let last = color_count.saturating_sub(1).max(1);

        Self::new((0 .. color_count)
            .map(|index| {
                let value = (index * 255 / last) as u8;
                [value, value, value]
            })
            .collect::<Vec<Rgb>>())
    }

    /// The colors, excluding the padding of the table.
    pub fn colors(&self) -> &[Rgb] { &self.colors }

    /// The number of bits of each pixel index.
    pub fn bits_per_pixel(&self) -> u8 {
        bits_per_pixel(self.colors.len())
    }

    /// The number of colors written to the file.
    /// The table is padded with black to the next power of two.
    pub fn table_len(&self) -> usize {
        1 << self.bits_per_pixel()
    }

    /// The minimum code size for compressing pixel indices into this table.
    pub fn min_code_size(&self) -> Result<MinCodeSize> {
        MinCodeSize::for_bits_per_pixel(self.bits_per_pixel())
    }

    /// Write the padded color table.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        for color in &self.colors {
            u8::write_slice(write, color)?;
        }

        for _ in self.colors.len() .. self.table_len() {
            u8::write_slice(write, &[0, 0, 0])?;
        }

        Ok(())
    }
}


/// The size of the canvas that all frames are drawn onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenDescriptor {

    /// The width and height of the screen.
    pub size: Vec2<u16>,

    /// The bits per pixel of the global color table.
    pub bits_per_pixel: u8,

    /// The color table index of the area not covered by a frame.
    pub background_index: u8,
}

impl ScreenDescriptor {

    /// Always announces a global color table.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        debug_assert!((1 ..= 8).contains(&self.bits_per_pixel), "bits per pixel out of range");
        let table_bits = self.bits_per_pixel - 1;

        let mut packed = 0_u8;
        packed.set_bit(7, true); // global color table
        packed.set_bits(4 .. 7, table_bits); // color resolution
        packed.set_bits(0 .. 3, table_bits); // color table size

        self.size.width().write(write)?;
        self.size.height().write(write)?;
        packed.write(write)?;
        self.background_index.write(write)?;
        0_u8.write(write) // no aspect ratio
    }
}


/// The placement of one frame on the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {

    /// The top left corner of the frame.
    pub position: Vec2<u16>,

    /// The width and height of the frame.
    pub size: Vec2<u16>,

    /// Whether the rows of the frame are stored in the four interlace passes.
    pub interlaced: bool,
}

impl ImageDescriptor {

    /// Includes the image separator. Never announces a local color table.
    pub fn write(&self, write: &mut impl Write) -> UnitResult {
        let mut packed = 0_u8;
        packed.set_bit(6, self.interlaced);

        IMAGE_SEPARATOR.write(write)?;
        self.position.x().write(write)?;
        self.position.y().write(write)?;
        self.size.width().write(write)?;
        self.size.height().write(write)?;
        packed.write(write)
    }
}
