
//! Extension blocks of the gif 89a format.

use bit_field::BitField;
use crate::compression::SubBlockWriter;
use crate::error::UnitResult;
use crate::io::{Data, Write};
use super::EXTENSION_INTRODUCER;


const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const COMMENT_LABEL: u8 = 0xFE;
const APPLICATION_LABEL: u8 = 0xFF;

const NETSCAPE_LOOP_IDENTIFIER: &[u8; 11] = b"NETSCAPE2.0";


/// What happens to a frame of an animation when the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposal {

    /// The decoder decides.
    Unspecified,

    /// The frame stays, and the next frame is drawn on top of it.
    Keep,

    /// The area of the frame is cleared to the background before the next frame.
    Background,

    /// The area of the frame is restored to what was visible before this frame.
    Previous,
}

impl Default for Disposal {
    fn default() -> Self { Disposal::Unspecified }
}

impl Disposal {
    fn bits(self) -> u8 {
        match self {
            Disposal::Unspecified => 0,
            Disposal::Keep => 1,
            Disposal::Background => 2,
            Disposal::Previous => 3,
        }
    }
}


/// Timing and transparency of a single frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameControl {

    /// How long the frame is shown, in hundredths of a second.
    pub delay: u16,

    /// Only written for animations.
    pub disposal: Disposal,

    /// The color table index that is not drawn.
    pub transparent_index: Option<u8>,
}

impl FrameControl {

    /// Whether the graphic control extension must precede the frame.
    pub fn is_required(&self, animated: bool) -> bool {
        animated || self.transparent_index.is_some()
    }

    /// Write the graphic control extension.
    pub fn write(&self, animated: bool, write: &mut impl Write) -> UnitResult {
        let mut packed = 0_u8;
        packed.set_bit(0, self.transparent_index.is_some());
        if animated { packed.set_bits(2 .. 5, self.disposal.bits()); }

        u8::write_slice(write, &[ EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, 4, packed ])?;
        self.delay.write(write)?;
        self.transparent_index.unwrap_or(0).write(write)?;
        0_u8.write(write)
    }
}


/// How often an animation is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetitions {

    /// Loop forever.
    Infinite,

    /// Repeat the animation this many times after the first time.
    Finite(u16),
}

impl Repetitions {

    /// The loop count of the netscape extension, where zero means forever.
    pub fn loop_count(self) -> u16 {
        match self {
            Repetitions::Infinite => 0,
            Repetitions::Finite(count) => count,
        }
    }

    /// Write the netscape looping application extension.
    pub fn write(self, write: &mut impl Write) -> UnitResult {
        u8::write_slice(write, &[ EXTENSION_INTRODUCER, APPLICATION_LABEL, 11 ])?;
        u8::write_slice(write, NETSCAPE_LOOP_IDENTIFIER)?;
        u8::write_slice(write, &[ 3, 1 ])?;
        self.loop_count().write(write)?;
        0_u8.write(write)
    }
}


/// Write a comment extension, split into as many sub-blocks as necessary.
/// An empty comment writes nothing.
pub fn write_comment(comment: &str, write: &mut impl Write) -> UnitResult {
    if comment.is_empty() { return Ok(()); }

    u8::write_slice(write, &[ EXTENSION_INTRODUCER, COMMENT_LABEL ])?;

    let mut blocks = SubBlockWriter::new(write);
    blocks.write_bytes(comment.as_bytes())?;
    blocks.finish()?;

    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn graphic_control_of_still_image(){
        let control = FrameControl {
            delay: 0x0102, disposal: Disposal::Background,
            transparent_index: Some(7)
        };

        assert!(control.is_required(false));
        assert!(!FrameControl::default().is_required(false));
        assert!(FrameControl::default().is_required(true));

        let mut bytes = Vec::new();
        control.write(false, &mut bytes).unwrap();
        assert_eq!(bytes, vec![ 0x21, 0xF9, 4, 0x01, 0x02, 0x01, 7, 0 ]);

        let mut bytes = Vec::new();
        control.write(true, &mut bytes).unwrap();
        assert_eq!(bytes[3], 0b000_010_0_1);
    }

    #[test]
    fn netscape_loop(){
        let mut bytes = Vec::new();
        Repetitions::Finite(3).write(&mut bytes).unwrap();

        assert_eq!(&bytes[.. 3], &[ 0x21, 0xFF, 11 ]);
        assert_eq!(&bytes[3 .. 14], b"NETSCAPE2.0");
        assert_eq!(&bytes[14 ..], &[ 3, 1, 3, 0, 0 ]);
        assert_eq!(Repetitions::Infinite.loop_count(), 0);
    }

    #[test]
    fn long_comments_are_split(){
        let comment = "x".repeat(300);

        let mut bytes = Vec::new();
        write_comment(&comment, &mut bytes).unwrap();

        assert_eq!(&bytes[.. 3], &[ 0x21, 0xFE, 254 ]);
        assert_eq!(bytes[3 + 254], 46);
        assert_eq!(bytes.len(), 2 + 1 + 254 + 1 + 46 + 1);
        assert_eq!(bytes.last(), Some(&0));

        let mut bytes = Vec::new();
        write_comment("", &mut bytes).unwrap();
        assert!(bytes.is_empty());
    }
}
