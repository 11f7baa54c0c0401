//! Framing of compressed data in gif sub-blocks.
//! Codes are packed into bytes with the least significant bit first,
//! and the bytes are grouped into packets with a leading length byte.

use super::{Code, ByteVec, Bytes};
use crate::error::{Error, Result, UnitResult};
use crate::io::{Data, Write};


/// The number of data bytes in each full sub-block.
/// The format would allow 255 bytes, but common encoders and decoders use 254.
pub const MAX_PACKET_LEN: usize = 254;


/// Groups bytes into sub-blocks, each preceded by its length.
/// Writes the terminating empty sub-block on `finish`.
#[derive(Debug)]
pub struct SubBlockWriter<W> {
    write: W,
    packet: [u8; MAX_PACKET_LEN],
    len: usize,
}

impl<W: Write> SubBlockWriter<W> {

    /// Start with an empty packet.
    pub fn new(write: W) -> Self {
        SubBlockWriter { write, packet: [0; MAX_PACKET_LEN], len: 0 }
    }

    /// Append a byte to the packet, writing the packet if it is full.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) -> UnitResult {
        self.packet[self.len] = byte;
        self.len += 1;

        if self.len == MAX_PACKET_LEN { self.flush_packet() }
        else { Ok(()) }
    }

    /// Append all bytes, writing every packet that is filled up.
    pub fn write_bytes(&mut self, mut bytes: Bytes<'_>) -> UnitResult {
        while !bytes.is_empty() {
            let count = (MAX_PACKET_LEN - self.len).min(bytes.len());
            let (front, back) = bytes.split_at(count);

            self.packet[self.len .. self.len + count].copy_from_slice(front);
            self.len += count;
            bytes = back;

            if self.len == MAX_PACKET_LEN { self.flush_packet()?; }
        }

        Ok(())
    }

    /// Write the current packet as a sub-block, if it contains any bytes.
    /// Never writes an empty sub-block, as that would end the data.
    pub fn flush_packet(&mut self) -> UnitResult {
        if self.len != 0 {
            (self.len as u8).write(&mut self.write)?;
            u8::write_slice(&mut self.write, &self.packet[.. self.len])?;
            self.len = 0;
        }

        Ok(())
    }

    /// Write the remaining bytes and the terminating empty sub-block.
    pub fn finish(mut self) -> Result<W> {
        self.flush_packet()?;
        0_u8.write(&mut self.write)?;
        Ok(self.write)
    }
}


/// Packs codes of varying width into bytes.
#[derive(Debug)]
pub struct CodeWriter<W> {
    packets: SubBlockWriter<W>,

    /// Holds at most 7 bits between two codes.
    accumulator: u32,
    bit_count: u8,
}

impl<W: Write> CodeWriter<W> {

    /// No bits have been written yet.
    pub fn new(write: W) -> Self {
        CodeWriter { packets: SubBlockWriter::new(write), accumulator: 0, bit_count: 0 }
    }

    /// Append the lowest `bits` bits of the code.
    #[inline]
    pub fn write_code(&mut self, code: Code, bits: u8) -> UnitResult {
        debug_assert!(bits <= super::MAX_CODE_BITS, "code width too large");
        debug_assert!(u32::from(code) < 1 << bits, "code does not fit into width");

        self.accumulator |= u32::from(code) << self.bit_count;
        self.bit_count += bits;

        while self.bit_count >= 8 {
            self.packets.write_byte(self.accumulator as u8)?;
            self.accumulator >>= 8;
            self.bit_count -= 8;
        }

        Ok(())
    }

    /// Pad the last byte with zero bits, then write all remaining packets and the terminator.
    pub fn finish(mut self) -> Result<W> {
        if self.bit_count != 0 {
            self.packets.write_byte(self.accumulator as u8)?;
        }

        self.packets.finish()
    }
}


/// Reads the bytes of all sub-blocks up to and including the empty terminating sub-block.
/// Advances the slice to the first byte after the terminator.
pub fn read_sub_blocks(bytes: &mut Bytes<'_>) -> Result<ByteVec> {
    let mut data = ByteVec::with_capacity(bytes.len());

    loop {
        let len = take_1(bytes)?;
        if len == 0 { return Ok(data); }

        data.extend_from_slice(take_n(bytes, usize::from(len))?);
    }
}

/// Unpacks codes of varying width from the concatenated sub-block contents.
#[derive(Debug, Clone)]
pub struct CodeReader<'b> {
    bytes: Bytes<'b>,
    accumulator: u32,
    bit_count: u8,
}

impl<'b> CodeReader<'b> {

    /// Start at the first bit of the data.
    pub fn new(bytes: Bytes<'b>) -> Self {
        CodeReader { bytes, accumulator: 0, bit_count: 0 }
    }

    /// Returns `None` if not enough bits remain for a whole code.
    #[inline]
    pub fn read_code(&mut self, bits: u8) -> Option<Code> {
        while self.bit_count < bits {
            let byte = take_1(&mut self.bytes).ok()?;
            self.accumulator |= u32::from(byte) << self.bit_count;
            self.bit_count += 8;
        }

        let code = self.accumulator & ((1 << bits) - 1);
        self.accumulator >>= bits;
        self.bit_count -= bits;

        Some(code as Code)
    }
}


fn take_1(slice: &mut Bytes<'_>) -> Result<u8> {
    if let Some((&first, rest)) = slice.split_first() {
        *slice = rest;
        Ok(first)

    } else {
        Err(Error::invalid("missing sub-block terminator"))
    }
}

fn take_n<'s>(slice: &mut Bytes<'s>, n: usize) -> Result<Bytes<'s>> {
    if n <= slice.len() {
        let (front, back) = slice.split_at(n);
        *slice = back;
        Ok(front)

    } else {
        Err(Error::invalid("sub-block length"))
    }
}
