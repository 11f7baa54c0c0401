//! The gif variant of the Lempel-Ziv-Welch compressor.
//! Pixel strings are assigned codes in the order they are first seen,
//! and the string table is cleared whenever all 4096 codes have been assigned.

use super::table::{CodeTable, Probe, Slot};
use super::packets::CodeWriter;
use super::{Code, Compression, MinCodeSize, MAX_CODE_BITS, MAX_CODE_COUNT};
use crate::error::{Error, Result, UnitResult};
use crate::io::Write;


/// The state of the compressor that can be reused for multiple images.
/// Keeps the allocation of the string table, which is cleared before each image.
/// Compressing two images with the same state never influences the output.
#[derive(Debug, Clone, Default)]
pub struct EncoderState {
    table: CodeTable,
}

impl EncoderState {

    /// Allocate an empty string table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compress the pixel indices and write the sub-blocks, including the terminating empty block.
    /// Every pixel index must be smaller than the clear code of the minimum code size.
    /// Returns the writer after everything has been written.
    /// If a write fails, the error is returned immediately and the stream is left incomplete.
    pub fn compress<W: Write>(
        &mut self, compression: Compression, min_code_size: MinCodeSize,
        pixels: impl IntoIterator<Item = u8>, write: W
    ) -> Result<W>
    {
        self.table.clear();

        let mut compressor = Compressor::new(&mut self.table, min_code_size, write);
        compressor.emit(min_code_size.clear_code())?;

        let mut pixels = pixels.into_iter();

        if let Some(first) = pixels.next() {
            compressor.validate(first)?;

            let last_code = match compression {
                Compression::LZW => compressor.compress_strings(first, pixels)?,
                Compression::RLE => compressor.compress_runs(first, pixels)?,
                Compression::Uncompressed => compressor.compress_literals(first, pixels)?,
            };

            compressor.emit(last_code)?;
        }

        compressor.emit(min_code_size.end_code())?;
        compressor.finish()
    }
}


/// The compressor of a single image.
struct Compressor<'t, W> {
    table: &'t mut CodeTable,
    output: CodeWriter<W>,
    min_code_size: MinCodeSize,

    /// The width of the next code that is written.
    code_bits: u8,

    /// The largest code that fits into the current width.
    max_code: Code,

    /// The code that is assigned to the next new string.
    next_code: Code,

    /// The next written code is the clear code, after which the width is reset.
    clear_requested: bool,

    pixel_count: usize,
    clear_count: usize,
}

impl<'t, W: Write> Compressor<'t, W> {
    fn new(table: &'t mut CodeTable, min_code_size: MinCodeSize, write: W) -> Self {
        let code_bits = min_code_size.initial_code_bits();

        Compressor {
            table, min_code_size, code_bits,
            output: CodeWriter::new(write),
            max_code: max_code(code_bits),
            next_code: min_code_size.first_string_code(),
            clear_requested: false,
            pixel_count: 0,
            clear_count: 0,
        }
    }

    /// Rejects pixel indices that would be mistaken for control codes.
    #[inline]
    fn validate(&mut self, pixel: u8) -> UnitResult {
        self.pixel_count += 1;

        if Code::from(pixel) < self.min_code_size.clear_code() { Ok(()) }
        else {
            Err(Error::invalid(format!(
                "pixel index {} with a minimum code size of {} bits",
                pixel, self.min_code_size.bits()
            )))
        }
    }

    /// Write a code with the current width, then adjust the width for the next code.
    fn emit(&mut self, code: Code) -> UnitResult {
        self.output.write_code(code, self.code_bits)?;

        if self.clear_requested {
            self.clear_requested = false;
            self.code_bits = self.min_code_size.initial_code_bits();
            self.max_code = max_code(self.code_bits);
        }

        else if self.next_code > self.max_code {
            self.code_bits += 1;
            self.max_code = max_code(self.code_bits);
            log::trace!("code width grows to {} bits", self.code_bits);
        }

        Ok(())
    }

    /// Assign the next code to the string `prefix` followed by `byte`,
    /// or clear the table if all codes have been assigned.
    /// Without a slot, the string is inserted only if it is unknown,
    /// but the code is consumed in any case, because the decoder assigns it too.
    fn add_string(&mut self, slot: Option<Slot>, prefix: Code, byte: u8) -> UnitResult {
        if self.next_code < MAX_CODE_COUNT {
            let slot = match slot {
                Some(slot) => Some(slot),
                None => match self.table.probe(prefix, byte) {
                    Probe::Vacant(slot) => Some(slot),
                    Probe::Found(_) => None,
                },
            };

            if let Some(slot) = slot {
                self.table.occupy(slot, prefix, byte, self.next_code);
            }

            self.next_code += 1;
            Ok(())
        }

        else {
            self.clear_block()
        }
    }

    /// Forget all strings and tell the decoder to do the same.
    fn clear_block(&mut self) -> UnitResult {
        self.table.clear();
        self.next_code = self.min_code_size.first_string_code();
        self.clear_requested = true;
        self.clear_count += 1;

        log::trace!("clearing string table after {} pixels", self.pixel_count);
        self.emit(self.min_code_size.clear_code())
    }

    /// Extend the current string while it is known, and write its code as soon as it is not.
    /// Returns the code of the unfinished string at the end.
    fn compress_strings(&mut self, first: u8, pixels: impl Iterator<Item = u8>) -> Result<Code> {
        let mut current = Code::from(first);

        for pixel in pixels {
            self.validate(pixel)?;

            match self.table.probe(current, pixel) {
                Probe::Found(code) => current = code,
                Probe::Vacant(slot) => {
                    self.emit(current)?;
                    self.add_string(Some(slot), current, pixel)?;
                    current = Code::from(pixel);
                }
            }
        }

        Ok(current)
    }

    /// Extend the current string only while the pixel index repeats.
    fn compress_runs(&mut self, first: u8, pixels: impl Iterator<Item = u8>) -> Result<Code> {
        let mut current = Code::from(first);
        let mut previous = first;

        for pixel in pixels {
            self.validate(pixel)?;

            let slot = if pixel == previous {
                match self.table.probe(current, pixel) {
                    Probe::Found(code) => { current = code; continue; },
                    Probe::Vacant(slot) => Some(slot),
                }
            }
            else { None };

            self.emit(current)?;
            self.add_string(slot, current, pixel)?;
            current = Code::from(pixel);
            previous = pixel;
        }

        Ok(current)
    }

    /// Write every pixel index as its own code.
    fn compress_literals(&mut self, first: u8, pixels: impl Iterator<Item = u8>) -> Result<Code> {
        let mut current = Code::from(first);

        for pixel in pixels {
            self.validate(pixel)?;
            self.emit(current)?;

            // the table is never consulted, but the decoder still counts the codes
            if self.next_code < MAX_CODE_COUNT { self.next_code += 1; }
            else { self.clear_block()?; }

            current = Code::from(pixel);
        }

        Ok(current)
    }

    fn finish(self) -> Result<W> {
        log::debug!(
            "compressed {} pixels with {} table clears",
            self.pixel_count, self.clear_count
        );

        self.output.finish()
    }
}

/// The largest code with the specified width.
/// At the maximum width, the compressor clears the table instead of growing,
/// so the limit is set to a value that is never exceeded.
#[inline]
fn max_code(bits: u8) -> Code {
    if bits == MAX_CODE_BITS { MAX_CODE_COUNT }
    else { (1 << bits) - 1 }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::{CodeStream, decompress};
    use crate::error::IoResult;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn two_bits() -> MinCodeSize { MinCodeSize::new(2).unwrap() }

    fn noise(count: usize) -> Vec<u8> {
        let mut random = StdRng::seed_from_u64(count as u64);
        (0 .. count).map(|_| random.random::<u8>()).collect()
    }

    #[test]
    fn runs_of_two_colors(){
        let pixels = [0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1];
        let bytes = Compression::LZW.compress_to_vec(two_bits(), pixels.iter().copied()).unwrap();

        // codes 4 0 6 1 with 3 bits, then 8 6 0 8 1 5 with 4 bits
        assert_eq!(bytes, vec![ 5, 0x84, 0x83, 0x06, 0x18, 0x05, 0 ]);
        assert!(bytes.len() - 2 < pixels.len());
    }

    #[test]
    fn empty_image(){
        let bytes = Compression::LZW.compress_to_vec(two_bits(), std::iter::empty()).unwrap();
        assert_eq!(bytes, vec![ 1, 0x2C, 0 ]);

        let eight = MinCodeSize::new(8).unwrap();
        let bytes = Compression::LZW.compress_to_vec(eight, std::iter::empty()).unwrap();
        assert_eq!(bytes, vec![ 3, 0x00, 0x03, 0x02, 0 ]);
    }

    #[test]
    fn single_pixel(){
        let bytes = Compression::LZW.compress_to_vec(two_bits(), vec![ 3 ]).unwrap();

        // 4 3 5 with 3 bits each
        assert_eq!(bytes, vec![ 2, 0b01_011_100, 0b1, 0 ]);
    }

    #[test]
    fn reused_state_is_deterministic(){
        let min_code_size = MinCodeSize::new(4).unwrap();
        let first: Vec<u8> = (0 .. 9000_u32).map(|index| ((index * 7 + index / 13) % 16) as u8).collect();
        let second: Vec<u8> = (0 .. 700_u32).map(|index| (index % 3) as u8).collect();

        let mut state = EncoderState::new();
        let first_bytes = state.compress(Compression::LZW, min_code_size, first.iter().copied(), Vec::new()).unwrap();
        let second_bytes = state.compress(Compression::LZW, min_code_size, second.iter().copied(), Vec::new()).unwrap();
        let first_again = state.compress(Compression::LZW, min_code_size, first.iter().copied(), Vec::new()).unwrap();

        assert_eq!(first_bytes, first_again);
        assert_eq!(second_bytes, Compression::LZW.compress_to_vec(min_code_size, second.iter().copied()).unwrap());
    }

    #[test]
    fn pixel_index_must_fit_code_size(){
        let result = Compression::LZW.compress_to_vec(two_bits(), vec![ 0, 1, 4, 0 ]);
        assert!(matches!(result, Err(Error::Invalid(_))));

        let result = Compression::RLE.compress_to_vec(two_bits(), vec![ 7 ]);
        assert!(matches!(result, Err(Error::Invalid(_))));
    }

    #[test]
    fn full_table_is_cleared(){
        let min_code_size = MinCodeSize::new(8).unwrap();

        // almost every pixel adds a new string
        let pixels = noise(6000);

        for &compression in &[ Compression::LZW, Compression::RLE, Compression::Uncompressed ] {
            let bytes = compression.compress_to_vec(min_code_size, pixels.iter().copied()).unwrap();

            let data = crate::compression::read_sub_blocks(&mut bytes.as_slice()).unwrap();
            let mut codes = CodeStream::new(min_code_size, &data);

            let clears = codes.by_ref()
                .filter(|code| code.code == min_code_size.clear_code())
                .count();

            assert!(clears >= 2, "{}: {} clears", compression, clears);
            assert!(codes.reached_end_code());
            assert_eq!(decompress(min_code_size, &bytes, pixels.len(), true).unwrap(), pixels);
        }
    }

    #[test]
    fn width_grows_until_twelve_bits(){
        let min_code_size = MinCodeSize::new(8).unwrap();
        let pixels = noise(20000);

        let bytes = Compression::LZW.compress_to_vec(min_code_size, pixels.iter().copied()).unwrap();
        let data = crate::compression::read_sub_blocks(&mut bytes.as_slice()).unwrap();

        let mut previous_bits = 0;
        let mut max_bits = 0;

        for code in CodeStream::new(min_code_size, &data) {
            assert!(code.bits >= min_code_size.initial_code_bits());
            assert!(code.bits <= MAX_CODE_BITS);

            // the width only shrinks with a clear code
            if code.bits < previous_bits {
                assert_eq!(code.bits, min_code_size.initial_code_bits());
            }

            previous_bits = code.bits;
            max_bits = max_bits.max(code.bits);
        }

        assert_eq!(max_bits, MAX_CODE_BITS);
    }

    struct FailingWriter { remaining: usize }

    impl Write for FailingWriter {
        fn write(&mut self, buffer: &[u8]) -> IoResult<usize> {
            if self.remaining < buffer.len() {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }

            self.remaining -= buffer.len();
            Ok(buffer.len())
        }

        fn flush(&mut self) -> IoResult<()> { Ok(()) }
    }

    #[test]
    fn write_errors_abort(){
        let pixels: Vec<u8> = (0 .. 5000_u32).map(|index| (index * 31 % 251) as u8).collect();
        let min_code_size = MinCodeSize::new(8).unwrap();

        let result = Compression::LZW.compress_to(min_code_size, pixels, FailingWriter { remaining: 300 });
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
