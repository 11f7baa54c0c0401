//! Reading compressed gif image data.
//! Tracks the code width exactly as the compressor does,
//! which allows inspecting the raw codes of a stream as well as decompressing it.

use smallvec::SmallVec;
use super::packets::{CodeReader, read_sub_blocks};
use super::{Code, ByteVec, Bytes, MinCodeSize, MAX_CODE_BITS, MAX_CODE_COUNT};
use crate::error::{Error, Result};


/// A single code and the width it was stored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PackedCode {

    /// The value of the code.
    pub code: Code,

    /// The number of bits this code occupied in the stream.
    pub bits: u8,
}

/// Iterates the raw codes in the concatenated contents of the sub-blocks.
/// Stops after the end code, or when the data ends.
#[derive(Debug, Clone)]
pub struct CodeStream<'b> {
    reader: CodeReader<'b>,
    min_code_size: MinCodeSize,
    code_bits: u8,
    next_code: Code,
    after_clear: bool,
    reached_end: bool,
}

impl<'b> CodeStream<'b> {

    /// Starts with the initial code width, as if a clear code had been read.
    /// The data must not contain the length bytes of the sub-blocks, see `read_sub_blocks`.
    pub fn new(min_code_size: MinCodeSize, data: Bytes<'b>) -> Self {
        CodeStream {
            reader: CodeReader::new(data),
            min_code_size,
            code_bits: min_code_size.initial_code_bits(),
            next_code: min_code_size.first_string_code(),
            after_clear: true,
            reached_end: false,
        }
    }

    /// Whether the end code has been read.
    pub fn reached_end_code(&self) -> bool {
        self.reached_end
    }

    /// The code that the next new string will be assigned.
    pub fn next_string_code(&self) -> Code {
        self.next_code
    }
}

impl Iterator for CodeStream<'_> {
    type Item = PackedCode;

    fn next(&mut self) -> Option<PackedCode> {
        if self.reached_end { return None; }

        let bits = self.code_bits;
        let code = self.reader.read_code(bits)?;

        if code == self.min_code_size.clear_code() {
            self.code_bits = self.min_code_size.initial_code_bits();
            self.next_code = self.min_code_size.first_string_code();
            self.after_clear = true;
        }

        else if code == self.min_code_size.end_code() {
            self.reached_end = true;
        }

        else {
            // every code except the first after a clear completes a new string
            if !self.after_clear && self.next_code < MAX_CODE_COUNT {
                self.next_code += 1;

                if self.next_code == 1 << self.code_bits && self.code_bits < MAX_CODE_BITS {
                    self.code_bits += 1;
                }
            }

            self.after_clear = false;
        }

        Some(PackedCode { code, bits })
    }
}

impl std::iter::FusedIterator for CodeStream<'_> {}


#[derive(Debug, Clone, Copy)]
struct StringEntry {
    prefix: Option<Code>,
    last: u8,
    first: u8,
}

/// The strings of the decoder, indexed by their code.
#[derive(Debug)]
struct Strings {
    entries: Vec<StringEntry>,
    first_string_code: usize,
}

impl Strings {
    fn new(min_code_size: MinCodeSize) -> Self {
        let first_string_code = usize::from(min_code_size.first_string_code());
        let mut entries = Vec::with_capacity(usize::from(MAX_CODE_COUNT));

        // the control codes get placeholders that are never referenced
        entries.extend((0 .. first_string_code).map(|code| {
            let pixel = code as u8;
            StringEntry { prefix: None, last: pixel, first: pixel }
        }));

        Strings { entries, first_string_code }
    }

    fn clear(&mut self) {
        self.entries.truncate(self.first_string_code);
    }

    fn next_code(&self) -> Code {
        self.entries.len() as Code
    }

    fn first(&self, code: Code) -> u8 {
        self.entries[usize::from(code)].first
    }

    fn push(&mut self, prefix: Code, last: u8) {
        if self.entries.len() < usize::from(MAX_CODE_COUNT) {
            let first = self.first(prefix);
            self.entries.push(StringEntry { prefix: Some(prefix), last, first });
        }
    }

    fn append_to(&self, code: Code, pixels: &mut ByteVec) {
        let mut reversed: SmallVec<[u8; 64]> = SmallVec::new();
        let mut entry = self.entries[usize::from(code)];

        loop {
            reversed.push(entry.last);

            match entry.prefix {
                Some(prefix) => entry = self.entries[usize::from(prefix)],
                None => break,
            }
        }

        pixels.extend(reversed.iter().rev());
    }
}


/// Decompress a complete gif image data stream, given as sub-blocks including the terminator.
/// Malformed codes are always an error.
/// If `pedantic` is set, a missing end code, bytes after the terminator,
/// and a pixel count different from `expected_pixel_count` are errors too.
/// Otherwise, the pixels are truncated or padded with zeroes to the expected count.
/// Decoding stops at the first code after `expected_pixel_count` pixels.
pub fn decompress(
    min_code_size: MinCodeSize, sub_blocks: Bytes<'_>,
    expected_pixel_count: usize, pedantic: bool
) -> Result<ByteVec>
{
    let mut remaining = sub_blocks;
    let data = read_sub_blocks(&mut remaining)?;

    if pedantic && !remaining.is_empty() {
        return Err(Error::invalid("bytes after sub-block terminator"));
    }

    let mut strings = Strings::new(min_code_size);
    let mut codes = CodeStream::new(min_code_size, &data);
    let mut pixels = ByteVec::with_capacity(expected_pixel_count.min(8 * 2048));
    let mut previous: Option<Code> = None;

    let clear_code = min_code_size.clear_code();
    let end_code = min_code_size.end_code();

    for PackedCode { code, .. } in codes.by_ref() {
        if code == clear_code {
            strings.clear();
            previous = None;
            continue;
        }

        if code == end_code { break; }

        // a single short code can stand for thousands of pixels
        if pixels.len() >= expected_pixel_count {
            if pedantic { return Err(Error::invalid("more pixels than expected")); }
            break;
        }

        match previous {
            None => {
                if code >= clear_code {
                    return Err(Error::invalid("string code before any pixel index"));
                }

                pixels.push(code as u8);
            },

            Some(previous) => {
                let next_code = strings.next_code();

                let first = if code < next_code { strings.first(code) }
                    else if code == next_code { strings.first(previous) }
                    else { return Err(Error::invalid("lzw code")) };

                strings.push(previous, first);
                strings.append_to(code, &mut pixels);
            },
        }

        previous = Some(code);
    }

    if pedantic {
        if !codes.reached_end_code() {
            return Err(Error::invalid("missing end code"));
        }

        if pixels.len() != expected_pixel_count {
            return Err(Error::invalid("decompressed pixel count"));
        }
    }

    pixels.resize(expected_pixel_count, 0);
    Ok(pixels)
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::Compression;
    use crate::compression::packets::CodeWriter;

    fn two_bits() -> MinCodeSize { MinCodeSize::new(2).unwrap() }

    #[test]
    fn raw_codes_of_known_stream(){
        let data = [ 0x84, 0x83, 0x06, 0x18, 0x05 ];
        let codes: Vec<(Code, u8)> = CodeStream::new(two_bits(), &data)
            .map(|packed| (packed.code, packed.bits))
            .collect();

        assert_eq!(codes, vec![
            (4, 3), (0, 3), (6, 3), (1, 3),
            (8, 4), (6, 4), (0, 4), (8, 4), (1, 4), (5, 4),
        ]);
    }

    #[test]
    fn decompresses_known_stream(){
        let stream = [ 5, 0x84, 0x83, 0x06, 0x18, 0x05, 0 ];
        let pixels = decompress(two_bits(), &stream, 12, true).unwrap();
        assert_eq!(pixels, vec![ 0, 0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1 ]);
    }

    #[test]
    fn string_code_of_current_string(){
        // a run of one index references the string that is just being defined
        let pixels = vec![ 2; 40 ];
        let stream = Compression::LZW.compress_to_vec(two_bits(), pixels.iter().copied()).unwrap();
        assert_eq!(decompress(two_bits(), &stream, pixels.len(), true).unwrap(), pixels);
    }

    #[test]
    fn lenient_about_pixel_count(){
        let stream = [ 5, 0x84, 0x83, 0x06, 0x18, 0x05, 0 ];

        assert!(decompress(two_bits(), &stream, 10, true).is_err());
        assert_eq!(decompress(two_bits(), &stream, 10, false).unwrap().len(), 10);

        let padded = decompress(two_bits(), &stream, 14, false).unwrap();
        assert_eq!(&padded[12 ..], &[ 0, 0 ]);
    }

    #[test]
    fn missing_end_code(){
        // clear code and one pixel, then padding
        let stream = [ 1, 0b00_001_100, 0 ];

        assert!(matches!(decompress(two_bits(), &stream, 1, true), Err(Error::Invalid(_))));
        assert_eq!(decompress(two_bits(), &stream, 1, false).unwrap(), vec![ 1 ]);
    }

    #[test]
    fn malformed_codes(){
        // clear code, then the string code 6 that is not yet defined
        let stream = [ 1, 0b00_110_100, 0 ];
        assert!(matches!(decompress(two_bits(), &stream, 1, false), Err(Error::Invalid(_))));

        // clear code, pixel 0, then code 7 while only 6 could be defined
        let stream = [ 2, 0b11_000_100, 0b1, 0 ];
        assert!(matches!(decompress(two_bits(), &stream, 2, false), Err(Error::Invalid(_))));

        assert!(decompress(two_bits(), &[ 3, 1 ], 1, false).is_err());
    }

    #[test]
    fn stops_after_expected_pixel_count(){
        let min_code_size = MinCodeSize::MAX;
        let mut codes = CodeWriter::new(Vec::new());
        let mut bits = min_code_size.initial_code_bits();
        let mut next_code = min_code_size.first_string_code();

        codes.write_code(min_code_size.clear_code(), bits).unwrap();
        codes.write_code(0, bits).unwrap();

        // every code references the string that it defines, so each string is one pixel longer
        let chain = (next_code .. MAX_CODE_COUNT).chain(std::iter::repeat(MAX_CODE_COUNT - 1).take(2000));
        for code in chain {
            codes.write_code(code, bits).unwrap();

            if next_code < MAX_CODE_COUNT {
                next_code += 1;
                if next_code == 1 << bits && bits < MAX_CODE_BITS { bits += 1; }
            }
        }

        codes.write_code(min_code_size.end_code(), bits).unwrap();
        let stream = codes.finish().unwrap();

        // would be millions of pixels if decoded completely
        assert_eq!(decompress(min_code_size, &stream, 10, false).unwrap(), vec![ 0; 10 ]);
        assert!(matches!(decompress(min_code_size, &stream, 10, true), Err(Error::Invalid(_))));
        assert!(matches!(decompress(min_code_size, &stream, 0, true), Err(Error::Invalid(_))));
    }
}
