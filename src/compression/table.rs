//! The string table of the compressor.
//! Maps a known string plus one more pixel index to the code of the extended string,
//! using open addressing with double hashing.

use super::Code;


/// A prime number of slots, comfortably larger than the 4096 codes a table can ever hold.
pub const TABLE_SIZE: usize = 5003;

/// How far the pixel index is shifted before mixing it with the prefix code.
/// Chosen such that the primary hash spreads over the whole table.
const HASH_SHIFT: u32 = hash_shift();

const fn hash_shift() -> u32 {
    let mut shift = 0;
    let mut size = TABLE_SIZE;

    while size < 1 << 16 {
        size *= 2;
        shift += 1;
    }

    8 - shift
}


/// The position of a vacant slot, as returned by a failed lookup.
/// Only valid until the table is modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

/// The result of looking up a string in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {

    /// The string is known and has this code.
    Found(Code),

    /// The string is unknown. It can be inserted at this slot.
    Vacant(Slot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    key: u32,
    code: Code,
}

/// Remembers the code of every string that the compressor has seen since the last clear.
#[derive(Clone)]
pub struct CodeTable {
    slots: Box<[Option<Entry>]>,
    len: usize,
}

impl Default for CodeTable {
    fn default() -> Self {
        CodeTable { slots: vec![None; TABLE_SIZE].into_boxed_slice(), len: 0 }
    }
}

impl std::fmt::Debug for CodeTable {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("CodeTable").field("len", &self.len()).finish()
    }
}

impl CodeTable {

    /// The number of strings in the table.
    #[inline] pub fn len(&self) -> usize { self.len }

    /// Whether the table contains no strings.
    #[inline] pub fn is_empty(&self) -> bool { self.len == 0 }

    #[inline]
    fn key(prefix: Code, byte: u8) -> u32 {
        (u32::from(byte) << 12) + u32::from(prefix)
    }

    /// Find the code of the string `prefix` followed by `byte`.
    pub fn probe(&self, prefix: Code, byte: u8) -> Probe {
        debug_assert!(prefix < super::MAX_CODE_COUNT, "prefix code out of range");

        let key = Self::key(prefix, byte);
        let mut index = ((usize::from(byte) << HASH_SHIFT) ^ usize::from(prefix)) % TABLE_SIZE;

        let step = if index == 0 { 1 } else { TABLE_SIZE - index };

        // terminates because the table never holds more than 4096 of the 5003 slots
        loop {
            match self.slots[index] {
                None => return Probe::Vacant(Slot(index)),
                Some(entry) if entry.key == key => return Probe::Found(entry.code),
                Some(_) => {
                    index = if index >= step { index - step } else { index + TABLE_SIZE - step };
                }
            }
        }
    }

    /// Insert the string `prefix` followed by `byte` at a slot returned by `probe`.
    pub fn occupy(&mut self, slot: Slot, prefix: Code, byte: u8, code: Code) {
        debug_assert!(self.slots[slot.0].is_none(), "slot already occupied");
        debug_assert!(self.len < TABLE_SIZE - 1, "table overflow");

        self.slots[slot.0] = Some(Entry { key: Self::key(prefix, byte), code });
        self.len += 1;
    }

    /// Forget all strings.
    pub fn clear(&mut self) {
        if !self.is_empty() {
            for slot in self.slots.iter_mut() { *slot = None; }
            self.len = 0;
        }
    }
}
