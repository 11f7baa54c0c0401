
//! Specialized binary input and output.
//! Uses the error handling for this crate.

pub use ::std::io::Write;
use lebe::prelude::*;
use crate::error::{UnitResult, IoResult};
use std::fs::File;
use std::path::Path;


/// Keep track of how many bytes have been written.
/// Used to report the size of compressed data.
#[derive(Debug)]
pub struct Tracking<T> {

    /// Do not expose to prevent writing without updating position
    inner: T,

    position: usize,
}

impl<T: Write> Write for Tracking<T> {
    fn write(&mut self, buffer: &[u8]) -> IoResult<usize> {
        let count = self.inner.write(buffer)?;
        self.position += count;
        Ok(count)
    }

    fn flush(&mut self) -> IoResult<()> {
        self.inner.flush()
    }
}

impl<T> Tracking<T> {

    /// Start counting at zero.
    pub fn new(inner: T) -> Self {
        Tracking { inner, position: 0 }
    }

    /// Current number of bytes written.
    pub fn byte_position(&self) -> usize {
        self.position
    }

    /// Stop counting and return the wrapped value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}


/// Generic trait that defines how a primitive is written to a gif file.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this would consume in a gif file.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Write this value to the writer.
    fn write(self, write: &mut impl Write) -> UnitResult;

    /// Write all values of that slice to the writer.
    fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult;
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            #[inline]
            fn write(self, write: &mut impl Write) -> UnitResult {
                write.write_as_little_endian(&self)?;
                Ok(())
            }

            #[inline]
            fn write_slice(write: &mut impl Write, slice: &[Self]) -> UnitResult {
                write.write_as_little_endian(slice)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);


/// Create a file and write to it using the closure.
/// If the closure fails, the partially written file is deleted,
/// because a gif stream cannot be repaired after an aborted compression.
pub fn attempt_delete_file_on_write_error(
    path: &Path, write: impl FnOnce(File) -> UnitResult
) -> UnitResult
{
    match write(File::create(path)?) {
        Err(error) => {
            // the write error is more interesting than a failed cleanup
            let _deleted = std::fs::remove_file(path);
            Err(error)
        },

        ok => ok,
    }
}
