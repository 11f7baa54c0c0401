
//! Write a gif image to a file.
//!
//! First, call `my_image.write()`. The resulting value can be customized, like this:
//! ```no_run
//!     use giflzw::prelude::*;
//! #   let my_image: Image<'_> = unimplemented!();
//!
//!     my_image.write()
//!            .on_progress(|progress| println!("progress: {:.1}", progress*100.0))
//!            .to_file("image.gif").unwrap();
//! ```
//!

use std::io::BufWriter;
use crate::compression::{ByteVec, Compression, EncoderState, MinCodeSize};
use crate::error::{Result, UnitResult};
use crate::image::{Frame, Image};
use crate::io::{Data, Tracking, Write};
use crate::meta::{ImageDescriptor, ScreenDescriptor, TRAILER};
use crate::meta::extension::write_comment;


/// A temporary writer which can be configured and used to write an image to a file.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteImageWithOptions<'i, 'p, OnProgress> {
    image: &'i Image<'p>,
    on_progress: OnProgress,
    compression: Compression,
    check_compatibility: bool,
    parallel: bool,
}

fn ignore_progress(_progress: f64) {}

impl<'i, 'p> WriteImageWithOptions<'i, 'p, fn(f64)> {

    /// Compress with lzw, in parallel if possible, and check compatibility.
    pub fn new(image: &'i Image<'p>) -> Self {
        WriteImageWithOptions {
            image,
            on_progress: ignore_progress,
            compression: Compression::default(),
            check_compatibility: true,
            parallel: true,
        }
    }
}

impl<'i, 'p, OnProgress> WriteImageWithOptions<'i, 'p, OnProgress> where OnProgress: FnMut(f64) {

    /// Do not compress multiple frames on multiple threads at once.
    /// Uses less memory, as each frame is written as soon as it is compressed.
    pub fn non_parallel(self) -> Self { Self { parallel: false, ..self } }

    /// Skip the checks that ensure a file can be opened by other gif software.
    /// Pixel indices that do not fit the minimum code size are still rejected.
    pub fn skip_compatibility_checks(self) -> Self { Self { check_compatibility: false, ..self } }

    /// Use another method to compress the pixel indices.
    pub fn with_compression(self, compression: Compression) -> Self { Self { compression, ..self } }

    /// Specify a function to be called after each frame has been written.
    /// Replaces all previously specified progress functions in this writer.
    pub fn on_progress<F: FnMut(f64)>(self, on_progress: F) -> WriteImageWithOptions<'i, 'p, F> {
        WriteImageWithOptions {
            on_progress,
            image: self.image,
            compression: self.compression,
            check_compatibility: self.check_compatibility,
            parallel: self.parallel,
        }
    }

    /// Write the gif image to a file.
    /// Use `to_unbuffered` instead, if you do not have a file.
    /// If an error occurs, attempts to delete the partially written file.
    #[inline]
    pub fn to_file(self, path: impl AsRef<std::path::Path>) -> UnitResult {
        crate::io::attempt_delete_file_on_write_error(path.as_ref(), move |write|
            self.to_unbuffered(write)
        )
    }

    /// Buffer the writer and then write the gif image to it.
    /// Use `to_buffered` instead, if your writer is an in-memory buffer.
    /// Use `to_file` instead, if you have a file path.
    #[inline]
    pub fn to_unbuffered(self, unbuffered: impl Write) -> UnitResult {
        let mut buffered = BufWriter::new(unbuffered);
        self.to_buffered(&mut buffered)?;
        buffered.flush()?;
        Ok(())
    }

    /// Write the gif image to a writer.
    /// Use `to_file` instead, if you have a file path.
    /// Use `to_unbuffered` instead, if this is not an in-memory writer.
    /// Returns the first failed write. Everything written until then must be discarded.
    pub fn to_buffered(mut self, write: impl Write) -> UnitResult {
        let image = self.image;
        if self.check_compatibility { image.validate()?; }

        let min_code_size = image.palette.min_code_size()?;
        let animated = image.is_animated();
        let mut write = Tracking::new(write);

        image.version().write(&mut write)?;

        ScreenDescriptor {
            size: image.screen_size.to_u16("screen size")?,
            bits_per_pixel: image.palette.bits_per_pixel(),
            background_index: image.background_index,
        }.write(&mut write)?;

        image.palette.write(&mut write)?;

        if let (true, Some(repetitions)) = (animated, image.repetitions) {
            repetitions.write(&mut write)?;
        }

        write_comment(&image.comment, &mut write)?;

        let frame_count = image.frames.len();
        (self.on_progress)(0.0);

        let compressed = if self.parallel && frame_count > 1 {
            compress_frames_in_parallel(&image.frames, self.compression, min_code_size)
        } else { None };

        match compressed {
            Some(compressed) => {
                for (index, (frame, data)) in image.frames.iter().zip(compressed).enumerate() {
                    write_frame_header(frame, animated, min_code_size, &mut write)?;
                    u8::write_slice(&mut write, &data?)?;
                    (self.on_progress)((index + 1) as f64 / frame_count as f64);
                }
            },

            None => {
                let mut state = EncoderState::new();

                for (index, frame) in image.frames.iter().enumerate() {
                    write_frame_header(frame, animated, min_code_size, &mut write)?;

                    let start = write.byte_position();
                    let pixels = frame.pixels.pixels(frame.line_order);
                    state.compress(self.compression, min_code_size, pixels, &mut write)?;

                    log::debug!(
                        "frame {} of {} compressed to {} bytes with {}",
                        index + 1, frame_count, write.byte_position() - start, self.compression
                    );

                    (self.on_progress)((index + 1) as f64 / frame_count as f64);
                }
            },
        }

        TRAILER.write(&mut write)?;
        log::debug!("wrote {} bytes of gif image data", write.byte_position());
        Ok(())
    }
}


/// Write the graphic control extension if required, the image descriptor,
/// and the minimum code size that precedes the compressed data.
fn write_frame_header(frame: &Frame<'_>, animated: bool, min_code_size: MinCodeSize, write: &mut impl Write) -> UnitResult {
    if frame.control.is_required(animated) {
        frame.control.write(animated, write)?;
    }

    ImageDescriptor {
        position: frame.position.to_u16("frame position")?,
        size: frame.size().to_u16("frame size")?,
        interlaced: frame.line_order.is_interlaced(),
    }.write(write)?;

    min_code_size.bits().write(write)
}

/// Compress each frame on its own thread, with its own encoder state.
/// Returns none if no thread pool is available.
#[cfg(feature = "rayon")]
fn compress_frames_in_parallel(
    frames: &[Frame<'_>], compression: Compression, min_code_size: MinCodeSize
) -> Option<Vec<Result<ByteVec>>>
{
    let pool = rayon_core::ThreadPoolBuilder::new()
        .thread_name(|index| format!("GIF Frame Compressor Thread #{}", index))
        .num_threads(frames.len().min(rayon_core::current_num_threads()))
        .build();

    // in case thread pool creation fails (for example on wasm),
    // we revert to sequential compression
    let pool = match pool {
        Ok(pool) => pool,
        Err(error) => {
            log::debug!("compressing frames sequentially: {}", error);
            return None;
        }
    };

    let mut compressed: Vec<Option<Result<ByteVec>>> = frames.iter().map(|_| None).collect();

    pool.scope(|scope| {
        for (frame, slot) in frames.iter().zip(compressed.iter_mut()) {
            scope.spawn(move |_| {
                let mut state = EncoderState::new();
                *slot = Some(frame.compress_image_data(&mut state, compression, min_code_size));
            });
        }
    });

    // the scope has waited for every task, so every slot is filled
    compressed.into_iter().collect()
}

#[cfg(not(feature = "rayon"))]
fn compress_frames_in_parallel(
    _frames: &[Frame<'_>], _compression: Compression, _min_code_size: MinCodeSize
) -> Option<Vec<Result<ByteVec>>>
{
    None
}
