
//! Data structures that represent a complete gif image with all its frames,
//! and the order in which the pixel indices of a frame are compressed.
//!
//! Create an image with `Image::from_frame` or `Image::from_frames`,
//! then call `image.write().to_file("image.gif")`.

pub mod write;

use smallvec::SmallVec;
use crate::compression::{ByteVec, Compression, EncoderState, MinCodeSize};
use crate::error::{Error, Result, UnitResult};
use crate::math::Vec2;
use crate::meta::Rgb;
use crate::meta::{Palette, Version};
use crate::meta::extension::{Disposal, FrameControl, Repetitions};

pub use self::write::WriteImageWithOptions;


/// The first row and the row step of each of the four interlace passes.
pub const INTERLACE_PASSES: [(usize, usize); 4] = [ (0, 8), (4, 8), (2, 4), (1, 2) ];

const SEQUENTIAL_PASS: [(usize, usize); 1] = [ (0, 1) ];


/// The order in which the rows of a frame are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineOrder {

    /// Every row from top to bottom.
    Sequential,

    /// Four passes over the rows, such that a partially loaded image
    /// already shows a coarse version of the whole frame.
    Interlaced,
}

impl Default for LineOrder {
    fn default() -> Self { LineOrder::Sequential }
}

impl LineOrder {

    /// Whether the image descriptor announces interlacing.
    pub fn is_interlaced(self) -> bool {
        self == LineOrder::Interlaced
    }

    /// The row indices of an image with the specified height, in storage order.
    pub fn rows(self, height: usize) -> Rows {
        let passes: &'static [(usize, usize)] = match self {
            LineOrder::Sequential => &SEQUENTIAL_PASS,
            LineOrder::Interlaced => &INTERLACE_PASSES,
        };

        let remaining = passes.iter()
            .map(|&(start, step)| if start < height { (height - start - 1) / step + 1 } else { 0 })
            .sum();

        Rows { passes, pass: 0, next_row: passes[0].0, height, remaining }
    }

    /// The pixel indices of the source in storage order.
    pub fn pixels<S: GetPixel>(self, size: Vec2<usize>, source: &S) -> Pixels<'_, S> {
        let mut rows = self.rows(size.height());
        let row = rows.next();

        Pixels {
            source, rows, row, x: 0,
            width: size.width(),
            remaining: size.width().saturating_mul(size.height()),
        }
    }
}


/// Iterates the row indices of one frame.
/// Skips interlace passes that contain no rows.
#[derive(Debug, Clone)]
pub struct Rows {
    passes: &'static [(usize, usize)],
    pass: usize,
    next_row: usize,
    height: usize,
    remaining: usize,
}

impl Iterator for Rows {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            let &(_, step) = self.passes.get(self.pass)?;

            if self.next_row < self.height {
                let row = self.next_row;
                self.next_row = self.next_row.saturating_add(step);
                self.remaining -= 1;
                return Some(row);
            }

            self.pass += 1;
            if let Some(&(start, _)) = self.passes.get(self.pass) {
                self.next_row = start;
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Rows {}
impl std::iter::FusedIterator for Rows {}


/// Provides the color table index of each pixel of a frame.
/// Implemented for closures of the form `|position| index`.
pub trait GetPixel: Sync {

    /// The color table index at the requested position.
    /// The position will not exceed the frame size.
    /// Might be called from multiple threads at the same time.
    fn get_pixel(&self, position: Vec2<usize>) -> u8;
}

impl<F> GetPixel for F where F: Sync + Fn(Vec2<usize>) -> u8 {
    fn get_pixel(&self, position: Vec2<usize>) -> u8 { self(position) }
}


/// Iterates the pixel indices of one frame, row by row in the order of the `LineOrder`.
/// Yields exactly `width * height` indices.
#[derive(Debug, Clone)]
pub struct Pixels<'s, S> {
    source: &'s S,
    rows: Rows,
    row: Option<usize>,
    x: usize,
    width: usize,
    remaining: usize,
}

impl<S: GetPixel> Iterator for Pixels<'_, S> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.width == 0 { return None; }

        loop {
            let y = self.row?;

            if self.x < self.width {
                let index = self.source.get_pixel(Vec2(self.x, y));
                self.x += 1;
                self.remaining -= 1;
                return Some(index);
            }

            self.row = self.rows.next();
            self.x = 0;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<S: GetPixel> ExactSizeIterator for Pixels<'_, S> {}
impl<S: GetPixel> std::iter::FusedIterator for Pixels<'_, S> {}


/// Borrows the color table indices of a frame from a buffer of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedPixels<'p> {
    indices: &'p [u8],
    size: Vec2<usize>,
    row_stride: usize,
}

impl<'p> IndexedPixels<'p> {

    /// Rows without any gaps. Returns an error if the buffer does not contain exactly `width * height` indices.
    pub fn new(indices: &'p [u8], size: impl Into<Vec2<usize>>) -> Result<Self> {
        let size = size.into();

        if size.checked_area() != Some(indices.len()) {
            return Err(Error::invalid(format!(
                "{} pixel indices for an image of {} by {} pixels",
                indices.len(), size.width(), size.height()
            )));
        }

        Ok(IndexedPixels { indices, size, row_stride: size.width() })
    }

    /// Rows that start `row_stride` indices apart, possibly with unused bytes at the end of each row.
    pub fn with_row_stride(indices: &'p [u8], size: impl Into<Vec2<usize>>, row_stride: usize) -> Result<Self> {
        let size = size.into();

        if row_stride < size.width() {
            return Err(Error::invalid("row stride smaller than width"));
        }

        let required = match size.height() {
            0 => Some(0),
            height => row_stride.checked_mul(height - 1).and_then(|start| start.checked_add(size.width())),
        };

        if required.map_or(true, |required| indices.len() < required) {
            return Err(Error::invalid("too few pixel indices for row stride"));
        }

        Ok(IndexedPixels { indices, size, row_stride })
    }

    /// The width and height of the frame.
    pub fn size(&self) -> Vec2<usize> { self.size }

    /// The index at the position, which must be within the size.
    #[inline]
    pub fn get(&self, position: Vec2<usize>) -> u8 {
        debug_assert!(position.x() < self.size.width() && position.y() < self.size.height(), "pixel position out of bounds");
        self.indices[position.y() * self.row_stride + position.x()]
    }

    /// The rows of the frame, excluding the gap at the end of each row.
    pub fn rows(&self) -> impl '_ + Iterator<Item = &'p [u8]> {
        let width = self.size.width();
        let indices = self.indices;

        (0 .. self.size.height()).map(move |y| {
            let start = y * self.row_stride;
            &indices[start .. start + width]
        })
    }

    /// The largest index of the frame, or none for empty frames.
    pub fn max_index(&self) -> Option<u8> {
        self.rows().filter_map(|row| row.iter().copied().max()).max()
    }

    /// All indices in storage order.
    pub fn pixels(&self, line_order: LineOrder) -> Pixels<'_, Self> {
        line_order.pixels(self.size, self)
    }
}

impl GetPixel for IndexedPixels<'_> {
    fn get_pixel(&self, position: Vec2<usize>) -> u8 { self.get(position) }
}


/// A single picture of the image, placed somewhere on the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<'p> {

    /// The color table indices.
    pub pixels: IndexedPixels<'p>,

    /// The top left corner on the screen.
    pub position: Vec2<usize>,

    /// The order in which the rows are compressed.
    pub line_order: LineOrder,

    /// Timing and transparency.
    pub control: FrameControl,
}

impl<'p> Frame<'p> {

    /// A sequential frame in the top left corner of the screen.
    pub fn new(pixels: IndexedPixels<'p>) -> Self {
        Frame { pixels, position: Vec2(0, 0), line_order: LineOrder::Sequential, control: FrameControl::default() }
    }

    /// Place the frame somewhere else on the screen.
    pub fn at(self, position: impl Into<Vec2<usize>>) -> Self {
        Frame { position: position.into(), ..self }
    }

    /// Store the rows in interlace order.
    pub fn interlaced(self) -> Self {
        Frame { line_order: LineOrder::Interlaced, ..self }
    }

    /// Show this frame for the specified hundredths of a second.
    pub fn with_delay(mut self, centiseconds: u16) -> Self {
        self.control.delay = centiseconds;
        self
    }

    /// Specify what happens to this frame when the next frame is drawn.
    pub fn with_disposal(mut self, disposal: Disposal) -> Self {
        self.control.disposal = disposal;
        self
    }

    /// Do not draw pixels with this index.
    pub fn with_transparent_index(mut self, index: u8) -> Self {
        self.control.transparent_index = Some(index);
        self
    }

    /// The width and height of this frame.
    pub fn size(&self) -> Vec2<usize> { self.pixels.size() }

    /// Compress the pixel indices into sub-blocks, using the table allocation of the state.
    pub fn compress_image_data(
        &self, state: &mut EncoderState,
        compression: Compression, min_code_size: MinCodeSize
    ) -> Result<ByteVec>
    {
        let pixels = self.pixels.pixels(self.line_order);
        let pixel_count = pixels.len();

        let bytes = state.compress(compression, min_code_size, pixels, ByteVec::new())?;
        log::debug!("{} pixels compressed to {} bytes with {}", pixel_count, bytes.len(), compression);

        Ok(bytes)
    }
}


/// The frames of an image. Most images have only one frame.
pub type Frames<'p> = SmallVec<[Frame<'p>; 1]>;

/// A complete gif image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image<'p> {

    /// The size of the canvas.
    pub screen_size: Vec2<usize>,

    /// The global color table, used by all frames.
    pub palette: Palette,

    /// The color table index of the area that no frame covers.
    pub background_index: u8,

    /// The frames, in display order.
    pub frames: Frames<'p>,

    /// Written to a comment extension. An empty comment is not written.
    pub comment: String,

    /// How often an animation is played. Ignored for images with a single frame.
    pub repetitions: Option<Repetitions>,
}

impl<'p> Image<'p> {

    /// An image with a screen that exactly fits the single frame.
    pub fn from_frame(palette: Palette, frame: Frame<'p>) -> Self {
        Self::from_frames(palette, smallvec![ frame ])
    }

    /// An image with a screen that fits all frames.
    pub fn from_frames(palette: Palette, frames: impl Into<Frames<'p>>) -> Self {
        let frames = frames.into();

        let screen_size = frames.iter()
            .map(|frame| frame.position.saturating_add(frame.size()))
            .fold(Vec2(0, 0), Vec2::max);

        Image {
            screen_size, palette, frames,
            background_index: 0,
            comment: String::new(),
            repetitions: None,
        }
    }

    /// Use a larger or smaller canvas.
    pub fn with_screen_size(self, screen_size: impl Into<Vec2<usize>>) -> Self {
        Image { screen_size: screen_size.into(), ..self }
    }

    /// Fill the area that no frame covers with this color.
    pub fn with_background_index(self, background_index: u8) -> Self {
        Image { background_index, ..self }
    }

    /// Add a text to the file.
    pub fn with_comment(self, comment: impl Into<String>) -> Self {
        Image { comment: comment.into(), ..self }
    }

    /// Specify how often the animation is played.
    pub fn with_repetitions(self, repetitions: Repetitions) -> Self {
        Image { repetitions: Some(repetitions), ..self }
    }

    /// Whether the image has more than one frame.
    pub fn is_animated(&self) -> bool {
        self.frames.len() > 1
    }

    /// Whether the netscape loop extension is written.
    pub fn writes_repetitions(&self) -> bool {
        self.is_animated() && self.repetitions.is_some()
    }

    /// The oldest format revision that supports all features of this image.
    pub fn version(&self) -> Version {
        let animated = self.is_animated();
        let needs_extensions = !self.comment.is_empty()
            || self.writes_repetitions()
            || self.frames.iter().any(|frame| frame.control.is_required(animated));

        if needs_extensions { Version::Gif89a } else { Version::Gif87a }
    }

    /// Check that other gif software can open this image.
    /// Sizes must fit into 16 bits and all frames must be on the screen.
    /// The background index and all pixel indices must address the padded color table.
    pub fn validate(&self) -> UnitResult {
        self.screen_size.to_u16("screen size")?;

        let table_len = self.palette.table_len();

        if usize::from(self.background_index) >= table_len {
            return Err(Error::invalid(format!(
                "background index {} for a color table of {} colors", self.background_index, table_len
            )));
        }

        for frame in &self.frames {
            frame.position.to_u16("frame position")?;
            frame.size().to_u16("frame size")?;

            let end = frame.position + frame.size();
            if end.width() > self.screen_size.width() || end.height() > self.screen_size.height() {
                return Err(Error::invalid("frame outside of screen"));
            }

            if let Some(max) = frame.pixels.max_index() {
                if usize::from(max) >= table_len {
                    return Err(Error::invalid(format!(
                        "pixel index {} for a color table of {} colors", max, table_len
                    )));
                }
            }
        }

        Ok(())
    }

    /// Create a temporary writer, which can be configured and used to write the image to a file.
    pub fn write(&self) -> WriteImageWithOptions<'_, 'p, fn(f64)> {
        WriteImageWithOptions::new(self)
    }
}


/// Write a single frame with the colors of the palette to a file.
/// Have a look at `Image` for animations, transparency and interlacing.
pub fn write_indexed_file(
    path: impl AsRef<std::path::Path>, size: impl Into<Vec2<usize>>,
    colors: impl Into<Vec<Rgb>>, indices: &[u8]
) -> UnitResult
{
    let pixels = IndexedPixels::new(indices, size)?;
    Image::from_frame(Palette::new(colors)?, Frame::new(pixels)).write().to_file(path)
}
