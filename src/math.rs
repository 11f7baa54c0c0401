
//! Simple math utilities.

use std::convert::TryFrom;
use crate::error::{Result, usize_to_u16};

/// Simple two-dimensional vector of any numerical type.
/// Supports only few mathematical operations
/// as this is used mainly as data struct.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vec2<T> (pub T, pub T);

impl<T> Vec2<T> {

    /// Returns the vector with the maximum of either coordinates.
    pub fn max(self, other: Self) -> Self where T: Ord {
        Vec2(self.0.max(other.0), self.1.max(other.1))
    }

    /// Seeing this vector as a dimension or size (width and height),
    /// this returns the area that this dimensions contains (`width * height`).
    #[inline] pub fn area(self) -> T where T: std::ops::Mul<T, Output = T> {
        self.0 * self.1
    }

    /// The first component of this 2D vector.
    #[inline] pub fn x(self) -> T { self.0 }

    /// The second component of this 2D vector.
    #[inline] pub fn y(self) -> T { self.1 }

    /// The first component of this 2D vector.
    #[inline] pub fn width(self) -> T { self.0 }

    /// The second component of this 2D vector.
    #[inline] pub fn height(self) -> T { self.1 }
}


impl Vec2<usize> {

    /// Convert to the 16 bit coordinates of a gif file, returning an error on too large numbers.
    pub fn to_u16(self, error_message: &'static str) -> Result<Vec2<u16>> {
        let x = usize_to_u16(self.0, error_message)?;
        let y = usize_to_u16(self.1, error_message)?;
        Ok(Vec2(x, y))
    }

    /// The area, or `None` if it does not fit into `usize`.
    pub fn checked_area(self) -> Option<usize> {
        self.0.checked_mul(self.1)
    }

    /// Add both coordinates, clamping at the largest `usize` instead of overflowing.
    pub fn saturating_add(self, other: Self) -> Self {
        Vec2(self.0.saturating_add(other.0), self.1.saturating_add(other.1))
    }
}


impl<T: std::ops::Add<T>> std::ops::Add<Vec2<T>> for Vec2<T> {
    type Output = Vec2<T::Output>;
    fn add(self, other: Vec2<T>) -> Self::Output {
        Vec2(self.0 + other.0, self.1 + other.1)
    }
}

impl<T> From<(T, T)> for Vec2<T> {
    fn from((x, y): (T, T)) -> Self { Vec2(x, y) }
}


/// Computes `ceil(log(x)/log(2))`. Returns 0 where argument is 0.
pub(crate) fn ceil_log_2(mut number: u32) -> u32 {
    let mut log = 0;
    let mut round_up = 0;

    while number > 1 {
        if number & 1 != 0 {
            round_up = 1;
        }

        log +=  1;
        number >>= 1;
    }

    log + round_up
}

/// The number of bits required to address every entry of a color table with `color_count` colors.
/// Never less than one bit, because gif color tables have at least two entries,
/// and never more than eight bits, because gif color tables have at most 256 entries.
pub fn bits_per_pixel(color_count: usize) -> u8 {
    let color_count = u32::try_from(color_count).unwrap_or(u32::MAX);
    ceil_log_2(color_count).max(1).min(8) as u8
}
