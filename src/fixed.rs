//! 26.6 fixed-point numbers for sub-pixel glyph metrics.
//!
//! Shapers report horizontal positions and advances with 1/64 pixel
//! precision. Arithmetic saturates instead of wrapping so that sentinel
//! values such as [`Fixed::MAX`] can be used as "far right" targets.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// A signed 26.6 fixed-point value (64 units per pixel).
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(64);
    pub const MAX: Self = Self(i32::MAX);
    pub const MIN: Self = Self(i32::MIN);

    /// Create a value from its raw 26.6 representation.
    #[must_use]
    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    /// Raw 26.6 representation.
    #[must_use]
    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// Convert a whole number of pixels, saturating at the representable range.
    #[must_use]
    pub const fn from_int(px: i32) -> Self {
        Self(px.saturating_mul(64))
    }

    /// Round to the nearest pixel (halves round up).
    #[must_use]
    pub const fn round(self) -> i32 {
        self.0.saturating_add(32) >> 6
    }

    /// Round toward negative infinity.
    #[must_use]
    pub const fn floor(self) -> i32 {
        self.0 >> 6
    }

    /// Round toward positive infinity.
    #[must_use]
    pub const fn ceil(self) -> i32 {
        self.0.saturating_add(63) >> 6
    }

    /// Absolute distance between two values.
    #[must_use]
    pub const fn distance(self, other: Self) -> Self {
        if self.0 > other.0 {
            Self(self.0.saturating_sub(other.0))
        } else {
            Self(other.0.saturating_sub(self.0))
        }
    }

    /// Value as floating-point pixels.
    #[must_use]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 64.0
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.0 >> 6, self.0 & 63)
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl Add for Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Div<i32> for Fixed {
    type Output = Self;

    /// Integer division of the raw value; dividing by zero yields zero.
    fn div(self, rhs: i32) -> Self {
        if rhs == 0 {
            Self::ZERO
        } else {
            Self(self.0 / rhs)
        }
    }
}
