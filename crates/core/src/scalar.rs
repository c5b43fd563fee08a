//! The generic element trait behind the four precisions.
//!
//! The original system generated one source tree per precision from a
//! complex-double template. Here a single `Scalar` bound replaces the code
//! generation: kernels and algorithms are written once against the
//! capability set below and instantiated for `f32`, `f64`, [`Complex32`]
//! and [`Complex64`].

use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use num_traits::{Float, NumAssign, One, Zero};

use crate::complex::{Complex, Complex32, Complex64};

/// Element type of a tile matrix.
///
/// Covers the arithmetic the tile kernels need: ring operations, division,
/// conjugation, modulus and construction from the associated real type.
/// For real scalars `conj` is the identity and `im` is zero, so complex
/// formulas collapse to their real counterparts without specialization.
pub trait Scalar:
    Copy
    + Send
    + Sync
    + 'static
    + Debug
    + Display
    + Default
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
{
    /// The real type underlying this scalar (`f32` or `f64`).
    type Real: Float + NumAssign + Debug + Display + Default + Send + Sync + 'static;

    /// Embed a real value.
    fn from_real(re: Self::Real) -> Self;

    /// Build a scalar from real and imaginary parts. For real scalars the
    /// imaginary part must be zero.
    fn from_parts(re: Self::Real, im: Self::Real) -> Self;

    /// Real part.
    fn re(self) -> Self::Real;

    /// Imaginary part (zero for real scalars).
    fn im(self) -> Self::Real;

    /// Complex conjugate (identity for real scalars).
    fn conj(self) -> Self;

    /// Modulus.
    fn abs(self) -> Self::Real;

    /// Multiply by a real factor.
    fn mul_real(self, r: Self::Real) -> Self;

    /// Whether every component is finite.
    fn is_finite(self) -> bool;
}

macro_rules! impl_real_scalar {
    ($t:ty) => {
        impl Scalar for $t {
            type Real = $t;

            fn from_real(re: $t) -> Self {
                re
            }
            fn from_parts(re: $t, im: $t) -> Self {
                debug_assert!(im == 0.0, "imaginary part dropped in a real scalar");
                re
            }
            fn re(self) -> $t {
                self
            }
            fn im(self) -> $t {
                0.0
            }
            fn conj(self) -> Self {
                self
            }
            fn abs(self) -> $t {
                <$t>::abs(self)
            }
            fn mul_real(self, r: $t) -> Self {
                self * r
            }
            fn is_finite(self) -> bool {
                <$t>::is_finite(self)
            }
        }
    };
}

impl_real_scalar!(f32);
impl_real_scalar!(f64);

macro_rules! impl_complex_scalar {
    ($t:ty, $r:ty) => {
        impl Scalar for $t {
            type Real = $r;

            fn from_real(re: $r) -> Self {
                Complex::new(re, 0.0)
            }
            fn from_parts(re: $r, im: $r) -> Self {
                Complex::new(re, im)
            }
            fn re(self) -> $r {
                self.re
            }
            fn im(self) -> $r {
                self.im
            }
            fn conj(self) -> Self {
                Complex::conj(self)
            }
            fn abs(self) -> $r {
                Complex::abs(self)
            }
            fn mul_real(self, r: $r) -> Self {
                self.scale(r)
            }
            fn is_finite(self) -> bool {
                self.re.is_finite() && self.im.is_finite()
            }
        }
    };
}

impl_complex_scalar!(Complex32, f32);
impl_complex_scalar!(Complex64, f64);
