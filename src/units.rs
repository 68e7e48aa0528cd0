use derive_more::{Add, AddAssign, Deref, DerefMut, Display, From, Into, Sub, SubAssign, Sum};
use std::ops::{Div, Mul, Neg};

/// Tolerance used when comparing accumulated lengths, absorbing float drift
/// from summing many column widths or row heights.
pub const EPSILON: f32 = 0.001;

/// A length in PDF points (1/72 of an inch). All layout arithmetic in this
/// crate is done in points.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
    PartialEq,
    PartialOrd,
    Add,
    AddAssign,
    Sub,
    SubAssign,
    Sum,
    Deref,
    DerefMut,
    From,
    Into,
    Display,
)]
pub struct Pt(pub f32);

impl Pt {
    pub const ZERO: Pt = Pt(0.0);

    pub fn max(self, other: Pt) -> Pt {
        Pt(self.0.max(other.0))
    }

    pub fn min(self, other: Pt) -> Pt {
        Pt(self.0.min(other.0))
    }

    pub fn abs(self) -> Pt {
        Pt(self.0.abs())
    }

    /// Clamp negative lengths to zero
    pub fn non_negative(self) -> Pt {
        self.max(Pt::ZERO)
    }

    /// Whether the two lengths are equal within [EPSILON]
    pub fn approx_eq(self, other: Pt) -> bool {
        (self.0 - other.0).abs() <= EPSILON
    }

    /// `self <= other`, allowing for accumulated rounding error
    pub fn fits_in(self, other: Pt) -> bool {
        self.0 <= other.0 + EPSILON
    }
}

impl Mul<f32> for Pt {
    type Output = Pt;

    fn mul(self, rhs: f32) -> Pt {
        Pt(self.0 * rhs)
    }
}

impl Div<f32> for Pt {
    type Output = Pt;

    fn div(self, rhs: f32) -> Pt {
        Pt(self.0 / rhs)
    }
}

impl Div<Pt> for Pt {
    type Output = f32;

    fn div(self, rhs: Pt) -> f32 {
        self.0 / rhs.0
    }
}

impl Neg for Pt {
    type Output = Pt;

    fn neg(self) -> Pt {
        Pt(-self.0)
    }
}

/// Inches, convertible into [Pt]
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct In(pub f32);

impl From<In> for Pt {
    fn from(value: In) -> Self {
        Pt(value.0 * 72.0)
    }
}

/// Millimetres, convertible into [Pt]
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Mm(pub f32);

impl From<Mm> for Pt {
    fn from(value: Mm) -> Self {
        Pt(value.0 * 72.0 / 25.4)
    }
}
