//! Lengths in PDF points, the one unit all page geometry is expressed in.

use derive_more::{Add, AddAssign, Deref, Display, From, Into, Sub, SubAssign, Sum};
use serde::{Deserialize, Serialize};
use std::ops::{Div, Mul, Neg};

/// A length in PDF points (1/72 of an inch)
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
    Display,
    From,
    Into,
    Deref,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Pt(pub f32);

impl Pt {
    pub fn max(self, other: Pt) -> Pt {
        Pt(self.0.max(other.0))
    }

    pub fn min(self, other: Pt) -> Pt {
        Pt(self.0.min(other.0))
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

/// Dividing two lengths yields a unitless ratio
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_keeps_units() {
        let total: Pt = [Pt(1.0), Pt(2.5), Pt(3.5)].into_iter().sum();
        assert_eq!(total, Pt(7.0));
        assert_eq!(Pt(10.0) - Pt(4.0), Pt(6.0));
        assert_eq!(Pt(10.0) * 0.5, Pt(5.0));
        assert_eq!(Pt(80.0) / Pt(160.0), 0.5);
        assert_eq!(Pt(3.0).max(Pt(4.0)), Pt(4.0));
    }
}
