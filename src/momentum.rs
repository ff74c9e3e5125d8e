use std::ops::Mul;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Four-momentum in GeV
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FourMomentum {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl FourMomentum {
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Four-momentum from an LHEF `PUP` entry `(px, py, pz, E, m)`
    pub fn from_pup(pup: &[f64; 5]) -> Self {
        Self::new(pup[0], pup[1], pup[2], pup[3])
    }

    /// Rapidity y = ½ ln((E + pz) / (E - pz))
    ///
    /// Massless particles along the beam axis have infinite rapidity.
    pub fn rapidity(&self) -> f64 {
        0.5 * ((self.e + self.pz) / (self.e - self.pz)).ln()
    }

    /// Invariant mass squared E² - p²
    pub fn mass2(&self) -> f64 {
        self.e * self.e - self.px * self.px - self.py * self.py - self.pz * self.pz
    }
}

impl Mul<f64> for FourMomentum {
    type Output = FourMomentum;

    fn mul(self, c: f64) -> Self::Output {
        Self::new(c * self.px, c * self.py, c * self.pz, c * self.e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rapidity() {
        let p = FourMomentum::new(1., 2., 3., 10.);
        assert_relative_eq!(p.rapidity(), 0.5 * (13f64 / 7.).ln());
        let p = FourMomentum::new(3., 0., 0., 5.);
        assert_eq!(p.rapidity(), 0.);
        let p = FourMomentum::new(0., 0., -4., 4.);
        assert_eq!(p.rapidity(), f64::NEG_INFINITY);
    }

    #[test]
    fn mass() {
        let p = FourMomentum::new(37.283715118, 21.98166528, -1132.689358, 1133.5159684);
        assert_relative_eq!(p.mass2(), 0., epsilon = 1e-3);
        let p = FourMomentum::new(0., 3., 4., 13.);
        assert_eq!(p.mass2(), 144.);
        assert_eq!((p * 2.).mass2(), 4. * 144.);
    }
}
