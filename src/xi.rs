//! Diffractive kinematics from the largest rapidity gap
//!
//! The final-state particles of an event are ordered in rapidity and
//! split at the largest gap between neighbours into a system X (backward
//! of the gap) and a system Y (forward of the gap). The invariant masses
//! of the two systems, normalised to the collision energy, estimate the
//! momentum loss ξ of the beam particles.
use accurate::{sum::Klein, traits::*};
use itertools::Itertools;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::momentum::FourMomentum;

/// Proton mass in GeV, normalisation of ξ_DD
pub const PROTON_MASS: f64 = 0.938;

/// The two incoming beam particles
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BeamPair(pub [FourMomentum; 2]);

impl BeamPair {
    pub fn new(a: FourMomentum, b: FourMomentum) -> Self {
        Self([a, b])
    }

    /// Centre-of-mass energy estimate |pz(A)| + |pz(B)|
    ///
    /// Transverse momenta and beam masses are ignored.
    pub fn cm_energy(&self) -> f64 {
        self.0[0].pz.abs() + self.0[1].pz.abs()
    }
}

/// Fractional momentum losses of an event
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Xi {
    /// M_X² / s
    pub x: f64,
    /// M_Y² / s
    pub y: f64,
    /// Single-diffractive estimate max(ξ_X, ξ_Y)
    pub sd: f64,
    /// Double-diffractive estimate ξ_X ξ_Y s / m_p²
    pub dd: f64,
}

impl Xi {
    /// Derive all ξ values from the squared masses of the two systems
    ///
    /// A vanishing `cm_energy` gives non-finite results.
    pub fn from_masses(mx2: f64, my2: f64, cm_energy: f64) -> Self {
        let s = cm_energy * cm_energy;
        let x = mx2 / s;
        let y = my2 / s;
        // keeps a NaN in x, unlike f64::max
        let sd = if x < y { y } else { x };
        let dd = x * y * s / (PROTON_MASS * PROTON_MASS);
        Self { x, y, sd, dd }
    }
}

/// Particles split at the largest rapidity gap
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GapSplit {
    sorted: Vec<FourMomentum>,
    split: usize,
    gap: Option<f64>,
}

impl GapSplit {
    /// Sort the particles in rapidity and split them at the largest gap
    ///
    /// With fewer than two particles there is no gap and all particles
    /// end up in system X.
    pub fn new<I>(particles: I) -> Self
    where
        I: IntoIterator<Item = FourMomentum>,
    {
        let sorted = sorted_by_rapidity(particles);
        let (split, gap) = match largest_gap(&sorted) {
            Some((k, gap)) => (k + 1, Some(gap)),
            None => (sorted.len(), None),
        };
        Self { sorted, split, gap }
    }

    /// All particles in ascending rapidity
    pub fn sorted(&self) -> &[FourMomentum] {
        &self.sorted
    }

    /// Particles before the gap
    pub fn x_system(&self) -> &[FourMomentum] {
        &self.sorted[..self.split]
    }

    /// Particles after the gap
    pub fn y_system(&self) -> &[FourMomentum] {
        &self.sorted[self.split..]
    }

    /// Size of the gap in rapidity, if there is one
    pub fn gap(&self) -> Option<f64> {
        self.gap
    }

    /// Derive the ξ values for the given beams
    pub fn xi(&self, beams: &BeamPair) -> Xi {
        Xi::from_masses(
            invariant_mass2(self.x_system()),
            invariant_mass2(self.y_system()),
            beams.cm_energy(),
        )
    }
}

/// Sort particles by ascending rapidity
///
/// The sort is stable and compares with [`f64::total_cmp`], so particles
/// with equal rapidity keep their input order. An infinite rapidity
/// sorts at the matching end and an undefined (NaN) rapidity after
/// everything else, whatever the sign bit of the NaN.
pub fn sorted_by_rapidity<I>(particles: I) -> Vec<FourMomentum>
where
    I: IntoIterator<Item = FourMomentum>,
{
    let mut keyed = particles
        .into_iter()
        .map(|p| {
            let y = p.rapidity();
            (if y.is_nan() { f64::NAN } else { y }, p)
        })
        .collect::<Vec<_>>();
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    keyed.into_iter().map(|(_, p)| p).collect()
}

/// Find the largest rapidity difference between neighbours
///
/// Returns the index `k` of the lower neighbour together with the gap
/// `y[k+1] - y[k]`. Of several equally large gaps the first one wins.
/// Undefined (NaN) gaps are never selected.
pub fn largest_gap(sorted: &[FourMomentum]) -> Option<(usize, f64)> {
    let gaps = sorted
        .iter()
        .map(FourMomentum::rapidity)
        .tuple_windows()
        .map(|(y0, y1)| y1 - y0);
    let mut largest: Option<(usize, f64)> = None;
    for (k, gap) in gaps.enumerate() {
        // with all gaps zero the first one is taken, so X is never empty
        match largest {
            Some((_, max)) if !(gap > max) => {}
            None if gap.is_nan() => {}
            _ => largest = Some((k, gap)),
        }
    }
    largest
}

/// Invariant mass squared of the sum of all momenta
///
/// The components are summed with Klein's compensated summation to
/// limit cancellation in E² - p² for systems close to massless. The
/// empty system has zero mass.
pub fn invariant_mass2(system: &[FourMomentum]) -> f64 {
    let sum = |component: fn(&FourMomentum) -> f64| -> f64 {
        system
            .iter()
            .map(component)
            .sum_with_accumulator::<Klein<f64>>()
    };
    let total = FourMomentum::new(
        sum(|p| p.px),
        sum(|p| p.py),
        sum(|p| p.pz),
        sum(|p| p.e),
    );
    total.mass2()
}

/// Estimate the ξ values of an event from its final-state particles
pub fn estimate(particles: &[FourMomentum], beams: &BeamPair) -> Xi {
    GapSplit::new(particles.iter().copied()).xi(beams)
}
