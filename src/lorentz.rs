//! Four-momenta and reconstructed particles (spec.md §3).

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Sub};

/// A four-momentum `(px, py, pz, E)` with the usual derived quantities.
///
/// Addition is exact for exact inputs and commutative, since it is defined
/// component-wise over `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LorentzVector {
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub e: f64,
}

impl LorentzVector {
    pub const fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        LorentzVector { px, py, pz, e }
    }

    pub const fn zero() -> Self {
        LorentzVector::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Squared three-momentum.
    pub fn p2(&self) -> f64 {
        self.px * self.px + self.py * self.py + self.pz * self.pz
    }

    /// Magnitude of the three-momentum.
    pub fn p(&self) -> f64 {
        self.p2().sqrt()
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        (self.px * self.px + self.py * self.py).sqrt()
    }

    /// Invariant mass squared, `E^2 - |p|^2`. Can be negative for off-shell inputs.
    pub fn m2(&self) -> f64 {
        self.e * self.e - self.p2()
    }

    /// Invariant mass. Returns 0 rather than NaN for a slightly space-like
    /// four-vector (common after floating-point cancellation in sums).
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 <= 0.0 {
            0.0
        } else {
            m2.sqrt()
        }
    }

    /// Polar angle, in `[0, pi]`.
    pub fn theta(&self) -> f64 {
        if self.p() == 0.0 {
            0.0
        } else {
            (self.pz / self.p()).acos()
        }
    }

    /// Azimuthal angle, in `(-pi, pi]`.
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    /// Pseudorapidity.
    pub fn eta(&self) -> f64 {
        let p = self.p();
        if p == self.pz.abs() {
            // Along the beam axis: conventionally +/- infinity, but we return
            // a large finite value so downstream arithmetic stays well-defined.
            return if self.pz >= 0.0 { 1.0e10 } else { -1.0e10 };
        }
        0.5 * ((p + self.pz) / (p - self.pz)).ln()
    }
}

impl Add for LorentzVector {
    type Output = LorentzVector;

    fn add(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector::new(
            self.px + rhs.px,
            self.py + rhs.py,
            self.pz + rhs.pz,
            self.e + rhs.e,
        )
    }
}

impl AddAssign for LorentzVector {
    fn add_assign(&mut self, rhs: LorentzVector) {
        *self = *self + rhs;
    }
}

impl Sub for LorentzVector {
    type Output = LorentzVector;

    fn sub(self, rhs: LorentzVector) -> LorentzVector {
        LorentzVector::new(
            self.px - rhs.px,
            self.py - rhs.py,
            self.pz - rhs.pz,
            self.e - rhs.e,
        )
    }
}

impl std::iter::Sum for LorentzVector {
    fn sum<I: Iterator<Item = LorentzVector>>(iter: I) -> Self {
        iter.fold(LorentzVector::zero(), Add::add)
    }
}

/// A reconstructed final-state particle: name, four-momentum, and signed PDG id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub name: String,
    pub p4: LorentzVector,
    /// Signed PDG identifier. `0` when the type is not known/relevant.
    pub pdg_id: i64,
}

impl Particle {
    pub fn new(name: impl Into<String>, p4: LorentzVector) -> Self {
        Particle {
            name: name.into(),
            p4,
            pdg_id: 0,
        }
    }

    pub fn with_pdg_id(mut self, pdg_id: i64) -> Self {
        self.pdg_id = pdg_id;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_is_commutative() {
        let a = LorentzVector::new(1.0, 2.0, 3.0, 10.0);
        let b = LorentzVector::new(-4.0, 5.0, -6.0, 20.0);
        assert_eq!(a + b, b + a);
    }

    #[test]
    fn addition_is_exact_for_exact_inputs() {
        let a = LorentzVector::new(1.0, 0.0, 0.0, 1.0);
        let b = LorentzVector::new(2.0, 0.0, 0.0, 2.0);
        let sum = a + b;
        assert_eq!(sum.px, 3.0);
        assert_eq!(sum.e, 3.0);
    }

    #[test]
    fn mass_of_rest_particle() {
        let p = LorentzVector::new(0.0, 0.0, 0.0, 5.0);
        assert!((p.m() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn transverse_momentum() {
        let p = LorentzVector::new(3.0, 4.0, 100.0, 200.0);
        assert!((p.pt() - 5.0).abs() < 1e-12);
    }
}
