//! Lattice geometry
//!
//! Construction-only collaborators for the momentum-space meshes: a Bravais
//! lattice described by its basis vectors and the first Brillouin zone it
//! induces in reciprocal space.

use crate::MeshError;
use nalgebra::{Matrix3, Vector3};
use std::f64::consts::PI;

/// A Bravais lattice with fully localised orbitals.
///
/// The basis is stored as a full 3x3 matrix with the basis vectors as rows;
/// lattices of lower dimension pad the missing rows with unit vectors so the
/// basis stays invertible.
#[derive(Clone, Debug, PartialEq)]
pub struct BravaisLattice {
    units: Matrix3<f64>,
    ndim: usize,
    n_orbitals: usize,
}

impl BravaisLattice {
    /// Construct a lattice from its (padded) basis matrix
    pub fn new(units: Matrix3<f64>, ndim: usize, n_orbitals: usize) -> Self {
        assert!(
            (1..=3).contains(&ndim),
            "a Bravais lattice must have between one and three dimensions"
        );
        assert!(
            n_orbitals >= 1,
            "a Bravais lattice must carry at least one orbital"
        );
        Self {
            units,
            ndim,
            n_orbitals,
        }
    }

    /// A one-dimensional chain with lattice constant `a`
    pub fn linear_chain(a: f64, n_orbitals: usize) -> Self {
        Self::new(Matrix3::from_diagonal(&Vector3::new(a, 1.0, 1.0)), 1, n_orbitals)
    }

    /// A square lattice with lattice constant `a`
    pub fn square(a: f64, n_orbitals: usize) -> Self {
        Self::new(Matrix3::from_diagonal(&Vector3::new(a, a, 1.0)), 2, n_orbitals)
    }

    /// A simple cubic lattice with lattice constant `a`
    pub fn cubic(a: f64, n_orbitals: usize) -> Self {
        Self::new(Matrix3::from_diagonal(&Vector3::new(a, a, a)), 3, n_orbitals)
    }

    /// Matrix containing the basis vectors as rows
    pub fn units(&self) -> &Matrix3<f64> {
        &self.units
    }

    /// Spatial dimension of the lattice
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of orbitals per unit cell
    pub fn n_orbitals(&self) -> usize {
        self.n_orbitals
    }
}

/// The first Brillouin zone of a Bravais lattice.
///
/// The reciprocal basis satisfies K U^T = 2 pi I, stored with the reciprocal
/// vectors as rows.
#[derive(Clone, Debug, PartialEq)]
pub struct BrillouinZone {
    lattice: BravaisLattice,
    units: Matrix3<f64>,
}

impl BrillouinZone {
    /// Construct the Brillouin zone of `lattice`
    pub fn new(lattice: BravaisLattice) -> Result<Self, MeshError> {
        let inverse = lattice
            .units()
            .transpose()
            .try_inverse()
            .ok_or(MeshError::SingularBasis)?;
        Ok(Self {
            lattice,
            units: inverse * 2.0 * PI,
        })
    }

    /// The underlying direct lattice
    pub fn lattice(&self) -> &BravaisLattice {
        &self.lattice
    }

    /// Matrix containing the reciprocal basis vectors as rows
    pub fn units(&self) -> &Matrix3<f64> {
        &self.units
    }
}
