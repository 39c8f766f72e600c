//! Hamiltonian module
//!
//! A tight-binding Hamiltonian for fully localised orbitals: the orbital
//! overlap is taken as the unit matrix, so the model is fixed entirely by the
//! hopping displacements and their matrices. Consumers of the symmetry
//! machinery rather than part of it, the routines here evaluate the
//! dispersion relation on momentum grids and paths and histogram it into a
//! density of states.

use crate::error::BuildError;
use itertools::Itertools;
use nalgebra::{DMatrix, Vector3};
use ndarray::{Array1, Array2};
use num_complex::Complex;
use propagator_mesher::{BravaisLattice, BrillouinZone, BrillouinZoneMesh, Mesh};
use std::f64::consts::PI;

/// Tight-binding Hamiltonian on a Bravais lattice.
///
/// Holds the hopping displacements `r_j` in units of the lattice basis
/// vectors and the associated overlap (hopping) matrices `m_j`.
#[derive(Clone, Debug, PartialEq)]
pub struct TightBinding {
    lattice: BravaisLattice,
    displacements: Vec<Vector3<i64>>,
    hoppings: Vec<DMatrix<Complex<f64>>>,
}

impl TightBinding {
    /// Construct a Hamiltonian from displacement vectors and hopping
    /// matrices.
    ///
    /// Every displacement needs a hopping matrix of dimension
    /// `n_orbitals x n_orbitals`.
    pub fn new(
        lattice: BravaisLattice,
        displacements: Vec<Vector3<i64>>,
        hoppings: Vec<DMatrix<Complex<f64>>>,
    ) -> Result<Self, BuildError> {
        if displacements.len() != hoppings.len() {
            return Err(BuildError::TightBinding(format!(
                "{} displacement vectors cannot pair with {} hopping matrices",
                displacements.len(),
                hoppings.len()
            )));
        }
        let n_orbitals = lattice.n_orbitals();
        for matrix in &hoppings {
            if matrix.nrows() != n_orbitals || matrix.ncols() != n_orbitals {
                return Err(BuildError::TightBinding(format!(
                    "hopping matrices must be {n_orbitals}x{n_orbitals}, found {}x{}",
                    matrix.nrows(),
                    matrix.ncols()
                )));
            }
        }
        Ok(Self {
            lattice,
            displacements,
            hoppings,
        })
    }

    /// The underlying lattice
    pub fn lattice(&self) -> &BravaisLattice {
        &self.lattice
    }

    /// Number of bands, i.e. the dimension of the dispersion matrix
    pub fn n_bands(&self) -> usize {
        self.lattice.n_orbitals()
    }

    /// The dispersion relation at momentum `k`, in units of the reciprocal
    /// basis vectors:
    ///
    /// epsilon(k) = sum_j m_j exp(2 pi i k . r_j)
    pub fn dispersion(&self, k: &Vector3<f64>) -> DMatrix<Complex<f64>> {
        let n = self.n_bands();
        let mut epsilon = DMatrix::<Complex<f64>>::zeros(n, n);
        for (displacement, hopping) in self.displacements.iter().zip(&self.hoppings) {
            let phase = 2.0
                * PI
                * (k[0] * displacement[0] as f64
                    + k[1] * displacement[1] as f64
                    + k[2] * displacement[2] as f64);
            epsilon += hopping * Complex::new(0.0, phase).exp();
        }
        epsilon
    }

    /// The sorted band energies at momentum `k`.
    ///
    /// The dispersion matrix is Hermitian for a physical hopping set, so its
    /// eigenvalues are real.
    pub fn band_energies(&self, k: &Vector3<f64>) -> Vec<f64> {
        let mut energies: Vec<f64> = self
            .dispersion(k)
            .symmetric_eigenvalues()
            .iter()
            .copied()
            .collect();
        energies.sort_by(|a, b| a.partial_cmp(b).expect("band energies are finite"));
        energies
    }

    /// Band energies along the straight momentum path from `k1` to `k2`,
    /// excluding the endpoint, as an `n_bands x n_pts` array
    pub fn energies_on_path(
        &self,
        k1: &Vector3<f64>,
        k2: &Vector3<f64>,
        n_pts: usize,
    ) -> Array2<f64> {
        let mut energies = Array2::zeros((self.n_bands(), n_pts));
        for point in 0..n_pts {
            let weight = point as f64 / n_pts as f64;
            let k = k1 + (k2 - k1) * weight;
            for (band, energy) in self.band_energies(&k).into_iter().enumerate() {
                energies[[band, point]] = energy;
            }
        }
        energies
    }

    /// Band energies over a full Brillouin-zone grid with `n_k` points along
    /// each periodic direction, as an `n_bands x n_points` array
    pub fn energies_on_grid(&self, n_k: usize) -> Result<Array2<f64>, BuildError> {
        let bz = BrillouinZone::new(self.lattice.clone())?;
        let mesh = BrillouinZoneMesh::with_linear_dimension(bz, n_k);
        let dims = mesh.dims();
        let mut energies = Array2::zeros((self.n_bands(), mesh.size()));
        for datidx in 0..mesh.size() {
            let idx = mesh.to_idx(datidx);
            let k = Vector3::new(
                idx[0] as f64 / dims[0] as f64,
                idx[1] as f64 / dims[1] as f64,
                idx[2] as f64 / dims[2] as f64,
            );
            for (band, energy) in self.band_energies(&k).into_iter().enumerate() {
                energies[[band, datidx]] = energy;
            }
        }
        Ok(energies)
    }

    /// The density of states per band, histogrammed over a full
    /// Brillouin-zone grid of `n_kpts` points per direction into `n_eps`
    /// energy bins.
    ///
    /// Returns the energy nodes and an `n_eps x n_bands` density normalised
    /// so each band integrates to one.
    #[tracing::instrument(name = "Density of states", level = "info", skip(self))]
    pub fn dos(&self, n_kpts: usize, n_eps: usize) -> Result<(Array1<f64>, Array2<f64>), BuildError> {
        if n_eps < 2 {
            return Err(BuildError::TightBinding(
                "a density of states needs at least two energy bins".to_string(),
            ));
        }
        let energies = self.energies_on_grid(n_kpts)?;
        let n_points = energies.ncols();
        let (&min, &max) = energies
            .iter()
            .minmax()
            .into_option()
            .expect("a momentum grid is never empty");
        let span = (max - min).max(f64::EPSILON);
        let bin_width = span / (n_eps - 1) as f64;

        let nodes = Array1::from_iter((0..n_eps).map(|bin| min + bin as f64 * bin_width));
        let mut density = Array2::zeros((n_eps, self.n_bands()));
        for band in 0..self.n_bands() {
            for &energy in energies.row(band) {
                let bin = (((energy - min) / bin_width) as usize).min(n_eps - 1);
                density[[bin, band]] += 1.0 / (n_points as f64 * bin_width);
            }
        }
        tracing::debug!(bands = self.n_bands(), bins = n_eps, "histogrammed band energies");
        Ok((nodes, density))
    }
}
