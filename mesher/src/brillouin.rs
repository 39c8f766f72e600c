//! # Brillouin-zone mesh
//!
//! A uniform momentum grid over a Brillouin zone with diagonal extents. The
//! mesh basis vectors U are constructed such that K = N U, where K is the
//! reciprocal basis and N the (diagonal) periodization matrix.

use crate::{BrillouinZone, Mesh, MeshError};
use nalgebra::{Matrix3, Vector3};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Mesh on a Brillouin zone
#[derive(Clone, Debug)]
pub struct BrillouinZoneMesh {
    bz: BrillouinZone,
    dims: [usize; 3],
    size: usize,
    stride0: usize,
    stride1: usize,
    units: Matrix3<f64>,
    units_inv: Matrix3<f64>,
    mesh_hash: u64,
}

impl BrillouinZoneMesh {
    /// Construct a mesh with the given extents in each reciprocal direction
    pub fn new(bz: BrillouinZone, dims: [usize; 3]) -> Self {
        assert!(
            dims.iter().all(|&d| d >= 1),
            "every mesh extent must be at least one"
        );
        let size = dims.iter().product();
        let scale = Matrix3::from_diagonal(&Vector3::new(
            1.0 / dims[0] as f64,
            1.0 / dims[1] as f64,
            1.0 / dims[2] as f64,
        ));
        let units = scale * bz.units();
        let units_inv = units
            .try_inverse()
            .expect("the reciprocal basis is invertible, so the mesh basis is too");

        let mut hasher = DefaultHasher::new();
        dims.hash(&mut hasher);
        let unit_sum: f64 = bz.units().iter().sum();
        hasher.write_u64(unit_sum.to_bits());
        let mesh_hash = hasher.finish();

        Self {
            bz,
            dims,
            size,
            stride0: dims[1] * dims[2],
            stride1: dims[2],
            units,
            units_inv,
            mesh_hash,
        }
    }

    /// Construct a mesh from a periodization matrix.
    ///
    /// The index-wrapping arithmetic treats each index element separately, so
    /// only diagonal matrices are accepted.
    pub fn with_periodization_matrix(
        bz: BrillouinZone,
        matrix: Matrix3<i64>,
    ) -> Result<Self, MeshError> {
        let diagonal = matrix
            .iter()
            .enumerate()
            .all(|(i, &element)| i % 4 == 0 || element == 0);
        if !diagonal {
            return Err(MeshError::NonDiagonalPeriodization);
        }
        Ok(Self::new(
            bz,
            [
                matrix[(0, 0)] as usize,
                matrix[(1, 1)] as usize,
                matrix[(2, 2)] as usize,
            ],
        ))
    }

    /// Construct a mesh with `n_k` points along each periodic direction of
    /// the underlying lattice
    pub fn with_linear_dimension(bz: BrillouinZone, n_k: usize) -> Self {
        let ndim = bz.lattice().ndim();
        let dims = [
            n_k,
            if ndim >= 2 { n_k } else { 1 },
            if ndim >= 3 { n_k } else { 1 },
        ];
        Self::new(bz, dims)
    }

    /// The extent of each dimension
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// The underlying Brillouin zone
    pub fn bz(&self) -> &BrillouinZone {
        &self.bz
    }

    /// Matrix containing the mesh basis vectors as rows
    pub fn units(&self) -> &Matrix3<f64> {
        &self.units
    }

    /// Wrap an index back into the mesh by the periodicity of the zone
    pub fn idx_modulo(&self, idx: &[i64; 3]) -> [i64; 3] {
        [
            idx[0].rem_euclid(self.dims[0] as i64),
            idx[1].rem_euclid(self.dims[1] as i64),
            idx[2].rem_euclid(self.dims[2] as i64),
        ]
    }
}

impl PartialEq for BrillouinZoneMesh {
    fn eq(&self, other: &Self) -> bool {
        self.dims == other.dims && self.bz == other.bz
    }
}

impl Mesh for BrillouinZoneMesh {
    type Idx = [i64; 3];
    type Value = Vector3<f64>;

    fn size(&self) -> usize {
        self.size
    }

    fn is_idx_valid(&self, idx: &Self::Idx) -> bool {
        idx.iter()
            .zip(&self.dims)
            .all(|(&i, &d)| i >= 0 && (i as usize) < d)
    }

    fn to_datidx(&self, idx: &Self::Idx) -> usize {
        assert!(
            self.is_idx_valid(idx),
            "index {idx:?} lies outside a mesh of extent {:?}",
            self.dims
        );
        idx[0] as usize * self.stride0 + idx[1] as usize * self.stride1 + idx[2] as usize
    }

    fn to_idx(&self, datidx: usize) -> Self::Idx {
        assert!(
            datidx < self.size,
            "data index {datidx} lies outside a mesh of {} points",
            self.size
        );
        let i0 = datidx / self.stride0;
        let r0 = datidx % self.stride0;
        [i0 as i64, (r0 / self.stride1) as i64, (r0 % self.stride1) as i64]
    }

    fn to_value(&self, idx: &Self::Idx) -> Self::Value {
        assert!(
            self.is_idx_valid(idx),
            "index {idx:?} lies outside a mesh of extent {:?}",
            self.dims
        );
        self.units.transpose() * Vector3::new(idx[0] as f64, idx[1] as f64, idx[2] as f64)
    }

    fn mesh_hash(&self) -> u64 {
        self.mesh_hash
    }

    fn closest_idx(&self, value: &Self::Value) -> Result<Self::Idx, MeshError> {
        let fractional = self.units_inv.transpose() * value;
        Ok([
            fractional[0].round() as i64,
            fractional[1].round() as i64,
            fractional[2].round() as i64,
        ])
    }
}
