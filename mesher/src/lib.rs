#![allow(dead_code)]

mod brillouin;
mod imtime;
mod lattice;
mod product;

pub use brillouin::*;
pub use imtime::*;
pub use lattice::*;
pub use product::*;

use std::cell::OnceCell;
use std::fmt::Debug;

/// Errors raised when constructing a mesh or querying one for an index it
/// cannot produce.
#[derive(thiserror::Error, Debug)]
pub enum MeshError {
    /// Some mesh kinds have no meaningful notion of the mesh point nearest to
    /// an arbitrary domain value and refuse the query outright.
    #[error("closest-point lookup is not supported on a `{mesh}` mesh")]
    ClosestPointUnsupported {
        /// Type name of the offending mesh
        mesh: &'static str,
    },
    /// The index-wrapping arithmetic treats each index element separately and
    /// therefore only supports diagonal periodization matrices.
    #[error("non-diagonal periodization matrices are currently not supported")]
    NonDiagonalPeriodization,
    /// The lattice basis vectors do not span the full space
    #[error("the lattice basis is singular and cannot be inverted")]
    SingularBasis,
}

/// The common capability set of all mesh variants.
///
/// A mesh is a finite, ordered collection of points in some physical domain.
/// Every point is addressed two ways: by a domain index (`Idx`, e.g. a triple
/// of grid coordinates) and by a linear data index into the storage backing
/// any quantity sampled on the mesh. `to_datidx` and `to_idx` are exact
/// inverses of one another over the valid range.
pub trait Mesh: Clone + PartialEq + Send + Sync + Sized {
    /// Domain index of a mesh point
    type Idx: Clone + Debug + PartialEq + Send + Sync;
    /// Physical coordinate of a mesh point
    type Value;

    /// The total number of points in the mesh
    fn size(&self) -> usize;

    /// Bounds check in domain-index space
    fn is_idx_valid(&self, idx: &Self::Idx) -> bool;

    /// Convert a domain index to its linear data index
    fn to_datidx(&self, idx: &Self::Idx) -> usize;

    /// Convert a linear data index back to the domain index
    fn to_idx(&self, datidx: usize) -> Self::Idx;

    /// Evaluate the physical coordinate of a mesh point
    fn to_value(&self, idx: &Self::Idx) -> Self::Value;

    /// Hash over the structural mesh parameters, used for cheap equality
    fn mesh_hash(&self) -> u64;

    /// The domain index closest to an arbitrary domain value.
    ///
    /// Meshes without a meaningful proximity notion report
    /// [`MeshError::ClosestPointUnsupported`] instead of guessing.
    fn closest_idx(&self, _value: &Self::Value) -> Result<Self::Idx, MeshError> {
        Err(MeshError::ClosestPointUnsupported {
            mesh: std::any::type_name::<Self>(),
        })
    }

    /// Number of slots this mesh occupies in the data block of a storage
    /// index. Simple meshes linearise to a single slot; compositions expose
    /// one slot per component.
    fn mesh_rank(&self) -> usize {
        1
    }

    /// Extent of each data-block slot
    fn data_extents(&self) -> Vec<usize> {
        vec![self.size()]
    }

    /// Reassemble a data block into a domain index
    fn idx_from_data_block(&self, block: &[usize]) -> Self::Idx {
        debug_assert_eq!(block.len(), self.mesh_rank());
        self.to_idx(block[0])
    }

    /// Flatten a domain index into a data block
    fn idx_to_data_block(&self, idx: &Self::Idx, block: &mut [usize]) {
        debug_assert_eq!(block.len(), self.mesh_rank());
        block[0] = self.to_datidx(idx);
    }

    /// Point-wise access: a lazy handle onto the mesh point at `datidx`
    fn point(&self, datidx: usize) -> MeshPoint<'_, Self> {
        MeshPoint {
            mesh: self,
            idx: self.to_idx(datidx),
            datidx,
            value: OnceCell::new(),
        }
    }
}

/// A lazy handle onto a single mesh point.
///
/// The handle always knows its indices; the physical coordinate is computed on
/// first access and cached for the lifetime of the handle. The cache slot is
/// owned exclusively by the handle (`OnceCell` is not `Sync`), so a populated
/// value is never contended between threads.
pub struct MeshPoint<'a, M: Mesh> {
    mesh: &'a M,
    idx: M::Idx,
    datidx: usize,
    value: OnceCell<M::Value>,
}

impl<'a, M: Mesh> MeshPoint<'a, M> {
    /// The domain index of this point
    pub fn idx(&self) -> &M::Idx {
        &self.idx
    }

    /// The linear data index of this point
    pub fn datidx(&self) -> usize {
        self.datidx
    }

    /// The physical coordinate, computed on first access
    pub fn value(&self) -> &M::Value {
        self.value.get_or_init(|| self.mesh.to_value(&self.idx))
    }
}
