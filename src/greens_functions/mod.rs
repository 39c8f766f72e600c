//! Greens function methods
//!
//! An array-valued function sampled on a mesh, together with the adapter that
//! exposes the orbit-partition machinery in mesh coordinates instead of raw
//! storage coordinates.

mod symmetry;

pub use symmetry::{GfSymmetryGroup, Scalar, ScalarSymmetry, Tensor, TensorSymmetry};

use ndarray::{ArrayD, IxDyn};
use num_traits::Zero;
use propagator_mesher::Mesh;

/// A quantity sampled on a mesh, backed by a dense array.
///
/// The array shape is the mesh data block (one extent per component mesh,
/// each slot holding that component's linear data index) followed by the
/// target block indexing the tensor components of the quantity. A scalar
/// quantity has an empty target block.
pub struct Greens<M: Mesh, T> {
    mesh: M,
    data: ArrayD<T>,
}

impl<M: Mesh, T: Clone + Zero> Greens<M, T> {
    /// Allocate a zero-initialised quantity on `mesh` with the given target
    /// shape
    pub fn new(mesh: M, target_shape: &[usize]) -> Self {
        let mut shape = mesh.data_extents();
        shape.extend_from_slice(target_shape);
        let data = ArrayD::zeros(IxDyn(&shape));
        Self { mesh, data }
    }
}

impl<M: Mesh, T> Greens<M, T> {
    /// The mesh the quantity is sampled on
    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    /// The backing array
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Mutable access to the backing array
    pub fn data_mut(&mut self) -> &mut ArrayD<T> {
        &mut self.data
    }

    /// Number of leading array dimensions addressed by the mesh
    pub fn mesh_rank(&self) -> usize {
        self.mesh.mesh_rank()
    }

    /// Number of trailing array dimensions indexing tensor components
    pub fn target_rank(&self) -> usize {
        self.data.ndim() - self.mesh.mesh_rank()
    }

    /// Extents of the target block
    pub fn target_shape(&self) -> &[usize] {
        &self.data.shape()[self.mesh.mesh_rank()..]
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use propagator_mesher::{DlrImaginaryTimeMesh, Statistic};

    #[test]
    fn the_data_block_leads_and_the_target_block_trails() {
        let mesh =
            DlrImaginaryTimeMesh::from_nodes(1.0, Statistic::Fermion, 10.0, 1e-10, vec![0.2, 0.8]);
        let scalar = Greens::<_, f64>::new(mesh.clone(), &[]);
        assert_eq!(scalar.data().shape(), &[2]);
        assert_eq!(scalar.target_rank(), 0);

        let tensor = Greens::<_, f64>::new(mesh, &[3, 3]);
        assert_eq!(tensor.data().shape(), &[2, 3, 3]);
        assert_eq!(tensor.mesh_rank(), 1);
        assert_eq!(tensor.target_rank(), 2);
        assert_eq!(tensor.target_shape(), &[3, 3]);
    }
}
