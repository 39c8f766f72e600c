//! # Product mesh
//!
//! A lightweight composition of two meshes. The combined domain index is the
//! tuple of component indices; the data block exposes one slot per component
//! so array-backed quantities can address the composition without flattening
//! it into a single opaque offset. Nesting products composes to higher arity.

use crate::{Mesh, MeshError};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

/// Cartesian composition of two meshes
#[derive(Clone, Debug, PartialEq)]
pub struct MeshProduct<A, B> {
    first: A,
    second: B,
}

impl<A: Mesh, B: Mesh> MeshProduct<A, B> {
    /// Compose two meshes
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// The first component
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The second component
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A: Mesh, B: Mesh> Mesh for MeshProduct<A, B> {
    type Idx = (A::Idx, B::Idx);
    type Value = (A::Value, B::Value);

    fn size(&self) -> usize {
        self.first.size() * self.second.size()
    }

    fn is_idx_valid(&self, idx: &Self::Idx) -> bool {
        self.first.is_idx_valid(&idx.0) && self.second.is_idx_valid(&idx.1)
    }

    fn to_datidx(&self, idx: &Self::Idx) -> usize {
        self.first.to_datidx(&idx.0) * self.second.size() + self.second.to_datidx(&idx.1)
    }

    fn to_idx(&self, datidx: usize) -> Self::Idx {
        assert!(
            datidx < self.size(),
            "data index {datidx} lies outside a product mesh of {} points",
            self.size()
        );
        (
            self.first.to_idx(datidx / self.second.size()),
            self.second.to_idx(datidx % self.second.size()),
        )
    }

    fn to_value(&self, idx: &Self::Idx) -> Self::Value {
        (
            self.first.to_value(&idx.0),
            self.second.to_value(&idx.1),
        )
    }

    fn mesh_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        hasher.write_u64(self.first.mesh_hash());
        hasher.write_u64(self.second.mesh_hash());
        hasher.finish()
    }

    fn closest_idx(&self, _value: &Self::Value) -> Result<Self::Idx, MeshError> {
        Err(MeshError::ClosestPointUnsupported {
            mesh: std::any::type_name::<Self>(),
        })
    }

    fn mesh_rank(&self) -> usize {
        self.first.mesh_rank() + self.second.mesh_rank()
    }

    fn data_extents(&self) -> Vec<usize> {
        let mut extents = self.first.data_extents();
        extents.extend(self.second.data_extents());
        extents
    }

    fn idx_from_data_block(&self, block: &[usize]) -> Self::Idx {
        debug_assert_eq!(block.len(), self.mesh_rank());
        let (head, tail) = block.split_at(self.first.mesh_rank());
        (
            self.first.idx_from_data_block(head),
            self.second.idx_from_data_block(tail),
        )
    }

    fn idx_to_data_block(&self, idx: &Self::Idx, block: &mut [usize]) {
        debug_assert_eq!(block.len(), self.mesh_rank());
        let (head, tail) = block.split_at_mut(self.first.mesh_rank());
        self.first.idx_to_data_block(&idx.0, head);
        self.second.idx_to_data_block(&idx.1, tail);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BravaisLattice, BrillouinZone, BrillouinZoneMesh, DlrImaginaryTimeMesh, Statistic};

    fn momentum_mesh() -> BrillouinZoneMesh {
        let bz = BrillouinZone::new(BravaisLattice::cubic(1.0, 1)).unwrap();
        BrillouinZoneMesh::new(bz, [3, 2, 1])
    }

    fn time_mesh() -> DlrImaginaryTimeMesh {
        DlrImaginaryTimeMesh::from_nodes(5.0, Statistic::Fermion, 50.0, 1e-10, vec![0.1, 0.4, 0.7])
    }

    #[test]
    fn combined_index_conversions_roundtrip() {
        let mesh = MeshProduct::new(momentum_mesh(), time_mesh());
        assert_eq!(mesh.size(), 18);
        for datidx in 0..mesh.size() {
            let idx = mesh.to_idx(datidx);
            assert!(mesh.is_idx_valid(&idx));
            assert_eq!(mesh.to_datidx(&idx), datidx);
        }
    }

    #[test]
    fn data_blocks_cover_each_component() {
        let mesh = MeshProduct::new(momentum_mesh(), time_mesh());
        assert_eq!(mesh.mesh_rank(), 2);
        assert_eq!(mesh.data_extents(), vec![6, 3]);

        let idx = ([2, 1, 0], 1);
        let mut block = [0usize; 2];
        mesh.idx_to_data_block(&idx, &mut block);
        assert_eq!(mesh.idx_from_data_block(&block), idx);
    }

    #[test]
    fn nesting_raises_the_arity() {
        let mesh = MeshProduct::new(MeshProduct::new(momentum_mesh(), time_mesh()), time_mesh());
        assert_eq!(mesh.mesh_rank(), 3);
        assert_eq!(mesh.data_extents(), vec![6, 3, 3]);
        let idx = (([1, 0, 0], 2), 0);
        let mut block = [0usize; 3];
        mesh.idx_to_data_block(&idx, &mut block);
        assert_eq!(mesh.idx_from_data_block(&block), idx);
    }

    #[test]
    fn proximity_queries_are_refused() {
        let mesh = MeshProduct::new(momentum_mesh(), time_mesh());
        let value = (mesh.first().to_value(&[0, 0, 0]), 0.5);
        assert!(matches!(
            mesh.closest_idx(&value),
            Err(MeshError::ClosestPointUnsupported { .. })
        ));
    }
}
