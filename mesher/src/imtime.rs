//! # Imaginary-time mesh
//!
//! A discrete-Lehmann-representation mesh in imaginary time. The mesh is a
//! sparse set of interpolation nodes on [0, beta) rather than a uniform grid;
//! node placement is delegated to whichever representation builder produced
//! them, the mesh only records the nodes together with the physical
//! parameters they were built for.

use crate::Mesh;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Particle statistics obeyed by a quantity on an imaginary-time mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Anti-periodic in beta
    Fermion,
    /// Periodic in beta
    Boson,
}

/// Discrete-Lehmann-representation mesh in imaginary time
#[derive(Clone, Debug)]
pub struct DlrImaginaryTimeMesh {
    beta: f64,
    statistic: Statistic,
    lambda: f64,
    eps: f64,
    nodes: Vec<f64>,
    mesh_hash: u64,
}

impl DlrImaginaryTimeMesh {
    /// Construct a mesh from dimensionless imaginary-time nodes.
    ///
    /// * `beta` - Inverse temperature
    /// * `statistic` - Fermion or Boson
    /// * `lambda` - Dimensionless energy cutoff the nodes were built for
    /// * `eps` - Representation accuracy the nodes were built for
    /// * `nodes` - Interpolation nodes in units of beta
    pub fn from_nodes(
        beta: f64,
        statistic: Statistic,
        lambda: f64,
        eps: f64,
        nodes: Vec<f64>,
    ) -> Self {
        assert!(beta > 0.0, "the inverse temperature must be positive");
        assert!(!nodes.is_empty(), "a mesh must carry at least one node");

        let mut hasher = DefaultHasher::new();
        hasher.write_u64(beta.to_bits());
        hasher.write_u64(lambda.to_bits());
        hasher.write_u64(eps.to_bits());
        let node_sum: f64 = nodes.iter().sum();
        hasher.write_u64(node_sum.to_bits());
        let mesh_hash = hasher.finish();

        Self {
            beta,
            statistic,
            lambda,
            eps,
            nodes,
            mesh_hash,
        }
    }

    /// Inverse temperature
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Particle statistics
    pub fn statistic(&self) -> Statistic {
        self.statistic
    }

    /// Dimensionless energy cutoff
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Representation accuracy
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// The dimensionless interpolation nodes
    pub fn nodes(&self) -> &[f64] {
        &self.nodes
    }
}

impl PartialEq for DlrImaginaryTimeMesh {
    fn eq(&self, other: &Self) -> bool {
        self.mesh_hash == other.mesh_hash && self.statistic == other.statistic
    }
}

impl Mesh for DlrImaginaryTimeMesh {
    type Idx = i64;
    type Value = f64;

    fn size(&self) -> usize {
        self.nodes.len()
    }

    fn is_idx_valid(&self, idx: &Self::Idx) -> bool {
        *idx >= 0 && (*idx as usize) < self.nodes.len()
    }

    fn to_datidx(&self, idx: &Self::Idx) -> usize {
        assert!(
            self.is_idx_valid(idx),
            "index {idx} lies outside a mesh of {} nodes",
            self.nodes.len()
        );
        *idx as usize
    }

    fn to_idx(&self, datidx: usize) -> Self::Idx {
        assert!(
            datidx < self.nodes.len(),
            "data index {datidx} lies outside a mesh of {} nodes",
            self.nodes.len()
        );
        datidx as i64
    }

    fn to_value(&self, idx: &Self::Idx) -> Self::Value {
        let tau = self.nodes[self.to_datidx(idx)] * self.beta;
        // nodes on the negative branch are folded back into [0, beta)
        if tau < 0.0 {
            self.beta + tau
        } else {
            tau
        }
    }

    fn mesh_hash(&self) -> u64 {
        self.mesh_hash
    }

    // closest_idx deliberately keeps the default: nearest-point lookup makes
    // no sense between sparse interpolation nodes.
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MeshError;

    fn mesh() -> DlrImaginaryTimeMesh {
        DlrImaginaryTimeMesh::from_nodes(
            10.0,
            Statistic::Fermion,
            100.0,
            1e-12,
            vec![0.01, 0.2, -0.3, 0.95],
        )
    }

    #[test]
    fn index_conversions_are_the_identity_over_the_valid_range() {
        let mesh = mesh();
        for datidx in 0..mesh.size() {
            let idx = mesh.to_idx(datidx);
            assert!(mesh.is_idx_valid(&idx));
            assert_eq!(mesh.to_datidx(&idx), datidx);
        }
        assert!(!mesh.is_idx_valid(&-1));
        assert!(!mesh.is_idx_valid(&4));
    }

    #[test]
    fn values_are_folded_into_the_fundamental_interval() {
        let mesh = mesh();
        assert!((mesh.to_value(&0) - 0.1).abs() < 1e-12);
        assert!((mesh.to_value(&1) - 2.0).abs() < 1e-12);
        // negative branch: tau = -3.0 folds to beta - 3.0
        assert!((mesh.to_value(&2) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn proximity_queries_are_refused() {
        let mesh = mesh();
        assert!(matches!(
            mesh.closest_idx(&0.5),
            Err(MeshError::ClosestPointUnsupported { .. })
        ));
    }

    #[test]
    fn equality_accounts_for_the_statistic() {
        let fermionic = mesh();
        let same = DlrImaginaryTimeMesh::from_nodes(
            10.0,
            Statistic::Fermion,
            100.0,
            1e-12,
            vec![0.01, 0.2, -0.3, 0.95],
        );
        let bosonic = DlrImaginaryTimeMesh::from_nodes(
            10.0,
            Statistic::Boson,
            100.0,
            1e-12,
            vec![0.01, 0.2, -0.3, 0.95],
        );
        assert_eq!(fermionic, same);
        assert_ne!(fermionic, bosonic);
    }
}
