//! The bridge between mesh coordinates and the storage coordinates of the
//! orbit-partition engine.
//!
//! Domain symmetries and initializers are written against the mesh index of a
//! quantity (plus a target index for tensor-valued quantities); the adapter
//! converts each of them once, at construction, into a closure over storage
//! indices and hands those to the engine. Results travel the opposite way:
//! the storage index of the largest symmetrization correction is converted
//! back into mesh and target coordinates before it reaches the caller.
//!
//! Whether a quantity is scalar or tensor valued changes the shape of every
//! caller-supplied function, so the two cases are split into distinct adapter
//! types selected by a marker parameter; requesting the wrong flavour for a
//! quantity's target rank fails at construction.

use super::Greens;
use crate::error::SymmetryError;
use crate::symmetry::{Operation, SymmetryFn, SymmetryGroup};
use num_complex::ComplexFloat;
use propagator_mesher::Mesh;
use std::marker::PhantomData;

/// A domain symmetry of a scalar-valued quantity: maps a mesh index to its
/// image and the elementary operation relating the two values
pub type ScalarSymmetry<M> =
    Box<dyn Fn(&<M as Mesh>::Idx) -> (<M as Mesh>::Idx, Operation) + Send + Sync>;

/// A domain symmetry of a tensor-valued quantity: maps a mesh index and a
/// target index to their images and the relating operation
pub type TensorSymmetry<M> = Box<
    dyn Fn(&<M as Mesh>::Idx, &[usize]) -> (<M as Mesh>::Idx, Vec<usize>, Operation)
        + Send
        + Sync,
>;

/// Marker for adapters over quantities with an empty target block
pub struct Scalar;

/// Marker for adapters over tensor-valued quantities
pub struct Tensor;

/// The orbit partition of a mesh-sampled quantity, addressed in mesh
/// coordinates.
///
/// Immutable after construction apart from the caller-owned arrays passed to
/// `init` and `symmetrize`; the partition is only valid for arrays of the
/// exact shape of the quantity it was built from.
pub struct GfSymmetryGroup<M: Mesh, Rank> {
    group: SymmetryGroup,
    mesh: M,
    mesh_rank: usize,
    marker: PhantomData<Rank>,
}

impl<M: Mesh, Rank> GfSymmetryGroup<M, Rank> {
    /// The number of orbits in the underlying partition
    pub fn num_classes(&self) -> usize {
        self.group.num_classes()
    }

    /// The underlying storage-coordinate symmetry group
    pub fn group(&self) -> &SymmetryGroup {
        &self.group
    }
}

impl<M> GfSymmetryGroup<M, Scalar>
where
    M: Mesh + 'static,
{
    /// Build the orbit partition of a scalar-valued quantity from domain
    /// symmetries.
    ///
    /// Fails with [`SymmetryError::NonZeroTargetRank`] if the quantity
    /// carries tensor components.
    pub fn new<T>(
        gf: &Greens<M, T>,
        symmetries: Vec<ScalarSymmetry<M>>,
        max_orbit_length: Option<usize>,
    ) -> Result<Self, SymmetryError>
    where
        T: ComplexFloat,
    {
        if gf.target_rank() != 0 {
            return Err(SymmetryError::NonZeroTargetRank {
                found: gf.target_rank(),
            });
        }
        let mesh = gf.mesh().clone();
        let data_symmetries: Vec<SymmetryFn> = symmetries
            .into_iter()
            .map(|symmetry| to_data_symmetry_scalar(mesh.clone(), symmetry))
            .collect();
        let group = SymmetryGroup::new(gf.data().shape(), &data_symmetries, max_orbit_length)?;
        Ok(Self {
            mesh_rank: mesh.mesh_rank(),
            group,
            mesh,
            marker: PhantomData,
        })
    }

    /// Fill the quantity from a mesh-coordinate initializer, evaluating it
    /// exactly once per orbit
    pub fn init<T, H>(&self, gf: &mut Greens<M, T>, init_fn: H, parallel: bool)
    where
        T: ComplexFloat + Send + Sync,
        H: Fn(&M::Idx) -> T + Send + Sync,
    {
        let mesh = &self.mesh;
        let mesh_rank = self.mesh_rank;
        self.group.init(
            gf.data_mut(),
            |index: &[usize]| init_fn(&mesh.idx_from_data_block(&index[..mesh_rank])),
            parallel,
        );
    }

    /// Project the quantity onto its orbit-consistent part, returning the
    /// largest correction, the mesh index where it occurred and an empty
    /// target index
    pub fn symmetrize<T>(&self, gf: &mut Greens<M, T>) -> (T::Real, M::Idx, Vec<usize>)
    where
        T: ComplexFloat + Send + Sync,
        T::Real: Send + Sync,
    {
        let (max_difference, index) = self.group.symmetrize(gf.data_mut());
        let mesh_idx = self.mesh.idx_from_data_block(&index[..self.mesh_rank]);
        (max_difference, mesh_idx, Vec::new())
    }
}

impl<M> GfSymmetryGroup<M, Tensor>
where
    M: Mesh + 'static,
{
    /// Build the orbit partition of a tensor-valued quantity from domain
    /// symmetries.
    ///
    /// Fails with [`SymmetryError::ZeroTargetRank`] if the quantity is
    /// scalar valued.
    pub fn new<T>(
        gf: &Greens<M, T>,
        symmetries: Vec<TensorSymmetry<M>>,
        max_orbit_length: Option<usize>,
    ) -> Result<Self, SymmetryError>
    where
        T: ComplexFloat,
    {
        if gf.target_rank() == 0 {
            return Err(SymmetryError::ZeroTargetRank);
        }
        let mesh = gf.mesh().clone();
        let data_symmetries: Vec<SymmetryFn> = symmetries
            .into_iter()
            .map(|symmetry| to_data_symmetry_tensor(mesh.clone(), symmetry))
            .collect();
        let group = SymmetryGroup::new(gf.data().shape(), &data_symmetries, max_orbit_length)?;
        Ok(Self {
            mesh_rank: mesh.mesh_rank(),
            group,
            mesh,
            marker: PhantomData,
        })
    }

    /// Fill the quantity from a mesh- and target-coordinate initializer,
    /// evaluating it exactly once per orbit
    pub fn init<T, H>(&self, gf: &mut Greens<M, T>, init_fn: H, parallel: bool)
    where
        T: ComplexFloat + Send + Sync,
        H: Fn(&M::Idx, &[usize]) -> T + Send + Sync,
    {
        let mesh = &self.mesh;
        let mesh_rank = self.mesh_rank;
        self.group.init(
            gf.data_mut(),
            |index: &[usize]| {
                init_fn(
                    &mesh.idx_from_data_block(&index[..mesh_rank]),
                    &index[mesh_rank..],
                )
            },
            parallel,
        );
    }

    /// Project the quantity onto its orbit-consistent part, returning the
    /// largest correction together with the mesh and target indices where it
    /// occurred
    pub fn symmetrize<T>(&self, gf: &mut Greens<M, T>) -> (T::Real, M::Idx, Vec<usize>)
    where
        T: ComplexFloat + Send + Sync,
        T::Real: Send + Sync,
    {
        let (max_difference, index) = self.group.symmetrize(gf.data_mut());
        let mesh_idx = self.mesh.idx_from_data_block(&index[..self.mesh_rank]);
        let target_idx = index[self.mesh_rank..].to_vec();
        (max_difference, mesh_idx, target_idx)
    }
}

fn to_data_symmetry_scalar<M: Mesh + 'static>(
    mesh: M,
    symmetry: ScalarSymmetry<M>,
) -> SymmetryFn {
    Box::new(move |index: &[usize]| {
        let mesh_rank = mesh.mesh_rank();
        let (mesh_idx, operation) = symmetry(&mesh.idx_from_data_block(&index[..mesh_rank]));
        let mut image = vec![0; index.len()];
        mesh.idx_to_data_block(&mesh_idx, &mut image[..mesh_rank]);
        (image, operation)
    })
}

fn to_data_symmetry_tensor<M: Mesh + 'static>(
    mesh: M,
    symmetry: TensorSymmetry<M>,
) -> SymmetryFn {
    Box::new(move |index: &[usize]| {
        let mesh_rank = mesh.mesh_rank();
        let (mesh_idx, target_idx, operation) = symmetry(
            &mesh.idx_from_data_block(&index[..mesh_rank]),
            &index[mesh_rank..],
        );
        assert_eq!(
            target_idx.len(),
            index.len() - mesh_rank,
            "a symmetry must preserve the target rank of the quantity"
        );
        let mut image = vec![0; index.len()];
        mesh.idx_to_data_block(&mesh_idx, &mut image[..mesh_rank]);
        image[mesh_rank..].copy_from_slice(&target_idx);
        (image, operation)
    })
}
