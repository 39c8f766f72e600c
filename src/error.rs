use miette::Diagnostic;
use propagator_mesher::MeshError;

#[derive(thiserror::Error, Debug, Diagnostic)]
/// Errors raised when building a symmetry group or its domain adapter
pub enum SymmetryError {
    /// A symmetry function produced an image outside the array it was
    /// registered for
    #[error("a symmetry maps index {from:?} to {to:?}, outside an array of shape {shape:?}")]
    IndexOutOfRange {
        /// Pre-image storage index
        from: Vec<usize>,
        /// Offending image
        to: Vec<usize>,
        /// Shape of the array the group was built for
        shape: Vec<usize>,
    },
    /// A scalar-valued adapter was requested for a quantity with tensor
    /// components
    #[error("a scalar-valued symmetry group requires target rank 0, but the quantity has target rank {found}")]
    NonZeroTargetRank {
        /// Target rank of the offending quantity
        found: usize,
    },
    /// A tensor-valued adapter was requested for a scalar quantity
    #[error("a tensor-valued symmetry group requires a nonzero target rank")]
    ZeroTargetRank,
}

#[derive(thiserror::Error, Debug, Diagnostic)]
/// General error for lattice-backed operator construction
pub enum BuildError {
    /// Inconsistent tight-binding inputs
    #[error("{0}")]
    TightBinding(String),
    /// A mesh could not be constructed
    #[error(transparent)]
    Mesh(#[from] MeshError),
}
