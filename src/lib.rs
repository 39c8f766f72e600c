// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Propagator computes Green's functions on structured meshes and exploits
//! their point-group symmetries to avoid redundant work.
//!
//! # Overview
//! A quantity sampled on a mesh rarely has independent values at every mesh
//! point: lattice symmetries, hermiticity and particle-hole relations tie
//! large sets of array elements to one another up to a sign or a complex
//! conjugation. This crate partitions the index space of such an array into
//! orbits under a caller-supplied set of symmetry operations, so the quantity
//! only has to be evaluated once per orbit and can afterwards be projected
//! back onto its symmetric part to gauge how well a numerical result respects
//! the symmetries it was claimed to have.
//!
//! The engine in [`symmetry`] works on raw storage indices and is agnostic to
//! what the array represents. The adapter in [`greens_functions`] translates
//! between storage coordinates and the mesh (and tensor-component) indices of
//! a physical quantity, with the mesh variants supplied by the
//! `propagator-mesher` crate. [`hamiltonian`] holds the tight-binding
//! consumers that produce such quantities in the first place.

#![warn(missing_docs)]
#![allow(clippy::type_complexity)]

/// Error handling
mod error;

/// Greens function methods
pub mod greens_functions;

/// Tight-binding Hamiltonians and band-structure utilities
pub mod hamiltonian;

/// Orbit partitions of array index spaces under symmetry operations
pub mod symmetry;

pub use error::{BuildError, SymmetryError};
