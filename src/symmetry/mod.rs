//! Symmetry module
//!
//! Partitions the index space of a dense array into orbits under a set of
//! symmetry operations, so that a quantity respecting those symmetries only
//! has to be computed once per orbit:
//!
//! - `init` evaluates a caller-supplied function at one representative per
//!   orbit and propagates the value to every other member through the
//!   elementary operation accumulated along the symmetry graph.
//! - `symmetrize` projects an already-populated array onto its
//!   orbit-consistent part and reports the largest correction applied, which
//!   doubles as a diagnostic for how well the data respected the claimed
//!   symmetries in the first place.
//!
//! Orbits are independent of one another, so both operations distribute over
//! a thread pool without locking.

mod operation;

pub use operation::Operation;

use crate::error::SymmetryError;
use ndarray::{ArrayD, IxDyn, Zip};
use num_complex::ComplexFloat;
use num_traits::Zero;
use rayon::prelude::*;
use std::collections::VecDeque;

/// A symmetry in storage coordinates: maps a storage index to its image and
/// the elementary operation relating the two values.
pub type SymmetryFn = Box<dyn Fn(&[usize]) -> (Vec<usize>, Operation) + Send + Sync>;

/// One member of an orbit: the flat offset into the storage array and the
/// operation mapping the representative's value onto this member's value.
#[derive(Clone, Copy, Debug)]
pub struct OrbitMember {
    /// Flat storage offset of the member
    pub index: usize,
    /// Accumulated operation relative to the orbit representative
    pub operation: Operation,
}

/// The orbit partition of an array index space under a set of symmetries.
///
/// Built once for a fixed array shape and symmetry list, then reused across
/// any number of `init` and `symmetrize` calls against arrays of that exact
/// shape. The partition itself is immutable, so a group may be shared
/// read-only between threads.
///
/// The construction takes each symmetry function at its word: it does not
/// verify that two different symmetry paths between the same pair of indices
/// compose to the same operation. For over-determined index pairs the
/// operation found first (breadth-first from the representative) wins;
/// supplying a set of functions that is not a consistent group is the
/// caller's responsibility.
pub struct SymmetryGroup {
    shape: Vec<usize>,
    strides: Vec<usize>,
    orbits: Vec<Vec<OrbitMember>>,
    class_map: ArrayD<usize>,
    op_map: ArrayD<Operation>,
}

impl SymmetryGroup {
    /// Partition the index space of an array of shape `shape` into orbits.
    ///
    /// Every storage index is a node of an implicit graph whose labeled edges
    /// are the symmetry-function applications; orbits are the connected
    /// components, discovered breadth-first from every not-yet-visited index
    /// in increasing linear order. Each component's minimum index becomes its
    /// representative.
    ///
    /// With `max_orbit_length` set, exploration of an orbit stops once that
    /// many members are found; indices beyond the bound land in separate,
    /// smaller orbits. This is an approximation knob for very large index
    /// spaces, not a correctness one.
    #[tracing::instrument(name = "Symmetry group builder", level = "info", skip(symmetries))]
    pub fn new(
        shape: &[usize],
        symmetries: &[SymmetryFn],
        max_orbit_length: Option<usize>,
    ) -> Result<Self, SymmetryError> {
        let size: usize = shape.iter().product();
        let strides = row_major_strides(shape);

        const UNASSIGNED: usize = usize::MAX;
        let mut class_of = vec![UNASSIGNED; size];
        let mut op_of = vec![Operation::identity(); size];
        let mut orbits: Vec<Vec<OrbitMember>> = Vec::new();

        for start in 0..size {
            if class_of[start] != UNASSIGNED {
                continue;
            }
            // scanning in increasing order makes `start` the minimum of its
            // component, i.e. the representative
            let class = orbits.len();
            class_of[start] = class;
            let mut members = vec![OrbitMember {
                index: start,
                operation: Operation::identity(),
            }];
            let mut queue = VecDeque::from([start]);

            while let Some(flat) = queue.pop_front() {
                let index = unflatten(flat, shape, &strides);
                let accumulated = op_of[flat];
                for symmetry in symmetries {
                    let (image, edge) = symmetry(&index);
                    if image.len() != shape.len()
                        || image.iter().zip(shape).any(|(&i, &extent)| i >= extent)
                    {
                        return Err(SymmetryError::IndexOutOfRange {
                            from: index,
                            to: image,
                            shape: shape.to_vec(),
                        });
                    }
                    let image_flat = flatten(&image, &strides);
                    if class_of[image_flat] != UNASSIGNED {
                        continue;
                    }
                    if max_orbit_length.map_or(false, |bound| members.len() >= bound) {
                        // capped: the image seeds its own orbit later
                        continue;
                    }
                    let composed = accumulated.then(edge);
                    class_of[image_flat] = class;
                    op_of[image_flat] = composed;
                    members.push(OrbitMember {
                        index: image_flat,
                        operation: composed,
                    });
                    queue.push_back(image_flat);
                }
            }
            orbits.push(members);
        }
        tracing::debug!(classes = orbits.len(), size, "orbit partition complete");

        let class_map = ArrayD::from_shape_vec(IxDyn(shape), class_of)
            .expect("the class table was built for exactly this shape");
        let op_map = ArrayD::from_shape_vec(IxDyn(shape), op_of)
            .expect("the operation table was built for exactly this shape");

        Ok(Self {
            shape: shape.to_vec(),
            strides,
            orbits,
            class_map,
            op_map,
        })
    }

    /// The number of orbits in the partition
    pub fn num_classes(&self) -> usize {
        self.orbits.len()
    }

    /// The array shape the partition was built for
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The orbits, each led by its representative
    pub fn orbits(&self) -> &[Vec<OrbitMember>] {
        &self.orbits
    }

    /// The orbit a storage index belongs to
    pub fn class_of(&self, index: &[usize]) -> usize {
        self.class_map[IxDyn(index)]
    }

    /// The representative index of an orbit
    pub fn representative(&self, class: usize) -> Vec<usize> {
        unflatten(self.orbits[class][0].index, &self.shape, &self.strides)
    }

    /// Fill `data` from `init_fn`, evaluating it exactly once per orbit.
    ///
    /// The initializer is called at each orbit representative and the result
    /// propagated to every member through its accumulated operation,
    /// overwriting the whole array. With `parallel` set the representatives
    /// are evaluated on the rayon pool, so `init_fn` must tolerate concurrent
    /// invocation; the engine never serialises calls on the caller's behalf.
    pub fn init<T, F>(&self, data: &mut ArrayD<T>, init_fn: F, parallel: bool)
    where
        T: ComplexFloat + Send + Sync,
        F: Fn(&[usize]) -> T + Send + Sync,
    {
        assert_eq!(
            data.shape(),
            self.shape.as_slice(),
            "the array must have the shape the symmetry group was built for"
        );
        let evaluate = |orbit: &Vec<OrbitMember>| {
            init_fn(&unflatten(orbit[0].index, &self.shape, &self.strides))
        };
        let representative_values: Vec<T> = if parallel {
            self.orbits.par_iter().map(evaluate).collect()
        } else {
            self.orbits.iter().map(evaluate).collect()
        };

        let zip = Zip::from(&mut *data).and(&self.class_map).and(&self.op_map);
        let propagate = |value: &mut T, &class: &usize, &op: &Operation| {
            *value = op.apply(representative_values[class]);
        };
        if parallel {
            zip.par_for_each(propagate);
        } else {
            zip.for_each(propagate);
        }
    }

    /// Project `data` onto its orbit-consistent part.
    ///
    /// For each orbit every member's accumulated operation is un-applied to
    /// obtain an estimate of the representative's true value; the estimates
    /// are averaged and written back through each member's operation. Returns
    /// the largest absolute correction applied and the storage index where it
    /// occurred. A maximum near machine epsilon certifies that the data
    /// already respected the symmetries; a large value signals noise or a
    /// wrong symmetry specification.
    pub fn symmetrize<T>(&self, data: &mut ArrayD<T>) -> (T::Real, Vec<usize>)
    where
        T: ComplexFloat + Send + Sync,
        T::Real: Send + Sync,
    {
        assert_eq!(
            data.shape(),
            self.shape.as_slice(),
            "the array must have the shape the symmetry group was built for"
        );
        if self.orbits.is_empty() {
            return (T::Real::zero(), vec![0; self.shape.len()]);
        }

        let flat = data
            .as_slice()
            .expect("symmetry groups operate on standard-layout arrays");
        let consistent: Vec<(T, (T::Real, usize))> = self
            .orbits
            .par_iter()
            .map(|orbit| {
                let length = T::from(orbit.len()).expect("an orbit length is representable");
                let mean = orbit
                    .iter()
                    .map(|member| member.operation.inverse().apply(flat[member.index]))
                    .fold(T::zero(), |sum, estimate| sum + estimate)
                    / length;
                let mut worst = (T::Real::zero(), orbit[0].index);
                for member in orbit {
                    let corrected = member.operation.apply(mean);
                    let difference = (corrected - flat[member.index]).abs();
                    if difference > worst.0 {
                        worst = (difference, member.index);
                    }
                }
                (mean, worst)
            })
            .collect();

        let means: Vec<T> = consistent.iter().map(|&(mean, _)| mean).collect();
        Zip::from(&mut *data)
            .and(&self.class_map)
            .and(&self.op_map)
            .par_for_each(|value, &class, &op| *value = op.apply(means[class]));

        let (max_difference, max_index) = consistent
            .iter()
            .map(|&(_, worst)| worst)
            .fold((T::Real::zero(), 0), |best, candidate| {
                if candidate.0 > best.0 {
                    candidate
                } else {
                    best
                }
            });
        (max_difference, unflatten(max_index, &self.shape, &self.strides))
    }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

fn flatten(index: &[usize], strides: &[usize]) -> usize {
    index.iter().zip(strides).map(|(i, s)| i * s).sum()
}

fn unflatten(flat: usize, shape: &[usize], strides: &[usize]) -> Vec<usize> {
    shape
        .iter()
        .zip(strides)
        .map(|(&extent, &stride)| flat / stride % extent)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::ArrayD;
    use num_complex::Complex;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn reflection(length: usize) -> Vec<SymmetryFn> {
        vec![Box::new(move |index: &[usize]| {
            (vec![length - 1 - index[0]], Operation::negation())
        })]
    }

    #[test]
    fn a_reflection_partitions_a_line_into_nested_pairs() {
        let group = SymmetryGroup::new(&[4], &reflection(4), None).unwrap();
        assert_eq!(group.num_classes(), 2);
        assert_eq!(group.class_of(&[0]), group.class_of(&[3]));
        assert_eq!(group.class_of(&[1]), group.class_of(&[2]));
        assert_ne!(group.class_of(&[0]), group.class_of(&[1]));
        assert_eq!(group.representative(0), vec![0]);
        assert_eq!(group.representative(1), vec![1]);
    }

    #[test]
    fn filling_evaluates_representatives_and_propagates_the_sign() {
        let group = SymmetryGroup::new(&[4], &reflection(4), None).unwrap();
        let mut data = ArrayD::<f64>::zeros(IxDyn(&[4]));
        group.init(&mut data, |index| index[0] as f64 + 1.0, false);
        assert_eq!(data.as_slice().unwrap(), &[1.0, 2.0, -2.0, -1.0]);
    }

    #[test]
    fn symmetrizing_consistent_data_applies_no_correction() {
        let group = SymmetryGroup::new(&[4], &reflection(4), None).unwrap();
        let mut data = ArrayD::from_shape_vec(IxDyn(&[4]), vec![1.0, 2.0, -2.0, -1.0]).unwrap();
        let (max_difference, index) = group.symmetrize(&mut data);
        assert_abs_diff_eq!(max_difference, 0.0, epsilon = 1e-14);
        assert_eq!(index, vec![0]);
        assert_eq!(data.as_slice().unwrap(), &[1.0, 2.0, -2.0, -1.0]);
    }

    #[test]
    fn symmetrizing_perturbed_data_reports_the_correction() {
        let group = SymmetryGroup::new(&[4], &reflection(4), None).unwrap();
        let mut data = ArrayD::from_shape_vec(IxDyn(&[4]), vec![1.1, 2.0, -2.0, -1.0]).unwrap();
        let (max_difference, index) = group.symmetrize(&mut data);
        assert_abs_diff_eq!(max_difference, 0.05, epsilon = 1e-14);
        assert_eq!(index, vec![0]);
        let corrected = data.as_slice().unwrap();
        assert_abs_diff_eq!(corrected[0], 1.05, epsilon = 1e-14);
        assert_abs_diff_eq!(corrected[3], -1.05, epsilon = 1e-14);
        assert_abs_diff_eq!(corrected[1], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn filling_then_symmetrizing_changes_nothing() {
        let symmetries: Vec<SymmetryFn> = vec![
            Box::new(|index: &[usize]| (vec![index[1], index[0]], Operation::identity())),
            Box::new(|index: &[usize]| (vec![5 - index[0], index[1]], Operation::negation())),
        ];
        let group = SymmetryGroup::new(&[6, 6], &symmetries, None).unwrap();
        let mut data = ArrayD::<Complex<f64>>::zeros(IxDyn(&[6, 6]));
        group.init(
            &mut data,
            |index| Complex::new(index[0] as f64, index[1] as f64 + 0.5),
            false,
        );
        let filled = data.clone();
        let (max_difference, _) = group.symmetrize(&mut data);
        assert_abs_diff_eq!(max_difference, 0.0, epsilon = 1e-12);
        assert_eq!(data, filled);
    }

    #[test]
    fn parallel_and_serial_fills_agree() {
        let symmetries: Vec<SymmetryFn> = vec![Box::new(|index: &[usize]| {
            (vec![index[1], index[0]], Operation::conjugation())
        })];
        let group = SymmetryGroup::new(&[8, 8], &symmetries, None).unwrap();
        let init_fn =
            |index: &[usize]| Complex::new(index[0] as f64 + 1.0, index[1] as f64 - 2.0);
        let mut serial = ArrayD::<Complex<f64>>::zeros(IxDyn(&[8, 8]));
        let mut parallel = ArrayD::<Complex<f64>>::zeros(IxDyn(&[8, 8]));
        group.init(&mut serial, init_fn, false);
        group.init(&mut parallel, init_fn, true);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn symmetrizing_twice_is_idempotent() {
        let group = SymmetryGroup::new(&[16], &reflection(16), None).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let noisy: Vec<f64> = (0..16).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let mut data = ArrayD::from_shape_vec(IxDyn(&[16]), noisy).unwrap();
        group.symmetrize(&mut data);
        let (second_difference, _) = group.symmetrize(&mut data);
        assert_abs_diff_eq!(second_difference, 0.0, epsilon = 1e-14);
    }

    #[test]
    fn orbit_length_bound_caps_exploration() {
        let group = SymmetryGroup::new(&[4], &reflection(4), Some(1)).unwrap();
        assert_eq!(group.num_classes(), 4);
        for (class, orbit) in group.orbits().iter().enumerate() {
            assert_eq!(orbit.len(), 1);
            assert_eq!(orbit[0].index, class);
        }
    }

    #[test]
    fn out_of_range_images_are_rejected_at_construction() {
        let escaping: Vec<SymmetryFn> =
            vec![Box::new(|index: &[usize]| (vec![index[0] + 1], Operation::identity()))];
        assert!(matches!(
            SymmetryGroup::new(&[4], &escaping, None),
            Err(SymmetryError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "the shape the symmetry group was built for")]
    fn mismatched_array_shapes_fail_fast() {
        let group = SymmetryGroup::new(&[4], &reflection(4), None).unwrap();
        let mut data = ArrayD::<f64>::zeros(IxDyn(&[5]));
        group.init(&mut data, |index| index[0] as f64, false);
    }

    #[test]
    fn rebuilding_the_same_group_is_deterministic() {
        let build = || {
            let symmetries: Vec<SymmetryFn> = vec![
                Box::new(|index: &[usize]| (vec![index[1], index[0]], Operation::identity())),
                Box::new(|index: &[usize]| {
                    (vec![(index[0] + 2) % 5, index[1]], Operation::identity())
                }),
            ];
            SymmetryGroup::new(&[5, 5], &symmetries, None).unwrap()
        };
        let first = build();
        let second = build();
        assert_eq!(first.num_classes(), second.num_classes());
        assert_eq!(first.class_map, second.class_map);
        for class in 0..first.num_classes() {
            assert_eq!(first.representative(class), second.representative(class));
        }
    }

    proptest! {
        #[test]
        fn orbits_partition_the_index_space(
            rows in 1usize..7,
            cols in 1usize..7,
            shift in 0usize..5,
        ) {
            let symmetries: Vec<SymmetryFn> = vec![
                Box::new(move |index: &[usize]| {
                    (vec![rows - 1 - index[0], cols - 1 - index[1]], Operation::negation())
                }),
                Box::new(move |index: &[usize]| {
                    (vec![(index[0] + shift) % rows, index[1]], Operation::identity())
                }),
            ];
            let group = SymmetryGroup::new(&[rows, cols], &symmetries, None).unwrap();

            // every index appears in exactly one orbit
            let mut seen = vec![0usize; rows * cols];
            for orbit in group.orbits() {
                for member in orbit {
                    seen[member.index] += 1;
                }
            }
            prop_assert!(seen.iter().all(|&count| count == 1));

            // representatives are the orbit minima and lead their members
            for orbit in group.orbits() {
                let representative = orbit[0];
                prop_assert!(representative.operation.is_identity());
                prop_assert!(orbit.iter().all(|member| member.index >= representative.index));
            }

            // the class lookup agrees with the member lists
            for (class, orbit) in group.orbits().iter().enumerate() {
                for member in orbit {
                    let index = unflatten(member.index, &[rows, cols], &row_major_strides(&[rows, cols]));
                    prop_assert_eq!(group.class_of(&index), class);
                }
            }
        }
    }
}
