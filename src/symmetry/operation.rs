//! The elementary operations attached to the edges of a symmetry graph.

use num_complex::ComplexFloat;

/// A composable transform relating the values of two symmetry-equivalent
/// array elements.
///
/// The representable transforms are identity, negation, complex conjugation
/// and their combination. Composition is commutative and every transform is
/// an involution, so the four elements form a group closed under composition
/// and inversion.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
pub struct Operation {
    negate: bool,
    conjugate: bool,
}

impl Operation {
    /// The neutral element
    pub fn identity() -> Self {
        Self::default()
    }

    /// Sign flip
    pub fn negation() -> Self {
        Self {
            negate: true,
            conjugate: false,
        }
    }

    /// Complex conjugation
    pub fn conjugation() -> Self {
        Self {
            negate: false,
            conjugate: true,
        }
    }

    /// Whether this operation leaves every value unchanged
    pub fn is_identity(&self) -> bool {
        !self.negate && !self.conjugate
    }

    /// The operation equivalent to applying `self` first and `other` second
    pub fn then(self, other: Self) -> Self {
        Self {
            negate: self.negate ^ other.negate,
            conjugate: self.conjugate ^ other.conjugate,
        }
    }

    /// Every representable transform is an involution, so each operation is
    /// its own inverse
    pub fn inverse(self) -> Self {
        self
    }

    /// Apply the transform to a value
    pub fn apply<T: ComplexFloat>(self, value: T) -> T {
        let value = if self.conjugate { value.conj() } else { value };
        if self.negate {
            -value
        } else {
            value
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use num_complex::Complex;

    fn elements() -> [Operation; 4] {
        [
            Operation::identity(),
            Operation::negation(),
            Operation::conjugation(),
            Operation::negation().then(Operation::conjugation()),
        ]
    }

    #[test]
    fn composition_matches_sequential_application() {
        let value = Complex::new(1.5, -0.5);
        for a in elements() {
            for b in elements() {
                assert_eq!(b.apply(a.apply(value)), a.then(b).apply(value));
            }
        }
    }

    #[test]
    fn every_operation_is_an_involution() {
        let value = Complex::new(-2.0, 3.0);
        for op in elements() {
            assert_eq!(op.apply(op.apply(value)), value);
            assert_eq!(op.then(op), Operation::identity());
            assert_eq!(op.inverse(), op);
        }
    }

    #[test]
    fn operations_act_on_real_values() {
        assert_eq!(Operation::negation().apply(2.0), -2.0);
        assert_eq!(Operation::conjugation().apply(2.0), 2.0);
    }
}
