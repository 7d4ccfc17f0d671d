use crate::prelude::*;

/// Discrete linear dynamics `x' = A x + B u`.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct LinearDynamics<T: Scalar, const N: usize, const M: usize> {
	pub a: Matrix<T, N, N>,
	pub b: Matrix<T, N, M>,
}

impl<T: Scalar, const N: usize, const M: usize> LinearDynamics<T, N, M> {
	pub fn step(&self, x: &Vector<T, N>, u: &Vector<T, M>) -> Vector<T, N> {
		&self.a * x + &self.b * u
	}
}

impl<T: Scalar> LinearDynamics<T, 3, 1> {
	/// Triple integrator over one period `t` of constant jerk, acting on
	/// `(position, velocity, acceleration)`.
	pub fn jerk_integrator(t: T) -> Self {
		let half = T::from_subset(&0.5);
		let sixth = T::from_subset(&(1.0 / 6.0));
		let t2 = t * t;
		let zero = T::zero();
		let one = T::one();
		LinearDynamics {
			a: Matrix::<T, 3, 3>::new(one, t, t2 * half, zero, one, t, zero, zero, one),
			b: Vector::<T, 3>::new(t2 * t * sixth, t2 * half, t),
		}
	}
}
