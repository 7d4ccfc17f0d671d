//! Quadratic tracking objective `1/2 z' H z + g' z` over the decision vector.
//!
//! Each horizontal axis contributes the same Hessian block and its own gradient:
//!
//! ```text
//! H = [ a Pvu'Pvu + c Pzu'Pzu + d I    -c Pzu'V ]
//!     [ -c V'Pzu                         c V'V   ]
//! g = [ a Pvu'(Pvs s - r) + c Pzu'(Pzs s - v f) ]
//!     [ -c V'(Pzs s - v f)                       ]
//! ```
//!
//! with `s` the CoM state of the axis, `r` its velocity reference and `f` the
//! stance coordinate. The orientation axis has no constraints and is solved in
//! closed form.

use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::config::Weights;
use crate::error::{Error, Result};
use crate::prelude::*;
use crate::preview::{CoMState, PredictionMatrices};
use crate::selection::FootstepSelector;
use crate::support::SupportState;

/// Desired CoM velocity along x, y and the orientation axis.
#[derive(Debug, PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VelocityReference<T> {
	pub x: T,
	pub y: T,
	pub q: T,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Objective<T: Scalar> {
	pub hessian: DMatrix<T>,
	pub gradient: DVector<T>,
}

impl<T: Scalar> Objective<T> {
	pub fn value(&self, z: &DVector<T>) -> T {
		z.dot(&(&self.hessian * z)) * T::from_subset(&0.5) + self.gradient.dot(z)
	}
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TrackingObjective<T: Scalar> {
	velocity: T,
	zmp: T,
	jerk: T,
}

impl<T: Scalar> TrackingObjective<T> {
	pub fn new(weights: &Weights) -> Self {
		TrackingObjective {
			velocity: T::from_subset(&weights.velocity),
			zmp: T::from_subset(&weights.zmp),
			jerk: T::from_subset(&weights.jerk),
		}
	}

	/// Hessian block of one horizontal axis, `(N + nf)` square.
	pub fn axis_hessian(&self, m: &PredictionMatrices<T>, selection: &DMatrix<T>) -> DMatrix<T> {
		let n = m.n();
		let nf = selection.ncols();
		let jerks = m.pvu.tr_mul(&m.pvu) * self.velocity
			+ m.pzu.tr_mul(&m.pzu) * self.zmp
			+ DMatrix::identity(n, n) * self.jerk;
		let coupling = m.pzu.tr_mul(selection) * -self.zmp;

		let mut h = DMatrix::zeros(n + nf, n + nf);
		h.slice_mut((0, 0), (n, n)).copy_from(&jerks);
		h.slice_mut((0, n), (n, nf)).copy_from(&coupling);
		h.slice_mut((n, 0), (nf, n)).copy_from(&coupling.transpose());
		h.slice_mut((n, n), (nf, nf))
			.copy_from(&(selection.tr_mul(selection) * self.zmp));
		h
	}

	/// Gradient block of one horizontal axis.
	pub fn axis_gradient(
		&self,
		m: &PredictionMatrices<T>,
		indicator: &DVector<T>,
		selection: &DMatrix<T>,
		state: &Vector<T, 3>,
		reference: T,
		stance: T,
	) -> DVector<T> {
		let n = m.n();
		let nf = selection.ncols();
		let velocity_error = (&m.pvs * state).add_scalar(-reference);
		let zmp_free = &m.pzs * state;
		let zmp_error = DVector::from_iterator(
			n,
			izip!(zmp_free.iter(), indicator.iter()).map(|(&z, &v)| z - v * stance),
		);

		let mut g = DVector::zeros(n + nf);
		g.rows_mut(0, n).copy_from(
			&(m.pvu.tr_mul(&velocity_error) * self.velocity + m.pzu.tr_mul(&zmp_error) * self.zmp),
		);
		g.rows_mut(n, nf)
			.copy_from(&(selection.tr_mul(&zmp_error) * -self.zmp));
		g
	}

	/// The objective of both horizontal axes for the current cycle.
	pub fn assemble(
		&self,
		m: &PredictionMatrices<T>,
		selector: &FootstepSelector,
		com: &CoMState<T>,
		reference: &VelocityReference<T>,
		support: &SupportState<T>,
	) -> Objective<T> {
		let indicator = selector.indicator::<T>();
		let selection = selector.selection::<T>();
		let block = self.axis_hessian(m, &selection);
		let k = block.nrows();

		let mut hessian = DMatrix::zeros(2 * k, 2 * k);
		hessian.slice_mut((0, 0), (k, k)).copy_from(&block);
		hessian.slice_mut((k, k), (k, k)).copy_from(&block);

		let mut gradient = DVector::zeros(2 * k);
		for (offset, state, r, f) in izip!(
			[0, k],
			[&com.x, &com.y],
			[reference.x, reference.y],
			[support.x, support.y]
		) {
			gradient
				.rows_mut(offset, k)
				.copy_from(&self.axis_gradient(m, &indicator, &selection, state, r, f));
		}
		Objective { hessian, gradient }
	}

	/// Orientation jerks minimizing velocity tracking and jerk, without constraints.
	pub fn orientation_jerks(
		&self,
		m: &PredictionMatrices<T>,
		state: &Vector<T, 3>,
		reference: T,
	) -> Result<DVector<T>> {
		let n = m.n();
		let h = m.pvu.tr_mul(&m.pvu) * self.velocity + DMatrix::identity(n, n) * self.jerk;
		let rhs = m.pvu.tr_mul(&(&m.pvs * state).add_scalar(-reference)) * -self.velocity;
		h.cholesky()
			.map(|c| c.solve(&rhs))
			.ok_or(Error::Degenerate("orientation Hessian is not positive definite"))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::HorizonConfig;
	use crate::proptest::*;
	use crate::support::Foot;
	use approx::assert_relative_eq;
	use more_asserts::*;
	use proptest::prelude::*;

	fn setup() -> (PredictionMatrices<f64>, FootstepSelector, TrackingObjective<f64>) {
		let config = HorizonConfig::default();
		(
			PredictionMatrices::new(&config),
			FootstepSelector::new(&config),
			TrackingObjective::new(&Weights::default()),
		)
	}

	#[test]
	fn hessian_is_symmetric_and_decoupled() {
		let (m, selector, objective) = setup();
		let o = objective.assemble(
			&m,
			&selector,
			&CoMState::default(),
			&VelocityReference::default(),
			&SupportState::default(),
		);
		assert_eq!(o.hessian.nrows(), 2 * (16 + 2));
		assert_relative_eq!(o.hessian, o.hessian.transpose(), epsilon = 1e-15);
		let k = 18;
		assert!(o.hessian.slice((0, k), (k, k)).iter().all(|&v| v == 0.0));
		assert!(o.hessian.slice((k, 0), (k, k)).iter().all(|&v| v == 0.0));
	}

	#[test]
	fn resting_over_the_stance_is_stationary() {
		let (m, selector, objective) = setup();
		let support = SupportState::new(0.3, -0.1, 0.0, Foot::Right);
		let com = CoMState::at_rest(0.3, -0.1, 0.0);
		let o = objective.assemble(&m, &selector, &com, &VelocityReference::default(), &support);

		// Zero jerks and every footstep on the stance leave the ZMP where it is wanted.
		let mut z = DVector::zeros(36);
		z.rows_mut(16, 2).fill(0.3);
		z.rows_mut(34, 2).fill(-0.1);
		let stationarity = &o.hessian * &z + &o.gradient;
		assert_lt!(stationarity.amax(), 1e-12);
	}

	#[test]
	fn orientation_follows_its_reference() {
		let (m, _, objective) = setup();
		let rest = Vector::<f64, 3>::zeros();
		let still = objective.orientation_jerks(&m, &rest, 0.0).unwrap();
		assert!(still.iter().all(|&u| u == 0.0));

		let turning = objective.orientation_jerks(&m, &rest, 0.5).unwrap();
		assert_gt!(turning[0], 0.0);
		let velocity = &m.pvu * &turning;
		assert_gt!(velocity[15], 0.25);
	}

	proptest! {
		#[test]
		fn value_matches_weighted_errors(com_x in vector::<3>(), com_y in vector::<3>(),
								support in support_state(), rx in -0.5f64..0.5, ry in -0.5f64..0.5,
								ux in jerks(16), uy in jerks(16), fx in vector::<2>(), fy in vector::<2>()) {
			let (m, selector, objective) = setup();
			let weights = Weights::default();
			let com = CoMState { x: com_x, y: com_y, q: Vector::<f64, 3>::zeros() };
			let reference = VelocityReference { x: rx, y: ry, q: 0.0 };
			let o = objective.assemble(&m, &selector, &com, &reference, &support);

			let v = selector.indicator::<f64>();
			let selection = selector.selection::<f64>();
			let mut z = DVector::zeros(36);
			z.rows_mut(0, 16).copy_from(&ux);
			z.rows_mut(16, 2).copy_from(&fx);
			z.rows_mut(18, 16).copy_from(&uy);
			z.rows_mut(34, 2).copy_from(&fy);

			// Costs with and without the decision, the latter being the constant the objective drops.
			let cost = |u: &DVector<f64>, f: &DVector<f64>, state: &Vector<f64, 3>, r: f64, stance: f64| {
				let velocity = (&m.pvs * state + &m.pvu * u).add_scalar(-r);
				let zmp = &m.pzs * state + &m.pzu * u - &v * stance - &selection * f;
				0.5 * (weights.velocity * velocity.norm_squared()
					+ weights.zmp * zmp.norm_squared()
					+ weights.jerk * u.norm_squared())
			};
			let (zero_u, zero_f) = (DVector::zeros(16), DVector::zeros(2));
			let (fx, fy) = (DVector::from_column_slice(fx.as_slice()), DVector::from_column_slice(fy.as_slice()));
			let explicit = cost(&ux, &fx, &com_x, rx, support.x) + cost(&uy, &fy, &com_y, ry, support.y)
				- cost(&zero_u, &zero_f, &com_x, rx, support.x)
				- cost(&zero_u, &zero_f, &com_y, ry, support.y);
			assert_lt!((o.value(&z) - explicit).abs(), 1e-9 * (1.0 + explicit.abs()));
		}
	}
}
