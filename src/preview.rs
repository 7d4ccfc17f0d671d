//! Linear preview model of the CoM over the horizon.
//!
//! Sample `i` of every prediction is the state at time `(i + 1) T`, reached by
//! holding jerk `u_j` constant over the `j`-th period. Each quantity is an affine
//! map of the initial state `c = (position, velocity, acceleration)` and the jerks:
//!
//! ```text
//! position     = Pps c + Ppu u
//! velocity     = Pvs c + Pvu u
//! acceleration = Pas c + Pau u
//! zmp          = Pzs c + Pzu u,   zmp = position - (h_com / g) acceleration
//! ```

use crate::config::{HorizonConfig, GRAVITY};
use crate::error::{Error, Result};
use crate::linear::LinearDynamics;
use crate::prelude::*;

/// The constant matrices of the preview model. Every `*u` matrix is lower triangular.
#[derive(Debug, PartialEq, Clone)]
pub struct PredictionMatrices<T: Scalar> {
	pub pps: DMatrix<T>,
	pub ppu: DMatrix<T>,
	pub pvs: DMatrix<T>,
	pub pvu: DMatrix<T>,
	pub pas: DMatrix<T>,
	pub pau: DMatrix<T>,
	pub pzs: DMatrix<T>,
	pub pzu: DMatrix<T>,
}

impl<T: Scalar> PredictionMatrices<T> {
	pub fn new(config: &HorizonConfig) -> Self {
		let n = config.n();
		let t = config.t();
		let h_g = config.h_com() / GRAVITY;
		let c = |value: f64| T::from_subset(&value);

		let mut m = PredictionMatrices {
			pps: DMatrix::zeros(n, 3),
			ppu: DMatrix::zeros(n, n),
			pvs: DMatrix::zeros(n, 3),
			pvu: DMatrix::zeros(n, n),
			pas: DMatrix::zeros(n, 3),
			pau: DMatrix::zeros(n, n),
			pzs: DMatrix::zeros(n, 3),
			pzu: DMatrix::zeros(n, n),
		};

		for i in 0..n {
			let ti = (i + 1) as f64 * t;
			let state_rows = [
				(&mut m.pps, [1.0, ti, ti * ti / 2.0]),
				(&mut m.pvs, [0.0, 1.0, ti]),
				(&mut m.pas, [0.0, 0.0, 1.0]),
				(&mut m.pzs, [1.0, ti, ti * ti / 2.0 - h_g]),
			];
			for (matrix, row) in state_rows {
				for (j, value) in row.into_iter().enumerate() {
					matrix[(i, j)] = c(value);
				}
			}

			// Entries with j > i stay zero: sample i only sees jerks up to its own period.
			for j in 0..=i {
				let d = (i - j) as f64;
				let position = (3.0 * d * d + 3.0 * d + 1.0) * t * t * t / 6.0;
				m.ppu[(i, j)] = c(position);
				m.pvu[(i, j)] = c((2.0 * d + 1.0) * t * t / 2.0);
				m.pau[(i, j)] = c(t);
				m.pzu[(i, j)] = c(position - t * h_g);
			}
		}
		m
	}

	/// Horizon length.
	pub fn n(&self) -> usize {
		self.ppu.nrows()
	}
}

/// Predicted sequences of one axis over the horizon.
#[derive(Debug, PartialEq, Clone)]
pub struct Prediction<T: Scalar> {
	pub position: DVector<T>,
	pub velocity: DVector<T>,
	pub acceleration: DVector<T>,
	pub zmp: DVector<T>,
}

/// CoM state of the x, y and orientation axes, each `(position, velocity, acceleration)`.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct CoMState<T: Scalar> {
	pub x: Vector<T, 3>,
	pub y: Vector<T, 3>,
	pub q: Vector<T, 3>,
}

impl<T: Scalar> CoMState<T> {
	pub fn at_rest(x: T, y: T, q: T) -> Self {
		CoMState {
			x: Vector::<T, 3>::new(x, T::zero(), T::zero()),
			y: Vector::<T, 3>::new(y, T::zero(), T::zero()),
			q: Vector::<T, 3>::new(q, T::zero(), T::zero()),
		}
	}

	pub fn position(&self) -> Vector<T, 2> {
		Vector::<T, 2>::new(self.x[0], self.y[0])
	}
}

impl<T: Scalar> Default for CoMState<T> {
	fn default() -> Self {
		CoMState::at_rest(T::zero(), T::zero(), T::zero())
	}
}

/// Preview model shared by the x, y and orientation axes.
#[derive(Debug, PartialEq, Clone)]
pub struct PreviewModel<T: Scalar> {
	matrices: PredictionMatrices<T>,
	integrator: LinearDynamics<T, 3, 1>,
}

impl<T: Scalar> PreviewModel<T> {
	pub fn new(config: &HorizonConfig) -> Self {
		PreviewModel {
			matrices: PredictionMatrices::new(config),
			integrator: LinearDynamics::jerk_integrator(T::from_subset(&config.t())),
		}
	}

	pub fn matrices(&self) -> &PredictionMatrices<T> {
		&self.matrices
	}

	pub fn n(&self) -> usize {
		self.matrices.n()
	}

	/// Predicts one axis from its initial state and a candidate jerk sequence.
	pub fn predict(&self, state: &Vector<T, 3>, jerks: &DVector<T>) -> Result<Prediction<T>> {
		if jerks.len() != self.n() {
			return Err(Error::DimensionMismatch {
				context: "jerk sequence",
				expected: self.n(),
				got: jerks.len(),
			});
		}
		let m = &self.matrices;
		Ok(Prediction {
			position: &m.pps * state + &m.ppu * jerks,
			velocity: &m.pvs * state + &m.pvu * jerks,
			acceleration: &m.pas * state + &m.pau * jerks,
			zmp: &m.pzs * state + &m.pzu * jerks,
		})
	}

	/// Advances a state by one sample under a constant jerk.
	pub fn step(&self, state: &Vector<T, 3>, jerk: T) -> Vector<T, 3> {
		self.integrator.step(state, &Vector::<T, 1>::new(jerk))
	}

	/// Advances every axis by one sample, `jerks` ordered `(x, y, q)`.
	pub fn propagate(&self, com: &CoMState<T>, jerks: [T; 3]) -> CoMState<T> {
		CoMState {
			x: self.step(&com.x, jerks[0]),
			y: self.step(&com.y, jerks[1]),
			q: self.step(&com.q, jerks[2]),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::proptest::*;
	use more_asserts::*;
	use proptest::prelude::*;

	fn model() -> PreviewModel<f64> {
		PreviewModel::new(&HorizonConfig::new(16, 0.1, 0.8, 0.81).unwrap())
	}

	#[test]
	fn zero_state_and_jerks_predict_zero() {
		let model = model();
		let p = model.predict(&Vector::<f64, 3>::zeros(), &DVector::zeros(16)).unwrap();
		for sequence in [&p.position, &p.velocity, &p.acceleration, &p.zmp] {
			assert_eq!(sequence.len(), 16);
			assert!(sequence.iter().all(|&v| v == 0.0));
		}
	}

	#[test]
	fn rejects_wrong_jerk_length() {
		let err = model()
			.predict(&Vector::<f64, 3>::zeros(), &DVector::zeros(15))
			.unwrap_err();
		assert!(matches!(
			err,
			Error::DimensionMismatch {
				expected: 16,
				got: 15,
				..
			}
		));
	}

	#[test]
	fn zmp_trails_accelerating_com() {
		// Accelerating forward puts the ZMP behind the CoM.
		let model = model();
		let p = model
			.predict(&Vector::<f64, 3>::new(0.0, 0.0, 1.0), &DVector::zeros(16))
			.unwrap();
		for i in 0..16 {
			assert_lt!(p.zmp[i], p.position[i]);
			let expected = p.position[i] - 0.81 / GRAVITY * p.acceleration[i];
			assert!((p.zmp[i] - expected).abs() < 1e-12);
		}
	}

	#[test]
	fn propagation_moves_axes_independently() {
		let model = model();
		let com = CoMState::at_rest(0.1, -0.2, 0.3);
		let next = model.propagate(&com, [6.0, 0.0, -6.0]);
		assert_eq!(next.y, com.y);
		assert_gt!(next.x[2], 0.0);
		assert_lt!(next.q[2], 0.0);
		assert_eq!(next.x, model.step(&com.x, 6.0));
	}

	proptest! {
		#[test]
		fn causality(config in horizon_config()) {
			let m = PredictionMatrices::<f64>::new(&config);
			for i in 0..config.n() {
				for j in (i + 1)..config.n() {
					prop_assert_eq!(m.pzu[(i, j)], 0.0);
					prop_assert_eq!(m.ppu[(i, j)], 0.0);
					prop_assert_eq!(m.pvu[(i, j)], 0.0);
					prop_assert_eq!(m.pau[(i, j)], 0.0);
				}
			}
		}

		#[test]
		fn resting_com_stays_put(config in horizon_config(), position in -2.0f64..2.0) {
			let model = PreviewModel::<f64>::new(&config);
			let state = Vector::<f64, 3>::new(position, 0.0, 0.0);
			let p = model.predict(&state, &DVector::zeros(config.n())).unwrap();
			for i in 0..config.n() {
				prop_assert_eq!(p.position[i], position);
				prop_assert_eq!(p.zmp[i], position);
				prop_assert_eq!(p.velocity[i], 0.0);
			}
		}

		#[test]
		fn matches_sample_by_sample_propagation(config in horizon_config(),
								state in vector::<3>(), seed in jerks(24)) {
			let model = PreviewModel::<f64>::new(&config);
			// Horizons hold at most 24 samples.
			let jerks = seed.rows(0, config.n()).into_owned();
			let p = model.predict(&state, &jerks).unwrap();

			const EPSILON: f64 = 1e-9;
			let h_g = config.h_com() / GRAVITY;
			let mut x = state;
			for i in 0..config.n() {
				x = model.step(&x, jerks[i]);
				assert_lt!((p.position[i] - x[0]).abs(), EPSILON);
				assert_lt!((p.velocity[i] - x[1]).abs(), EPSILON);
				assert_lt!((p.acceleration[i] - x[2]).abs(), EPSILON);
				assert_lt!((p.zmp[i] - (x[0] - h_g * x[2])).abs(), EPSILON);
			}
		}
	}
}
