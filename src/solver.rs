use crate::constraint::{Constraints, LinearConstraints};
use crate::error::SolverError;
use crate::objective::Objective;
use crate::prelude::*;

/// `min 1/2 z' H z + g' z` subject to `A_eq z = b_eq` and `A_in z <= b_in`.
#[derive(Debug, PartialEq, Clone)]
pub struct QpProblem<T: Scalar> {
	pub hessian: DMatrix<T>,
	pub gradient: DVector<T>,
	pub inequality: LinearConstraints<T>,
	pub equality: LinearConstraints<T>,
}

impl<T: Scalar> QpProblem<T> {
	pub fn new(objective: Objective<T>, constraints: &Constraints<T>) -> Self {
		QpProblem {
			hessian: objective.hessian,
			gradient: objective.gradient,
			inequality: constraints.inequality(),
			equality: constraints.equality.clone(),
		}
	}

	pub fn variables(&self) -> usize {
		self.gradient.len()
	}

	/// Whether `z` satisfies every constraint up to `tolerance`.
	pub fn is_feasible(&self, z: &DVector<T>, tolerance: T) -> bool {
		self.inequality.residual(z).iter().all(|&r| r <= tolerance)
			&& self.equality.residual(z).iter().all(|r| r.abs() <= tolerance)
	}
}

/// A QP backend.
///
/// Closures taking a problem and returning a solution are solvers too, which
/// keeps scripted solutions for tests cheap to write.
pub trait Solver<T: Scalar> {
	fn solve(&mut self, problem: &QpProblem<T>) -> Result<DVector<T>, SolverError>;
}

impl<T: Scalar, F> Solver<T> for F
where
	F: FnMut(&QpProblem<T>) -> Result<DVector<T>, SolverError>,
{
	fn solve(&mut self, problem: &QpProblem<T>) -> Result<DVector<T>, SolverError> {
		self(problem)
	}
}

#[cfg(feature = "clarabel")]
pub use self::clarabel_backend::ClarabelSolver;

#[cfg(feature = "clarabel")]
mod clarabel_backend {
	use clarabel::algebra::CscMatrix;
	use clarabel::solver::{
		DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus,
		SupportedConeT::{self, NonnegativeConeT, ZeroConeT},
	};

	use super::{QpProblem, Solver};
	use crate::error::SolverError;
	use crate::prelude::*;

	// Entries this small are dropped from the sparse matrices.
	const SPARSITY_THRESHOLD: f64 = 1e-15;

	/// Interior-point QP solver backed by Clarabel.
	#[derive(Debug, PartialEq, Clone, Copy)]
	pub struct ClarabelSolver {
		pub max_iter: u32,
		pub tolerance: f64,
	}

	impl Default for ClarabelSolver {
		fn default() -> Self {
			ClarabelSolver {
				max_iter: 200,
				tolerance: 1e-8,
			}
		}
	}

	/// Column-compressed copy of `m`, restricted to the upper triangle when `upper` is set.
	fn to_csc(m: &DMatrix<f64>, upper: bool) -> CscMatrix<f64> {
		let (rows, cols) = m.shape();
		let mut colptr = vec![0usize; cols + 1];
		let mut rowval = Vec::new();
		let mut nzval = Vec::new();
		for j in 0..cols {
			let end = if upper { (j + 1).min(rows) } else { rows };
			for i in 0..end {
				let v = m[(i, j)];
				if v.abs() > SPARSITY_THRESHOLD {
					rowval.push(i);
					nzval.push(v);
				}
			}
			colptr[j + 1] = rowval.len();
		}
		CscMatrix::new(rows, cols, colptr, rowval, nzval)
	}

	impl Solver<f64> for ClarabelSolver {
		fn solve(&mut self, problem: &QpProblem<f64>) -> Result<DVector<f64>, SolverError> {
			let n = problem.variables();
			let (n_eq, n_in) = (problem.equality.rows(), problem.inequality.rows());
			let constraints = problem.equality.stack(&problem.inequality);

			let mut cones: Vec<SupportedConeT<f64>> = Vec::new();
			if n_eq > 0 {
				cones.push(ZeroConeT(n_eq));
			}
			if n_in > 0 {
				cones.push(NonnegativeConeT(n_in));
			}

			let settings = DefaultSettingsBuilder::default()
				.max_iter(self.max_iter)
				.verbose(false)
				.tol_gap_abs(self.tolerance)
				.tol_gap_rel(self.tolerance)
				.tol_feas(self.tolerance)
				.build()
				.map_err(|e| SolverError::Setup(format!("{:?}", e)))?;

			let p = to_csc(&problem.hessian, true);
			let a = to_csc(&constraints.a, false);
			let q: Vec<f64> = problem.gradient.iter().copied().collect();
			let b: Vec<f64> = constraints.b.iter().copied().collect();

			let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
				.map_err(|e| SolverError::Setup(format!("{:?}", e)))?;
			solver.solve();

			let solution = &solver.solution;
			tracing::trace!(
				status = ?solution.status,
				iterations = solution.iterations,
				variables = n,
				equalities = n_eq,
				inequalities = n_in,
				"clarabel solve"
			);
			if !matches!(
				solution.status,
				SolverStatus::Solved | SolverStatus::AlmostSolved
			) {
				return Err(SolverError::NotConverged(format!("{:?}", solution.status)));
			}
			if solution.x.len() != n {
				return Err(SolverError::WrongSolutionSize {
					expected: n,
					got: solution.x.len(),
				});
			}
			Ok(DVector::from_column_slice(&solution.x))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	/// `min 1/2 (x^2 + y^2) - x - y`, optionally with `x + y <= 1` and `x = y`.
	fn problem(inequality: bool, equality: bool) -> QpProblem<f64> {
		let rows = |on: bool, a: &[f64], b: f64| {
			if on {
				LinearConstraints {
					a: DMatrix::from_row_slice(1, 2, a),
					b: DVector::from_element(1, b),
				}
			} else {
				LinearConstraints::empty(2)
			}
		};
		QpProblem {
			hessian: DMatrix::identity(2, 2),
			gradient: DVector::from_element(2, -1.0),
			inequality: rows(inequality, &[1.0, 1.0], 1.0),
			equality: rows(equality, &[1.0, -1.0], 0.0),
		}
	}

	#[test]
	fn closures_are_solvers() {
		let mut calls = 0;
		let mut solver = |p: &QpProblem<f64>| {
			calls += 1;
			Ok::<_, SolverError>(DVector::zeros(p.variables()))
		};
		let z = Solver::solve(&mut solver, &problem(true, false)).unwrap();
		assert_eq!(z.len(), 2);
		assert_eq!(calls, 1);
	}

	#[test]
	fn feasibility_check() {
		let p = problem(true, true);
		assert!(p.is_feasible(&DVector::from_vec(vec![0.5, 0.5]), 1e-12));
		assert!(!p.is_feasible(&DVector::from_vec(vec![0.6, 0.6]), 1e-12));
		assert!(!p.is_feasible(&DVector::from_vec(vec![0.5, 0.4]), 1e-12));
	}

	#[cfg(feature = "clarabel")]
	mod backend {
		use super::*;
		use approx::assert_relative_eq;

		#[test]
		fn unconstrained_minimum() {
			let z = ClarabelSolver::default().solve(&problem(false, false)).unwrap();
			assert_relative_eq!(z, DVector::from_vec(vec![1.0, 1.0]), epsilon = 1e-6);
		}

		#[test]
		fn active_constraints() {
			let z = ClarabelSolver::default().solve(&problem(true, true)).unwrap();
			assert_relative_eq!(z, DVector::from_vec(vec![0.5, 0.5]), epsilon = 1e-6);
		}

		#[test]
		fn infeasible_problem_is_an_error() {
			let mut p = problem(true, false);
			p.inequality = p.inequality.stack(&LinearConstraints {
				a: DMatrix::from_row_slice(1, 2, &[-1.0, -1.0]),
				b: DVector::from_element(1, -2.0),
			});
			let err = ClarabelSolver::default().solve(&p).unwrap_err();
			assert!(matches!(err, SolverError::NotConverged(_)));
		}
	}
}
