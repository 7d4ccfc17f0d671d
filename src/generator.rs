//! Receding-horizon walking pattern generator.
//!
//! One [`WalkingGenerator::step`] runs a full control cycle: the objective and
//! constraints are assembled for the current support state, the QP goes to the
//! injected [`Solver`], the first jerks of the solution move the CoM by one
//! sample and the footstep selection advances. When the stance phase runs out
//! the first planned footstep lands and becomes the new support.

use crate::config::GeneratorConfig;
use crate::constraint::{ConstraintAssembler, Constraints, FootRegions};
use crate::error::{Error, Result, SolverError};
use crate::objective::{TrackingObjective, VelocityReference};
use crate::observer::{Event, Observer};
use crate::prelude::*;
use crate::preview::{CoMState, Prediction, PreviewModel};
use crate::selection::{FootstepSelector, Transition};
use crate::solver::{QpProblem, Solver};
use crate::support::SupportState;

/// The decision of the last solve.
#[derive(Debug, PartialEq, Clone)]
pub struct Plan<T: Scalar> {
	pub jerk_x: DVector<T>,
	pub jerk_y: DVector<T>,
	pub jerk_q: DVector<T>,
	pub footsteps_x: DVector<T>,
	pub footsteps_y: DVector<T>,
}

impl<T: Scalar> Plan<T> {
	/// Zero jerks with every planned footstep on the stance.
	fn resting(n: usize, nf: usize, support: &SupportState<T>) -> Self {
		Plan {
			jerk_x: DVector::zeros(n),
			jerk_y: DVector::zeros(n),
			jerk_q: DVector::zeros(n),
			footsteps_x: DVector::from_element(nf, support.x),
			footsteps_y: DVector::from_element(nf, support.y),
		}
	}

	/// Splits a decision vector `[jerk_x, F_x, jerk_y, F_y]`.
	fn from_solution(z: &DVector<T>, n: usize, nf: usize, jerk_q: DVector<T>) -> Self {
		Plan {
			jerk_x: z.rows(0, n).clone_owned(),
			footsteps_x: z.rows(n, nf).clone_owned(),
			jerk_y: z.rows(n + nf, n).clone_owned(),
			footsteps_y: z.rows(2 * n + nf, nf).clone_owned(),
			jerk_q,
		}
	}

	pub fn footsteps(&self) -> impl Iterator<Item = Vector<T, 2>> + '_ {
		self.footsteps_x
			.iter()
			.zip(self.footsteps_y.iter())
			.map(|(&x, &y)| Vector::<T, 2>::new(x, y))
	}
}

/// Predictions of every axis over the horizon.
#[derive(Debug, PartialEq, Clone)]
pub struct Trajectories<T: Scalar> {
	pub x: Prediction<T>,
	pub y: Prediction<T>,
	pub q: Prediction<T>,
}

pub struct WalkingGenerator<T: Scalar> {
	config: GeneratorConfig,
	model: PreviewModel<T>,
	selector: FootstepSelector,
	assembler: ConstraintAssembler<T>,
	objective: TrackingObjective<T>,
	com: CoMState<T>,
	support: SupportState<T>,
	reference: VelocityReference<T>,
	plan: Plan<T>,
	cycles: usize,
	observer: Option<Box<dyn Observer<T>>>,
}

impl<T: Scalar> WalkingGenerator<T> {
	pub fn new(config: GeneratorConfig) -> Result<Self> {
		config.validate()?;
		let horizon = config.horizon;
		let regions = FootRegions::new(&config.geometry)?;
		let support = SupportState::default();
		Ok(WalkingGenerator {
			model: PreviewModel::new(&horizon),
			selector: FootstepSelector::new(&horizon),
			assembler: ConstraintAssembler::new(horizon.n(), horizon.nf(), regions),
			objective: TrackingObjective::new(&config.weights),
			com: CoMState::default(),
			reference: VelocityReference {
				x: T::zero(),
				y: T::zero(),
				q: T::zero(),
			},
			plan: Plan::resting(horizon.n(), horizon.nf(), &support),
			support,
			cycles: 0,
			observer: None,
			config,
		})
	}

	pub fn with_observer(mut self, observer: impl Observer<T> + 'static) -> Self {
		self.observer = Some(Box::new(observer));
		self
	}

	/// Restarts walking from the given CoM and support states.
	pub fn set_initial_values(&mut self, com: CoMState<T>, support: SupportState<T>) {
		let horizon = &self.config.horizon;
		self.com = com;
		self.support = support;
		self.selector.reset();
		self.plan = Plan::resting(horizon.n(), horizon.nf(), &support);
		self.cycles = 0;
	}

	pub fn config(&self) -> &GeneratorConfig {
		&self.config
	}

	pub fn model(&self) -> &PreviewModel<T> {
		&self.model
	}

	pub fn selector(&self) -> &FootstepSelector {
		&self.selector
	}

	pub fn com(&self) -> &CoMState<T> {
		&self.com
	}

	pub fn support(&self) -> &SupportState<T> {
		&self.support
	}

	pub fn plan(&self) -> &Plan<T> {
		&self.plan
	}

	/// Completed control cycles since the last restart.
	pub fn cycles(&self) -> usize {
		self.cycles
	}

	pub fn reference(&self) -> &VelocityReference<T> {
		&self.reference
	}

	pub fn reference_mut(&mut self) -> &mut VelocityReference<T> {
		&mut self.reference
	}

	/// Predictions of the current plan from the current CoM state.
	pub fn simulate(&self) -> Result<Trajectories<T>> {
		Ok(Trajectories {
			x: self.model.predict(&self.com.x, &self.plan.jerk_x)?,
			y: self.model.predict(&self.com.y, &self.plan.jerk_y)?,
			q: self.model.predict(&self.com.q, &self.plan.jerk_q)?,
		})
	}

	pub fn constraints(&self) -> Constraints<T> {
		self.assembler.assemble(
			&self.support,
			&self.selector,
			self.model.matrices(),
			&self.com.x,
			&self.com.y,
		)
	}

	/// The QP of the current cycle.
	pub fn problem(&self) -> QpProblem<T> {
		let objective = self.objective.assemble(
			self.model.matrices(),
			&self.selector,
			&self.com,
			&self.reference,
			&self.support,
		);
		QpProblem::new(objective, &self.constraints())
	}

	/// Runs one control cycle. Errors leave the generator untouched.
	pub fn step(&mut self, solver: &mut impl Solver<T>) -> Result<Transition> {
		let horizon = self.config.horizon;
		let (n, nf) = (horizon.n(), horizon.nf());

		let problem = self.problem();
		let z = solver.solve(&problem)?;
		if z.len() != problem.variables() {
			return Err(Error::Solver(SolverError::WrongSolutionSize {
				expected: problem.variables(),
				got: z.len(),
			}));
		}
		let jerk_q =
			self.objective
				.orientation_jerks(self.model.matrices(), &self.com.q, self.reference.q)?;
		let plan = Plan::from_solution(&z, n, nf, jerk_q);
		let mut selector = self.selector.clone();
		let transition = selector.advance()?;

		let index = self.cycles;
		self.com = self
			.model
			.propagate(&self.com, [plan.jerk_x[0], plan.jerk_y[0], plan.jerk_q[0]]);
		self.selector = selector;
		self.cycles += 1;
		self.notify(Event::Cycle {
			index,
			com: self.com,
			transition,
		});

		if transition == Transition::Rollover {
			self.support
				.land(plan.footsteps_x[0], plan.footsteps_y[0], self.com.q[0]);
			self.notify(Event::SupportSwitched {
				index,
				support: self.support,
			});
		}
		self.plan = plan;
		Ok(transition)
	}

	fn notify(&mut self, event: Event<T>) {
		if let Some(observer) = self.observer.as_mut() {
			observer.notify(&event);
		}
	}
}
