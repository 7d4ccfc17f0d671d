mod config;
mod constraint;
mod convex;
mod error;
mod generator;
mod linear;
mod objective;
mod observer;
mod prelude;
mod preview;
mod selection;
mod solver;
mod support;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub use config::{FootGeometry, GeneratorConfig, HorizonConfig, HorizonParams, Weights, GRAVITY};
pub use constraint::{ConstraintAssembler, Constraints, FootRegions, LinearConstraints};
pub use convex::{ConvexPolygon, HalfPlaneSystem};
pub use error::{ConfigError, Error, Result, SolverError};
pub use generator::{Plan, Trajectories, WalkingGenerator};
pub use linear::LinearDynamics;
pub use objective::{Objective, TrackingObjective, VelocityReference};
pub use observer::{Event, Observer, TracingObserver};
pub use prelude::*;
pub use preview::{CoMState, Prediction, PredictionMatrices, PreviewModel};
pub use selection::{FootstepSelector, Transition};
#[cfg(feature = "clarabel")]
pub use solver::ClarabelSolver;
pub use solver::{QpProblem, Solver};
pub use support::{Foot, SupportState};

#[cfg(test)]
mod tests {
	#[test]
	fn types_reachable_from_root() {
		let config = crate::GeneratorConfig::default();
		let params = crate::HorizonParams::from(config.horizon);
		assert_eq!(crate::HorizonConfig::try_from(params).unwrap(), config.horizon);
	}
}
