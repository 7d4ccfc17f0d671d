use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::support::Foot;

/// Standard gravity used by the inverted pendulum relation.
pub const GRAVITY: f64 = 9.81;

// Absorbs rounding in `N * T / T_step` so an exact ratio does not round up.
const RATIO_EPSILON: f64 = 1e-9;
// Absorbs rounding in `T_step / T` so an exact ratio does not floor down.
const STEP_TOLERANCE: f64 = 1e-6;

/// Discretization of the preview horizon.
///
/// Constructed through [`HorizonConfig::new`] (or deserialization, which goes
/// through the same checks), so every instance satisfies `N, T, T_step, h_com > 0`,
/// `T_step >= T` and `nf >= 1`. A step lasts `floor(T_step / T)` samples.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "HorizonParams", into = "HorizonParams")]
pub struct HorizonConfig {
	n: usize,
	t: f64,
	t_step: f64,
	h_com: f64,
	nf: usize,
	nstep: usize,
}

/// Horizon parameters as written in configuration files, before validation.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HorizonParams {
	pub n: usize,
	pub t: f64,
	pub t_step: f64,
	pub h_com: f64,
}

fn positive(field: &'static str, value: f64) -> Result<f64, ConfigError> {
	if value.is_finite() && value > 0.0 {
		Ok(value)
	} else {
		Err(ConfigError::NonPositive { field, value })
	}
}

impl HorizonConfig {
	pub fn new(n: usize, t: f64, t_step: f64, h_com: f64) -> Result<Self, ConfigError> {
		if n == 0 {
			return Err(ConfigError::EmptyHorizon);
		}
		let t = positive("t", t)?;
		let t_step = positive("t_step", t_step)?;
		let h_com = positive("h_com", h_com)?;
		let nstep = (t_step / t + STEP_TOLERANCE).floor() as usize;
		if nstep == 0 {
			return Err(ConfigError::StepShorterThanSample { t_step, t });
		}
		let ratio = n as f64 * t / t_step;
		let nf = (ratio - RATIO_EPSILON).ceil().max(1.0) as usize;

		Ok(HorizonConfig {
			n,
			t,
			t_step,
			h_com,
			nf,
			nstep,
		})
	}

	/// Number of samples in the horizon.
	pub fn n(&self) -> usize {
		self.n
	}

	/// Sample period.
	pub fn t(&self) -> f64 {
		self.t
	}

	/// Duration of one single-support phase.
	pub fn t_step(&self) -> f64 {
		self.t_step
	}

	pub fn h_com(&self) -> f64 {
		self.h_com
	}

	/// Number of footsteps planned inside the horizon, `ceil(N T / T_step)`.
	pub fn nf(&self) -> usize {
		self.nf
	}

	/// Samples spent on one footstep.
	pub fn nstep(&self) -> usize {
		self.nstep
	}

	/// Duration covered by the horizon.
	pub fn window(&self) -> f64 {
		self.n as f64 * self.t
	}
}

impl Default for HorizonConfig {
	fn default() -> Self {
		HorizonConfig {
			n: 16,
			t: 0.1,
			t_step: 0.8,
			h_com: 0.81,
			nf: 2,
			nstep: 8,
		}
	}
}

impl TryFrom<HorizonParams> for HorizonConfig {
	type Error = ConfigError;

	fn try_from(p: HorizonParams) -> Result<Self, Self::Error> {
		HorizonConfig::new(p.n, p.t, p.t_step, p.h_com)
	}
}

impl From<HorizonConfig> for HorizonParams {
	fn from(c: HorizonConfig) -> Self {
		HorizonParams {
			n: c.n,
			t: c.t,
			t_step: c.t_step,
			h_com: c.h_com,
		}
	}
}

/// Weights of the tracking objective.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
	/// CoM velocity tracking.
	pub velocity: f64,
	/// ZMP centering over the support feet.
	pub zmp: f64,
	/// Jerk minimization. Must be positive.
	pub jerk: f64,
}

impl Default for Weights {
	fn default() -> Self {
		Weights {
			velocity: 1.0,
			zmp: 1e-3,
			jerk: 1e-5,
		}
	}
}

/// Outlines of the soles and of the reachable footstep regions, in the frame of the foot they belong to.
///
/// `left_reach` is where the swing foot may land relative to a left stance foot
/// and `right_reach` the same for a right stance foot. Left outlines list their
/// vertices clockwise, right outlines counterclockwise.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FootGeometry {
	pub left_sole: Vec<[f64; 2]>,
	pub right_sole: Vec<[f64; 2]>,
	pub left_reach: Vec<[f64; 2]>,
	pub right_reach: Vec<[f64; 2]>,
	/// Distance by which the sole outlines are shrunk before constraining the ZMP.
	pub security_margin: f64,
}

impl FootGeometry {
	pub fn sole(&self, foot: Foot) -> &[[f64; 2]] {
		match foot {
			Foot::Left => &self.left_sole,
			Foot::Right => &self.right_sole,
		}
	}

	pub fn reach(&self, foot: Foot) -> &[[f64; 2]] {
		match foot {
			Foot::Left => &self.left_reach,
			Foot::Right => &self.right_reach,
		}
	}
}

fn mirror(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
	points.iter().map(|&[x, y]| [x, -y]).collect()
}

impl Default for FootGeometry {
	fn default() -> Self {
		let left_sole = vec![
			[0.0686, 0.029],
			[0.0686, -0.029],
			[-0.0686, -0.029],
			[-0.0686, 0.029],
		];
		let left_reach = vec![
			[0.28, -0.1],
			[0.2, -0.2],
			[0.0, -0.3],
			[-0.2, -0.2],
			[-0.28, -0.1],
		];
		FootGeometry {
			right_sole: mirror(&left_sole),
			right_reach: mirror(&left_reach),
			left_sole,
			left_reach,
			security_margin: 0.0,
		}
	}
}

/// Everything needed to build a [`WalkingGenerator`](crate::WalkingGenerator).
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
	pub horizon: HorizonConfig,
	pub weights: Weights,
	pub geometry: FootGeometry,
}

impl GeneratorConfig {
	pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
		let config: GeneratorConfig = toml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}

	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let s = std::fs::read_to_string(path)?;
		Self::from_toml_str(&s)
	}

	/// Checks what the types cannot. Polygons are checked when their half-plane systems are built.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let margin = self.geometry.security_margin;
		if !margin.is_finite() || margin < 0.0 {
			return Err(ConfigError::InvalidMargin(margin));
		}
		for (field, value) in [
			("weights.velocity", self.weights.velocity),
			("weights.zmp", self.weights.zmp),
		] {
			if !value.is_finite() || value < 0.0 {
				return Err(ConfigError::NonPositive { field, value });
			}
		}
		positive("weights.jerk", self.weights.jerk)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_horizon_plans_two_steps() {
		let c = HorizonConfig::new(16, 0.1, 0.8, 0.81).unwrap();
		assert_eq!(c.nf(), 2);
		assert_eq!(c.nstep(), 8);
		assert_eq!(c, HorizonConfig::default());
	}

	#[test]
	fn partial_steps_round_up() {
		let c = HorizonConfig::new(16, 0.1, 0.7, 0.81).unwrap();
		assert_eq!(c.nstep(), 7);
		assert_eq!(c.nf(), 3);

		let c = HorizonConfig::new(4, 0.1, 0.8, 0.81).unwrap();
		assert_eq!(c.nf(), 1);
	}

	#[test]
	fn steps_between_samples_floor() {
		let c = HorizonConfig::new(16, 0.1, 0.75, 0.81).unwrap();
		assert_eq!(c.nstep(), 7);
		assert_eq!(c.nf(), 3);

		// 0.3 / 0.1 is slightly below 3 in floating point.
		let c = HorizonConfig::new(16, 0.1, 0.3, 0.81).unwrap();
		assert_eq!(c.nstep(), 3);

		let c = HorizonConfig::new(16, 0.1, 0.19, 0.81).unwrap();
		assert_eq!(c.nstep(), 1);
		assert_eq!(c.nf(), 9);
	}

	#[test]
	fn invalid_horizons() {
		assert!(matches!(
			HorizonConfig::new(0, 0.1, 0.8, 0.81),
			Err(ConfigError::EmptyHorizon)
		));
		assert!(matches!(
			HorizonConfig::new(16, -0.1, 0.8, 0.81),
			Err(ConfigError::NonPositive { field: "t", .. })
		));
		assert!(matches!(
			HorizonConfig::new(16, 0.1, 0.8, f64::NAN),
			Err(ConfigError::NonPositive { field: "h_com", .. })
		));
		assert!(matches!(
			HorizonConfig::new(16, 0.1, 0.05, 0.81),
			Err(ConfigError::StepShorterThanSample { .. })
		));
	}

	#[test]
	fn parse_toml() {
		let config = GeneratorConfig::from_toml_str(
			r#"
			[horizon]
			n = 20
			t = 0.1
			t_step = 0.7
			h_com = 0.8

			[weights]
			zmp = 0.5

			[geometry]
			security_margin = 0.01
			"#,
		)
		.unwrap();
		assert_eq!(config.horizon.n(), 20);
		assert_eq!(config.horizon.nf(), 3);
		assert_eq!(config.weights.zmp, 0.5);
		assert_eq!(config.weights.velocity, Weights::default().velocity);
		assert_eq!(config.geometry.security_margin, 0.01);
		assert_eq!(config.geometry.left_sole, FootGeometry::default().left_sole);
	}

	#[test]
	fn reject_invalid_toml_values() {
		let err = GeneratorConfig::from_toml_str(
			r#"
			[horizon]
			n = 16
			t = 0.1
			t_step = 0.8
			h_com = -1.0
			"#,
		)
		.unwrap_err();
		assert!(matches!(err, ConfigError::Toml(_)));

		let err = GeneratorConfig::from_toml_str("[weights]\njerk = 0.0\n").unwrap_err();
		assert!(matches!(
			err,
			ConfigError::NonPositive {
				field: "weights.jerk",
				..
			}
		));

		let err = GeneratorConfig::from_toml_str("[geometry]\nsecurity_margin = -0.1\n").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidMargin(_)));
	}

	#[test]
	fn right_outlines_mirror_left() {
		let g = FootGeometry::default();
		assert_eq!(g.right_reach, mirror(&g.left_reach));
		assert_eq!(g.sole(Foot::Right)[0], [0.0686, -0.029]);
		assert_eq!(g.reach(Foot::Right)[2], [0.0, 0.3]);
	}
}
