use thiserror::Error;

/// Top-level error type of the pattern generator.
#[derive(Debug, Error)]
pub enum Error {
	#[error("configuration error: {0}")]
	Config(#[from] ConfigError),

	/// Shapes passed across a component boundary disagree. Always a programming error.
	#[error("dimension mismatch in {context}: expected {expected}, got {got}")]
	DimensionMismatch {
		context: &'static str,
		expected: usize,
		got: usize,
	},

	/// The selection state or a model quantity reached a configuration that must never occur.
	#[error("degenerate state: {0}")]
	Degenerate(&'static str),

	#[error("solver error: {0}")]
	Solver(#[from] SolverError),
}

/// Errors detected while building a generator from its configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("invalid value for {field}: {value} (must be finite and > 0)")]
	NonPositive { field: &'static str, value: f64 },

	#[error("horizon must contain at least one sample")]
	EmptyHorizon,

	#[error("step duration {t_step} is shorter than the sample period {t}")]
	StepShorterThanSample { t_step: f64, t: f64 },

	#[error("polygon has {0} vertices, at least 3 are required")]
	TooFewVertices(usize),

	#[error("polygon vertex {0} is not finite")]
	NonFiniteVertex(usize),

	#[error("invalid security margin: {0} (must be finite and >= 0)")]
	InvalidMargin(f64),
}

/// Failures reported by a QP backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
	#[error("problem setup rejected: {0}")]
	Setup(String),

	#[error("solver did not converge: {0}")]
	NotConverged(String),

	#[error("solution has {got} entries, expected {expected}")]
	WrongSolutionSize { expected: usize, got: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
