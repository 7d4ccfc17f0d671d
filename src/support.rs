use crate::prelude::*;
use serde::{Deserialize, Serialize};

/// Side of a foot.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Foot {
	Left,
	Right,
}

impl Foot {
	pub fn opposite(self) -> Self {
		match self {
			Foot::Left => Foot::Right,
			Foot::Right => Foot::Left,
		}
	}

	/// The side after `steps` alternations.
	pub fn after(self, steps: usize) -> Self {
		if steps % 2 == 0 {
			self
		} else {
			self.opposite()
		}
	}

	/// Orientation sign of the outlines drawn for this side: left outlines are
	/// listed clockwise, right outlines counterclockwise.
	pub fn sign<T: Scalar>(self) -> T {
		match self {
			Foot::Left => T::one(),
			Foot::Right => -T::one(),
		}
	}
}

/// Pose of the stance foot and its derivatives.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct SupportState<T: Scalar> {
	pub x: T,
	pub y: T,
	pub theta: T,

	pub dx: T,
	pub dy: T,
	pub dtheta: T,

	pub ddx: T,
	pub ddy: T,
	pub ddtheta: T,

	pub foot: Foot,
}

impl<T: Scalar> SupportState<T> {
	/// A resting stance at the given pose.
	pub fn new(x: T, y: T, theta: T, foot: Foot) -> Self {
		SupportState {
			x,
			y,
			theta,
			dx: T::zero(),
			dy: T::zero(),
			dtheta: T::zero(),
			ddx: T::zero(),
			ddy: T::zero(),
			ddtheta: T::zero(),
			foot,
		}
	}

	pub fn position(&self) -> Vector<T, 2> {
		Vector::<T, 2>::new(self.x, self.y)
	}

	/// Switches support to the other foot, which lands at the given pose at rest.
	pub fn land(&mut self, x: T, y: T, theta: T) {
		*self = SupportState::new(x, y, theta, self.foot.opposite());
	}
}

impl<T: Scalar> Default for SupportState<T> {
	fn default() -> Self {
		SupportState::new(T::zero(), T::zero(), T::zero(), Foot::Left)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn alternation() {
		assert_eq!(Foot::Left.after(0), Foot::Left);
		assert_eq!(Foot::Left.after(1), Foot::Right);
		assert_eq!(Foot::Right.after(3), Foot::Left);
		assert_eq!(Foot::Right.opposite().opposite(), Foot::Right);
	}

	#[test]
	fn landing_switches_foot_and_clears_motion() {
		let mut support = SupportState::new(0.0, 0.095, 0.0, Foot::Left);
		support.dx = 0.3;
		support.ddy = -1.0;
		support.land(0.2, -0.095, 0.1);
		assert_eq!(support.foot, Foot::Right);
		assert_eq!(support.position(), Vector::<f64, 2>::new(0.2, -0.095));
		assert_eq!(support.theta, 0.1);
		assert_eq!(support.dx, 0.0);
		assert_eq!(support.ddy, 0.0);
	}

	#[test]
	fn foot_names_in_config() {
		#[derive(Deserialize)]
		struct Wrapper {
			foot: Foot,
		}
		let w: Wrapper = toml::from_str("foot = \"right\"").unwrap();
		assert_eq!(w.foot, Foot::Right);
	}
}
