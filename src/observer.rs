use crate::prelude::*;
use crate::preview::CoMState;
use crate::selection::Transition;
use crate::support::SupportState;

/// Something that happened while running control cycles.
#[derive(Debug, PartialEq, Clone)]
pub enum Event<T: Scalar> {
	/// A cycle finished with the CoM state it propagated to.
	Cycle {
		index: usize,
		com: CoMState<T>,
		transition: Transition,
	},
	/// The first planned footstep landed and became the stance.
	SupportSwitched { index: usize, support: SupportState<T> },
}

/// Receives the events of a [`WalkingGenerator`](crate::WalkingGenerator).
pub trait Observer<T: Scalar> {
	fn notify(&mut self, event: &Event<T>);
}

impl<T: Scalar, F> Observer<T> for F
where
	F: FnMut(&Event<T>),
{
	fn notify(&mut self, event: &Event<T>) {
		self(event)
	}
}

/// Forwards events to `tracing`: cycles at debug level, support switches at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl<T: Scalar> Observer<T> for TracingObserver {
	fn notify(&mut self, event: &Event<T>) {
		match event {
			Event::Cycle {
				index,
				com,
				transition,
			} => tracing::debug!(
				cycle = index,
				x = %com.x[0],
				y = %com.y[0],
				q = %com.q[0],
				?transition,
				"control cycle"
			),
			Event::SupportSwitched { index, support } => tracing::info!(
				cycle = index,
				foot = ?support.foot,
				x = %support.x,
				y = %support.y,
				theta = %support.theta,
				"support switched"
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::support::Foot;

	#[test]
	fn closures_observe_events() {
		let mut seen = Vec::new();
		{
			let mut observer = |event: &Event<f64>| seen.push(event.clone());
			observer.notify(&Event::SupportSwitched {
				index: 3,
				support: SupportState::new(0.1, -0.1, 0.0, Foot::Right),
			});
		}
		assert_eq!(seen.len(), 1);
		assert!(matches!(seen[0], Event::SupportSwitched { index: 3, .. }));
	}

	#[test]
	fn tracing_observer_accepts_every_event() {
		let mut observer = TracingObserver;
		Observer::<f64>::notify(
			&mut observer,
			&Event::Cycle {
				index: 0,
				com: CoMState::default(),
				transition: Transition::Shifted,
			},
		);
	}
}
