//! Assignment of horizon samples to footsteps.
//!
//! Every sample of the horizon belongs to the current stance foot, to one of the
//! `nf` planned footsteps, or to nothing. The classic representation is the
//! indicator vector `v` (current stance) and the selection matrix `V` (planned
//! footsteps, one column each); both are derived here from a ring buffer of
//! per-sample owners, so a sample can never be claimed twice.

use crate::config::HorizonConfig;
use crate::error::{Error, Result};
use crate::prelude::*;

/// What happened to the selection state during [`FootstepSelector::advance`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Transition {
	/// The horizon moved by one sample, the stance foot is unchanged.
	Shifted,
	/// The stance phase ran out and the first planned footstep became the stance.
	Rollover,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FootstepSelector {
	nf: usize,
	nstep: usize,
	// 0 is the current stance, k in 1..=nf the k-th planned footstep.
	owners: Vec<Option<usize>>,
	head: usize,
	counts: Vec<usize>,
}

impl FootstepSelector {
	pub fn new(config: &HorizonConfig) -> Self {
		let mut selector = FootstepSelector {
			nf: config.nf(),
			nstep: config.nstep(),
			owners: vec![None; config.n()],
			head: 0,
			counts: vec![0; config.nf() + 1],
		};
		selector.reset();
		selector
	}

	/// Restores the single-support pattern: `nstep` samples of stance followed
	/// by `nstep` samples for each planned footstep.
	pub fn reset(&mut self) {
		self.head = 0;
		self.counts.iter_mut().for_each(|c| *c = 0);
		for (i, owner) in self.owners.iter_mut().enumerate() {
			let k = i / self.nstep;
			*owner = (k <= self.nf).then_some(k);
			if let Some(k) = owner {
				self.counts[*k] += 1;
			}
		}
	}

	pub fn n(&self) -> usize {
		self.owners.len()
	}

	pub fn nf(&self) -> usize {
		self.nf
	}

	/// Owner of horizon sample `i`: `Some(0)` for the stance, `Some(k)` for the k-th planned footstep.
	pub fn owner(&self, i: usize) -> Option<usize> {
		self.owners[(self.head + i) % self.n()]
	}

	pub fn is_stance(&self, i: usize) -> bool {
		self.owner(i) == Some(0)
	}

	pub fn stance_samples(&self) -> usize {
		self.counts[0]
	}

	/// Samples assigned to the k-th planned footstep (1-based).
	pub fn step_samples(&self, k: usize) -> usize {
		self.counts[k]
	}

	/// The stance indicator `v`.
	pub fn indicator<T: Scalar>(&self) -> DVector<T> {
		DVector::from_fn(self.n(), |i, _| {
			if self.is_stance(i) {
				T::one()
			} else {
				T::zero()
			}
		})
	}

	/// The selection matrix `V`, one column per planned footstep.
	pub fn selection<T: Scalar>(&self) -> DMatrix<T> {
		DMatrix::from_fn(self.n(), self.nf, |i, j| {
			if self.owner(i) == Some(j + 1) {
				T::one()
			} else {
				T::zero()
			}
		})
	}

	/// Moves the horizon forward by one sample.
	///
	/// The dropped sample is recycled as the new tail and handed to the first
	/// planned footstep that has fewer than `nstep` samples. Once no sample is
	/// left for the stance, every owner moves one footstep forward and the
	/// unassigned tail samples go to the emptied last footstep. A rollover that
	/// would leave the stance empty fails without changing the selector.
	pub fn advance(&mut self) -> Result<Transition> {
		let n = self.n();
		let dropped = self.owners[self.head];
		let remaining = |k: usize| self.counts[k] - usize::from(dropped == Some(k));
		let tail = (1..=self.nf).find(|&k| remaining(k) < self.nstep);
		let rollover = remaining(0) == 0;
		if rollover && remaining(1) + usize::from(tail == Some(1)) == 0 {
			return Err(Error::Degenerate("no sample left for the stance after rollover"));
		}

		if let Some(k) = dropped {
			self.counts[k] -= 1;
		}
		self.owners[self.head] = tail;
		if let Some(k) = tail {
			self.counts[k] += 1;
		}
		self.head = (self.head + 1) % n;
		if !rollover {
			return Ok(Transition::Shifted);
		}

		for k in self.owners.iter_mut().flatten() {
			*k -= 1;
		}
		self.counts.rotate_left(1);
		for i in 0..n {
			if self.counts[self.nf] == self.nstep {
				break;
			}
			let slot = &mut self.owners[(self.head + i) % n];
			if slot.is_none() {
				*slot = Some(self.nf);
				self.counts[self.nf] += 1;
			}
		}
		Ok(Transition::Rollover)
	}

	/// Checks the bookkeeping against the owners buffer.
	pub fn check(&self) -> Result<()> {
		let mut counts = vec![0; self.nf + 1];
		for owner in self.owners.iter().flatten() {
			match counts.get_mut(*owner) {
				Some(c) => *c += 1,
				None => return Err(Error::Degenerate("sample owned by an unknown footstep")),
			}
		}
		if counts != self.counts {
			return Err(Error::Degenerate("sample counts out of sync"));
		}
		if self.counts[0] == 0 {
			return Err(Error::Degenerate("no sample left for the stance"));
		}
		if self.counts[1..].iter().any(|&c| c > self.nstep) {
			return Err(Error::Degenerate("planned footstep longer than a step"));
		}
		// The stance is a prefix of the horizon and footsteps follow in order.
		let mut last = 0;
		for i in 0..self.n() {
			match self.owner(i) {
				Some(k) if k >= last => last = k,
				Some(_) => return Err(Error::Degenerate("footsteps out of order")),
				None => last = usize::MAX,
			}
		}
		Ok(())
	}
}
