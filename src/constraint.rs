//! Linear constraints on the decision vector `[jerk_x, F_x, jerk_y, F_y]`.
//!
//! `jerk_*` are the N jerks of the horizon and `F_*` the coordinates of the nf
//! planned footsteps. The current stance is not a decision variable: it enters
//! every system through the explicit [`SupportState`] argument.

use crate::config::FootGeometry;
use crate::convex::{ConvexPolygon, HalfPlaneSystem};
use crate::error::ConfigError;
use crate::prelude::*;
use crate::preview::PredictionMatrices;
use crate::selection::FootstepSelector;
use crate::support::{Foot, SupportState};

/// Rows `A z <= b` or `A z = b`, depending on where they are used.
#[derive(Debug, PartialEq, Clone)]
pub struct LinearConstraints<T: Scalar> {
	pub a: DMatrix<T>,
	pub b: DVector<T>,
}

impl<T: Scalar> LinearConstraints<T> {
	pub fn empty(columns: usize) -> Self {
		LinearConstraints {
			a: DMatrix::zeros(0, columns),
			b: DVector::zeros(0),
		}
	}

	pub fn rows(&self) -> usize {
		self.b.len()
	}

	pub fn columns(&self) -> usize {
		self.a.ncols()
	}

	/// Rows of `self` followed by the rows of `other`.
	pub fn stack(&self, other: &Self) -> Self {
		assert_eq!(self.columns(), other.columns());
		let (r1, r2) = (self.rows(), other.rows());
		let mut a = DMatrix::zeros(r1 + r2, self.columns());
		a.rows_mut(0, r1).copy_from(&self.a);
		a.rows_mut(r1, r2).copy_from(&other.a);
		let mut b = DVector::zeros(r1 + r2);
		b.rows_mut(0, r1).copy_from(&self.b);
		b.rows_mut(r1, r2).copy_from(&other.b);
		LinearConstraints { a, b }
	}

	/// `A z - b`.
	pub fn residual(&self, z: &DVector<T>) -> DVector<T> {
		&self.a * z - &self.b
	}
}

/// All constraints of one control cycle.
#[derive(Debug, PartialEq, Clone)]
pub struct Constraints<T: Scalar> {
	pub foot: LinearConstraints<T>,
	pub cop: LinearConstraints<T>,
	pub equality: LinearConstraints<T>,
}

impl<T: Scalar> Constraints<T> {
	/// Foot placement rows followed by CoP rows.
	pub fn inequality(&self) -> LinearConstraints<T> {
		self.foot.stack(&self.cop)
	}
}

/// Half-plane systems of the soles and reachable regions, built once.
#[derive(Debug, PartialEq, Clone)]
pub struct FootRegions<T: Scalar> {
	left_sole: HalfPlaneSystem<T>,
	right_sole: HalfPlaneSystem<T>,
	left_reach: HalfPlaneSystem<T>,
	right_reach: HalfPlaneSystem<T>,
	left_reach_centroid: Vector<T, 2>,
	right_reach_centroid: Vector<T, 2>,
}

impl<T: Scalar> FootRegions<T> {
	pub fn new(geometry: &FootGeometry) -> Result<Self, ConfigError> {
		let margin = T::from_subset(&geometry.security_margin);
		let sole = |foot| -> Result<_, ConfigError> {
			let polygon = ConvexPolygon::<T>::from_points(geometry.sole(foot))?;
			Ok(HalfPlaneSystem::from_polygon(&polygon, foot).shrunk(margin))
		};
		let reach = |foot| ConvexPolygon::<T>::from_points(geometry.reach(foot));
		let (left_reach, right_reach) = (reach(Foot::Left)?, reach(Foot::Right)?);
		Ok(FootRegions {
			left_sole: sole(Foot::Left)?,
			right_sole: sole(Foot::Right)?,
			left_reach: HalfPlaneSystem::from_polygon(&left_reach, Foot::Left),
			right_reach: HalfPlaneSystem::from_polygon(&right_reach, Foot::Right),
			left_reach_centroid: left_reach.centroid(),
			right_reach_centroid: right_reach.centroid(),
		})
	}

	pub fn sole(&self, foot: Foot) -> &HalfPlaneSystem<T> {
		match foot {
			Foot::Left => &self.left_sole,
			Foot::Right => &self.right_sole,
		}
	}

	/// Where the swing foot may land relative to a stance foot of side `foot`.
	pub fn reach(&self, foot: Foot) -> &HalfPlaneSystem<T> {
		match foot {
			Foot::Left => &self.left_reach,
			Foot::Right => &self.right_reach,
		}
	}

	pub fn reach_centroid(&self, foot: Foot) -> &Vector<T, 2> {
		match foot {
			Foot::Left => &self.left_reach_centroid,
			Foot::Right => &self.right_reach_centroid,
		}
	}
}

/// Builds the constraint systems of a cycle from the support state.
#[derive(Debug, PartialEq, Clone)]
pub struct ConstraintAssembler<T: Scalar> {
	n: usize,
	nf: usize,
	regions: FootRegions<T>,
}

impl<T: Scalar> ConstraintAssembler<T> {
	pub fn new(n: usize, nf: usize, regions: FootRegions<T>) -> Self {
		ConstraintAssembler { n, nf, regions }
	}

	pub fn regions(&self) -> &FootRegions<T> {
		&self.regions
	}

	/// Length of the decision vector.
	pub fn columns(&self) -> usize {
		2 * (self.n + self.nf)
	}

	/// Column of the x coordinate of planned footstep `k` (0-based).
	pub fn footstep_x(&self, k: usize) -> usize {
		self.n + k
	}

	/// Column of the y coordinate of planned footstep `k` (0-based).
	pub fn footstep_y(&self, k: usize) -> usize {
		2 * self.n + self.nf + k
	}

	/// Keeps each planned footstep inside the region reachable from the one before it.
	///
	/// Footstep `k` moves the foot opposite to the stance of footstep `k - 1`, so
	/// its rows use the reachable region of that stance side, rotated by the
	/// current heading. The first footstep is measured from the current stance.
	pub fn foot_placement(&self, support: &SupportState<T>) -> LinearConstraints<T> {
		let rows = (0..self.nf)
			.map(|k| self.regions.reach(support.foot.after(k)).edges())
			.sum();
		let mut a = DMatrix::zeros(rows, self.columns());
		let mut b = DVector::zeros(rows);

		let mut row = 0;
		for k in 0..self.nf {
			let region = self.regions.reach(support.foot.after(k)).rotated(support.theta);
			let region = if k == 0 {
				region.translated(&support.position())
			} else {
				region
			};
			for e in 0..region.edges() {
				let (ax, ay) = (region.a()[(e, 0)], region.a()[(e, 1)]);
				a[(row, self.footstep_x(k))] = ax;
				a[(row, self.footstep_y(k))] = ay;
				if k > 0 {
					a[(row, self.footstep_x(k - 1))] = -ax;
					a[(row, self.footstep_y(k - 1))] = -ay;
				}
				b[row] = region.b()[e];
				row += 1;
			}
		}
		LinearConstraints { a, b }
	}

	/// Keeps the predicted ZMP inside the sole of whichever foot supports each sample.
	///
	/// Stance samples use the current support pose; samples of planned footstep
	/// `k` are measured from the decision variables `F_k`. Soles are rotated by
	/// the current heading. Samples without a footstep get no rows.
	pub fn cop(
		&self,
		support: &SupportState<T>,
		selector: &FootstepSelector,
		matrices: &PredictionMatrices<T>,
		com_x: &Vector<T, 3>,
		com_y: &Vector<T, 3>,
	) -> LinearConstraints<T> {
		assert_eq!(selector.n(), self.n);
		assert_eq!(selector.nf(), self.nf);
		let zmp_x = &matrices.pzs * com_x;
		let zmp_y = &matrices.pzs * com_y;
		let jerk_y = self.n + self.nf;

		let sole = |owner: usize| self.regions.sole(support.foot.after(owner)).rotated(support.theta);
		let rows = (0..self.n)
			.filter_map(|i| selector.owner(i))
			.map(|owner| self.regions.sole(support.foot.after(owner)).edges())
			.sum();
		let mut a = DMatrix::zeros(rows, self.columns());
		let mut b = DVector::zeros(rows);

		let mut row = 0;
		for i in 0..self.n {
			let owner = match selector.owner(i) {
				Some(owner) => owner,
				None => continue,
			};
			let region = if owner == 0 {
				sole(owner).translated(&support.position())
			} else {
				sole(owner)
			};
			for e in 0..region.edges() {
				let (sx, sy) = (region.a()[(e, 0)], region.a()[(e, 1)]);
				for j in 0..=i {
					a[(row, j)] = sx * matrices.pzu[(i, j)];
					a[(row, jerk_y + j)] = sy * matrices.pzu[(i, j)];
				}
				if owner > 0 {
					a[(row, self.footstep_x(owner - 1))] = -sx;
					a[(row, self.footstep_y(owner - 1))] = -sy;
				}
				b[row] = region.b()[e] - sx * zmp_x[i] - sy * zmp_y[i];
				row += 1;
			}
		}
		LinearConstraints { a, b }
	}

	/// Pins every planned footstep that has no sample in the horizon to the
	/// center of the region reachable from the footstep before it.
	///
	/// Such footsteps appear neither in the ZMP rows nor in the objective.
	pub fn pins(&self, support: &SupportState<T>, selector: &FootstepSelector) -> LinearConstraints<T> {
		let (s, c) = support.theta.sin_cos();
		let empty: Vec<usize> = (0..self.nf)
			.filter(|&k| selector.step_samples(k + 1) == 0)
			.collect();
		let mut a = DMatrix::zeros(2 * empty.len(), self.columns());
		let mut b = DVector::zeros(2 * empty.len());
		for (r, &k) in empty.iter().enumerate() {
			let center = self.regions.reach_centroid(support.foot.after(k));
			let offset = Vector::<T, 2>::new(center.x * c - center.y * s, center.x * s + center.y * c);
			let (rx, ry) = (2 * r, 2 * r + 1);
			a[(rx, self.footstep_x(k))] = T::one();
			a[(ry, self.footstep_y(k))] = T::one();
			if k == 0 {
				b[rx] = support.x + offset.x;
				b[ry] = support.y + offset.y;
			} else {
				a[(rx, self.footstep_x(k - 1))] = -T::one();
				a[(ry, self.footstep_y(k - 1))] = -T::one();
				b[rx] = offset.x;
				b[ry] = offset.y;
			}
		}
		LinearConstraints { a, b }
	}

	pub fn assemble(
		&self,
		support: &SupportState<T>,
		selector: &FootstepSelector,
		matrices: &PredictionMatrices<T>,
		com_x: &Vector<T, 3>,
		com_y: &Vector<T, 3>,
	) -> Constraints<T> {
		Constraints {
			foot: self.foot_placement(support),
			cop: self.cop(support, selector, matrices, com_x, com_y),
			equality: self.pins(support, selector),
		}
	}
}
