use crate::error::ConfigError;
use crate::prelude::*;
use crate::support::Foot;

/// A convex polygon given by its vertices in order.
#[derive(Debug, PartialEq, Clone)]
pub struct ConvexPolygon<T: Scalar> {
	vertices: Vec<Vector<T, 2>>,
}

impl<T: Scalar> ConvexPolygon<T> {
	pub fn new(vertices: Vec<Vector<T, 2>>) -> Result<Self, ConfigError> {
		if vertices.len() < 3 {
			return Err(ConfigError::TooFewVertices(vertices.len()));
		}
		Ok(ConvexPolygon { vertices })
	}

	/// Builds a polygon from configuration points.
	pub fn from_points(points: &[[f64; 2]]) -> Result<Self, ConfigError> {
		if let Some(i) = points.iter().position(|p| !p[0].is_finite() || !p[1].is_finite()) {
			return Err(ConfigError::NonFiniteVertex(i));
		}
		Self::new(
			points
				.iter()
				.map(|&[x, y]| Vector::<T, 2>::new(T::from_subset(&x), T::from_subset(&y)))
				.collect(),
		)
	}

	pub fn vertices(&self) -> &[Vector<T, 2>] {
		&self.vertices
	}

	/// Reflection across the x axis. Reverses the orientation of the vertex order.
	pub fn mirrored(&self) -> Self {
		ConvexPolygon {
			vertices: self.vertices.iter().map(|v| Vector::<T, 2>::new(v.x, -v.y)).collect(),
		}
	}

	/// Mean of the vertices, an interior point of any convex polygon.
	pub fn centroid(&self) -> Vector<T, 2> {
		let sum = self
			.vertices
			.iter()
			.fold(Vector::<T, 2>::zeros(), |acc, v| acc + v);
		sum / T::from_subset(&(self.vertices.len() as f64))
	}
}

/// The inequality system `A p <= B` describing the interior of a convex polygon.
#[derive(Debug, PartialEq, Clone)]
pub struct HalfPlaneSystem<T: Scalar> {
	a: DMatrix<T>,
	b: DVector<T>,
}

impl<T: Scalar> HalfPlaneSystem<T> {
	/// One half-plane per edge `(v_i, v_{i+1})`, normal `(y_i - y_{i+1}, x_{i+1} - x_i)`.
	///
	/// That normal points outward for clockwise polygons; `foot` flips it for
	/// right outlines, which are listed counterclockwise.
	pub fn from_polygon(polygon: &ConvexPolygon<T>, foot: Foot) -> Self {
		let sign = foot.sign::<T>();
		let vertices = polygon.vertices();
		let edges = vertices.len();
		let mut a = DMatrix::zeros(edges, 2);
		let mut b = DVector::zeros(edges);
		for i in 0..edges {
			let v1 = &vertices[i];
			let v2 = &vertices[(i + 1) % edges];
			let dx = v1.y - v2.y;
			let dy = v2.x - v1.x;
			let dc = dx * v1.x + dy * v1.y;
			a[(i, 0)] = sign * dx;
			a[(i, 1)] = sign * dy;
			b[i] = sign * dc;
		}
		HalfPlaneSystem { a, b }
	}

	pub fn a(&self) -> &DMatrix<T> {
		&self.a
	}

	pub fn b(&self) -> &DVector<T> {
		&self.b
	}

	pub fn edges(&self) -> usize {
		self.b.len()
	}

	/// `A p - B`; non-positive entries are satisfied.
	pub fn residual(&self, p: &Vector<T, 2>) -> DVector<T> {
		&self.a * p - &self.b
	}

	pub fn contains(&self, p: &Vector<T, 2>) -> bool {
		self.residual(p).iter().all(|r| *r <= T::zero())
	}

	/// The system of the polygon rotated by `theta` about the origin.
	///
	/// Rotating the region maps `A p <= B` to `A R(theta)^T p <= B`, so only the
	/// normals change.
	pub fn rotated(&self, theta: T) -> Self {
		let (s, c) = theta.sin_cos();
		let a = DMatrix::from_fn(self.edges(), 2, |i, j| {
			let (ax, ay) = (self.a[(i, 0)], self.a[(i, 1)]);
			if j == 0 {
				ax * c - ay * s
			} else {
				ax * s + ay * c
			}
		});
		HalfPlaneSystem {
			a,
			b: self.b.clone(),
		}
	}

	/// The system of the polygon moved by `offset`.
	pub fn translated(&self, offset: &Vector<T, 2>) -> Self {
		HalfPlaneSystem {
			a: self.a.clone(),
			b: &self.b + &self.a * offset,
		}
	}

	/// Moves every edge inward by `margin`.
	pub fn shrunk(&self, margin: T) -> Self {
		let b = DVector::from_fn(self.edges(), |i, _| {
			let norm = (self.a[(i, 0)] * self.a[(i, 0)] + self.a[(i, 1)] * self.a[(i, 1)]).sqrt();
			self.b[i] - margin * norm
		});
		HalfPlaneSystem { a: self.a.clone(), b }
	}
}
