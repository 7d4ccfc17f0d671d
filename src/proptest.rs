use std::ops::RangeInclusive;

use crate::{prelude::*, ConvexPolygon, Foot, HorizonConfig, SupportState};
use nalgebra::Const;
use proptest::{collection, prop_oneof, strategy::Just, strategy::Strategy};

fn scalar() -> RangeInclusive<f64> {
	-2.0..=2.0
}

fn matrix<const N: usize, const M: usize>() -> impl Strategy<Value = Matrix<f64, N, M>> {
	nalgebra::proptest::matrix(scalar(), Const::<N>, Const::<M>)
}

pub fn vector<const N: usize>() -> impl Strategy<Value = Vector<f64, N>> {
	matrix::<N, 1>()
}

pub fn jerks(n: usize) -> impl Strategy<Value = DVector<f64>> {
	collection::vec(scalar(), n).prop_map(DVector::from_vec)
}

/// Horizons of at most 24 samples, with steps that may end between samples.
pub fn horizon_config() -> impl Strategy<Value = HorizonConfig> {
	(
		4usize..=24,
		0.05f64..0.2,
		1usize..=10,
		prop_oneof![Just(0.0), 0.0f64..0.9],
		0.5f64..1.0,
	)
		.prop_map(|(n, t, samples, fraction, h_com)| {
			HorizonConfig::new(n, t, t * (samples as f64 + fraction), h_com).expect("valid horizon")
		})
}

fn foot() -> impl Strategy<Value = Foot> {
	prop_oneof![Just(Foot::Left), Just(Foot::Right)]
}

pub fn support_state() -> impl Strategy<Value = SupportState<f64>> {
	(scalar(), scalar(), -3.0f64..3.0, foot())
		.prop_map(|(x, y, theta, foot)| SupportState::new(x, y, theta, foot))
}

/// Polygons inscribed in a circle, vertices listed clockwise.
pub fn clockwise_polygon() -> impl Strategy<Value = ConvexPolygon<f64>> {
	(3usize..=8)
		.prop_flat_map(|edges| {
			(
				vector::<2>(),
				0.1f64..1.0,
				collection::vec(0.0f64..0.8, edges),
			)
		})
		.prop_map(|(center, radius, jitter)| {
			let edges = jitter.len() as f64;
			let vertices = jitter
				.iter()
				.enumerate()
				.rev()
				.map(|(i, j)| {
					let angle = std::f64::consts::TAU * (i as f64 + j) / edges;
					center + Vector::<f64, 2>::new(angle.cos(), angle.sin()) * radius
				})
				.collect();
			ConvexPolygon::new(vertices).expect("at least three vertices")
		})
}
