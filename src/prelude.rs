use nalgebra::{Const, OMatrix};

pub type Matrix<T, const N: usize, const M: usize> = OMatrix<T, Const<N>, Const<M>>;
pub type Vector<T, const N: usize> = Matrix<T, N, 1>;

pub use nalgebra::{DMatrix, DVector};

/// Real scalar every model in this crate is generic over.
pub trait Scalar: nalgebra::RealField + Copy {}
impl<T> Scalar for T where T: nalgebra::RealField + Copy {}
