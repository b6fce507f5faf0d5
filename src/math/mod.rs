//! Mathematical utilities: least squares, non-negative least squares, quadrature.

pub mod nnls;
pub mod ols;
pub mod quadrature;

pub use nnls::*;
pub use ols::*;
pub use quadrature::*;
