//! Encoder implementations

pub mod quadrature;

pub use quadrature::QuadratureEncoder;
