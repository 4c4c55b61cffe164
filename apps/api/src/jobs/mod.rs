//! Public, candidate-facing listing surface.

pub mod handlers;
