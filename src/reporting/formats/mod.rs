//! Report output formats

pub mod text;
