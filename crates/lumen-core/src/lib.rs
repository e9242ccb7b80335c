//! Lumen Core
//!
//! This crate contains the foundation utilities for the Lumen engine:
//! range-mapping math, geometry primitives, the synchronous event bus, and
//! logging setup.

pub mod bus;
pub mod geometry;
pub mod logging;
pub mod math;
