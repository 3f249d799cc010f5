//! Motion-control core for a two-motor five-bar drawing robot.
//!
//! This crate intentionally avoids any transport- or host-specific
//! dependencies.

pub mod linkage;
pub mod robot;
pub mod trajectory;
