//! Step definitions for claim settlement BDD scenarios.

pub mod given;
pub mod then;
pub mod when;
pub mod world;
