//! Osteon - A 2D skeletal animation engine

pub mod core;
pub mod math;
pub mod animation;
pub mod actor;
