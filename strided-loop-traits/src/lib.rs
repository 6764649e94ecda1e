//! Element type registry shared by the strided-loop crates.
//!
//! This crate holds the closed set of scalar kinds the loop engine can
//! describe ([`ElementType`]) and the [`Element`] trait that ties each kind to
//! its Rust scalar type. It has no knowledge of shapes or cursors, so
//! downstream crates can implement typed kernels against it without pulling
//! in the iteration engine.

pub mod element;
pub mod element_type;

pub use element::Element;
pub use element_type::{byte_size, promote, ElementType};
