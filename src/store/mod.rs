//! Course data access.
//!
//! The core never talks to a database directly: it goes through the
//! [`CourseStore`] trait. [`InMemoryCourseStore`] backs the CLI and tests.

pub mod memory;
pub mod traits;

pub use memory::{CourseSnapshot, InMemoryCourseStore};
pub use traits::{CourseStore, PathUpdate};
