//! Relation services.
//!
//! Each service answers `is_x(a, b)` queries, explains failures as
//! problems, and accepts explicit marks. Results are memoized as
//! non-explicit graph edges; explicit marks are facts. Relations are live:
//! any mark change resets every memoized edge, so later queries see the new
//! state of the world.

pub mod assignability;
pub mod conversion;
pub mod equality;
pub mod subtype;
