//! Domain models
//!
//! Requests, responses, problem definitions and test cases shared by the judge
//! and the problem store.

pub mod payload;
pub mod problem;
pub mod response;
pub mod test_case;

pub use payload::*;
pub use problem::*;
pub use response::*;
pub use test_case::*;
