//! Data models for the ToolHub catalog.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod category;
mod role;
mod tool;

pub use category::*;
pub use role::*;
pub use tool::*;
