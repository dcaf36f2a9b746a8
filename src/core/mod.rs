//! Core logic: types, parsing, resolution, dispatch, planning, execution.

pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod parser;
pub mod planner;
pub mod resolver;
pub mod state;
pub mod types;
