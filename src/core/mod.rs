//! Core query layer
//!
//! # Architecture
//!
//! - `location`: the `path[#unsaved]:flags:line:col` boundary and `LocationQuery`
//! - `resolver`: parse plus start-cursor lookup
//! - `search`: upward search over semantic parents and the breadcrumb chain
//! - `stringize`: record fragments for cursors, types and locations
//! - `dispatch`: `QueryEngine` and the named queries
//! - `error`: error types using thiserror

pub mod dispatch;
pub mod error;
pub mod location;
pub mod resolver;
pub mod search;
pub mod stringize;

// Re-export commonly used types
pub use dispatch::{DispatchState, Jump, Query, QueryEngine, TypeTransform};
pub use error::{QueryError, Result};
pub use location::{LocationQuery, LocationSpec};
pub use resolver::{resolve, Resolved};
pub use search::{ancestor_chain, search_upward, Predicate};
