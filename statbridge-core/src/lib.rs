//! Core primitives for statbridge.
//!
//! This crate provides:
//! - A deterministic diff-patch engine over `(kind, text)` edit scripts
//! - The `Tool` trait implemented by every function tool
//! - A registry that validates arguments and normalizes tool failures

pub mod patch;
pub mod tools;

pub use patch::{DiffOp, DiffSummaryLine, OpKind, PatchError, PatchResult};
pub use tools::{DispatchError, Tool, ToolDefinition, ToolRegistry};
