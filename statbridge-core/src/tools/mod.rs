//! Function tools: the [`Tool`] trait and the [`ToolRegistry`] that
//! validates and dispatches calls to them.

pub mod error;
pub mod registry;
pub mod schema;
pub mod traits;

pub use error::DispatchError;
pub use registry::{ToolDefinition, ToolRegistry};
pub use schema::{ArgumentValidator, ArgumentViolation};
pub use traits::Tool;
