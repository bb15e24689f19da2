//! Tool generation, registration, and execution

mod executor;
mod generator;
mod registry;

pub use executor::ToolExecutor;
pub use generator::{tool_name, ArgumentBinding, ArgumentTarget, GeneratedTool, ToolGenerator, WHOLE_BODY_ARGUMENT};
pub use registry::{RegisteredTool, ToolRegistry};
