// ABOUTME: Tool module - tool definitions, the registry, and dispatch of
// ABOUTME: model tool calls with error classification.

mod call;
mod def;
mod info;
mod registry;
mod result;
mod traits;

pub use call::*;
pub use def::*;
pub use info::*;
pub use registry::*;
pub use result::*;
pub use traits::*;

#[cfg(test)]
mod registry_test;
#[cfg(test)]
mod result_test;
