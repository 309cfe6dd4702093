//! Collaborator traits
//!
//! The dispatcher does not know how calls are executed or how debug pages
//! look. It reaches both through these traits; [`MethodRegistry`] is the
//! bundled implementation of each.
//!
//! [`MethodRegistry`]: crate::registry::MethodRegistry

use dwr_common::{Calls, Replies, Result};

/// Executes a parsed batch.
pub trait Remoter: Send + Sync {
    /// Call-level failures are returned inside the replies; an `Err` means
    /// the batch as a whole could not be executed.
    fn execute(&self, calls: Calls) -> Result<Replies>;
}

/// Produces the debug pages and interface stubs.
///
/// `root` is the mount path of the bridge, e.g. `/dwr`.
pub trait DebugPageGenerator: Send + Sync {
    fn index_page(&self, root: &str) -> Result<String>;

    fn test_page(&self, root: &str, script_name: &str) -> Result<String>;

    /// Script that defines a stub object for `script_name` whose methods
    /// call through the engine.
    fn interface_script(&self, script_name: &str, root: &str) -> Result<String>;
}
