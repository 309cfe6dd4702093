pub mod calls;
pub mod error;
pub mod replies;

#[cfg(test)]
mod tests;

pub use calls::{Call, CallId, Calls};
pub use error::{DwrError, Result};
pub use replies::{Replies, Reply, ReplyFault};
