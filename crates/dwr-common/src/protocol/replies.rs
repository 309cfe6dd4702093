use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::calls::CallId;

/// A call-level failure. These travel back to the browser as data so the
/// engine can reject the matching pending call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplyFault {
    pub message: String,
}

impl ReplyFault {
    pub fn new(message: impl Into<String>) -> Self {
        ReplyFault {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reply {
    pub call_id: CallId,
    pub outcome: std::result::Result<Value, ReplyFault>,
}

impl Reply {
    pub fn success(call_id: impl Into<CallId>, value: Value) -> Self {
        Reply {
            call_id: call_id.into(),
            outcome: Ok(value),
        }
    }

    pub fn failure(call_id: impl Into<CallId>, message: impl Into<String>) -> Self {
        Reply {
            call_id: call_id.into(),
            outcome: Err(ReplyFault::new(message)),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Replies for one batch, in call order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Replies {
    pub replies: Vec<Reply>,
}

impl Replies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reply: Reply) {
        self.replies.push(reply);
    }

    pub fn len(&self) -> usize {
        self.replies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replies.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reply> {
        self.replies.iter()
    }
}

impl FromIterator<Reply> for Replies {
    fn from_iter<I: IntoIterator<Item = Reply>>(iter: I) -> Self {
        Replies {
            replies: iter.into_iter().collect(),
        }
    }
}
