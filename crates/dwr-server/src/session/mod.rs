//! Script sessions and reverse script delivery
//!
//! A [`ScriptSession`] is one browser page that server-side code can push
//! script to. How the script reaches the page is up to the implementation;
//! [`QueuedScriptSession`] just queues it until someone drains the queue.
//!
//! [`ScriptProxy`] builds DOM-manipulation calls and delivers each finished
//! script to a set of sessions, optionally narrowed by a
//! [`ScriptSessionFilter`].

mod proxy;

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::id_generator::generate_id;

pub use proxy::ScriptProxy;

pub trait ScriptSession: Send + Sync {
    fn id(&self) -> &str;

    /// Queue or send `script` for execution in the page.
    fn add_script(&self, script: String);
}

/// Decides which sessions a broadcast reaches.
pub trait ScriptSessionFilter: Send + Sync {
    fn matches(&self, session: &dyn ScriptSession) -> bool;
}

impl<F> ScriptSessionFilter for F
where
    F: Fn(&dyn ScriptSession) -> bool + Send + Sync,
{
    fn matches(&self, session: &dyn ScriptSession) -> bool {
        self(session)
    }
}

/// Passes sessions that pass both filters.
pub struct AndFilter<L, R> {
    left: L,
    right: R,
}

impl<L, R> AndFilter<L, R>
where
    L: ScriptSessionFilter,
    R: ScriptSessionFilter,
{
    pub fn new(left: L, right: R) -> Self {
        AndFilter { left, right }
    }
}

impl<L, R> ScriptSessionFilter for AndFilter<L, R>
where
    L: ScriptSessionFilter,
    R: ScriptSessionFilter,
{
    fn matches(&self, session: &dyn ScriptSession) -> bool {
        self.left.matches(session) && self.right.matches(session)
    }
}

/// In-memory session that keeps scripts in delivery order.
#[derive(Debug, Default)]
pub struct QueuedScriptSession {
    id: String,
    scripts: Mutex<VecDeque<String>>,
}

impl QueuedScriptSession {
    pub fn new(id: impl Into<String>) -> Self {
        QueuedScriptSession {
            id: id.into(),
            scripts: Mutex::new(VecDeque::new()),
        }
    }

    /// A session with a random alphanumeric id of `length` characters.
    pub fn with_generated_id(length: usize) -> Self {
        Self::new(generate_id(length))
    }

    /// Removes and returns every queued script, oldest first.
    pub fn drain(&self) -> Vec<String> {
        self.scripts.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScriptSession for QueuedScriptSession {
    fn id(&self) -> &str {
        &self.id
    }

    fn add_script(&self, script: String) {
        tracing::trace!("Queueing {} bytes of script for session {}", script.len(), self.id);
        self.scripts.lock().push_back(script);
    }
}
