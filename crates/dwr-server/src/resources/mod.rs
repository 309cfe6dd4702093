//! Static script sources
//!
//! The dispatcher asks a [`ScriptResources`] for the raw text of `engine.js`
//! and `util.js`. The bundled copies are compiled into the binary; a
//! directory can be used instead to serve modified scripts.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

pub const ENGINE_JS: &str = "/engine.js";
pub const UTIL_JS: &str = "/util.js";

/// Where static scripts come from.
pub trait ScriptResources: Send + Sync {
    /// Raw text of the resource at `path` (e.g. `/engine.js`), or `None` if
    /// there is no such resource.
    fn load(&self, path: &str) -> Option<Cow<'static, str>>;
}

/// The scripts shipped with this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledResources;

impl ScriptResources for BundledResources {
    fn load(&self, path: &str) -> Option<Cow<'static, str>> {
        match path {
            ENGINE_JS => Some(Cow::Borrowed(include_str!("engine.js"))),
            UTIL_JS => Some(Cow::Borrowed(include_str!("util.js"))),
            _ => None,
        }
    }
}

/// Scripts read from a directory on every load.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryResources { root: root.into() }
    }

    /// Only plain relative names are accepted; anything that could leave
    /// the directory yields `None`.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !plain || relative.as_os_str().is_empty() {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl ScriptResources for DirectoryResources {
    fn load(&self, path: &str) -> Option<Cow<'static, str>> {
        let file = self.resolve(path)?;
        match std::fs::read_to_string(&file) {
            Ok(text) => Some(Cow::Owned(text)),
            Err(e) => {
                tracing::debug!("Failed to read {}: {}", file.display(), e);
                None
            }
        }
    }
}
