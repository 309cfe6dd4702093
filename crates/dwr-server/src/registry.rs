//! In-process method registry
//!
//! [`MethodRegistry`] maps `Interface.method` names to Rust closures. It is
//! both the batch executor and the debug page generator for the server.
//!
//! # Example
//!
//! ```
//! use dwr_server::registry::MethodRegistry;
//! use dwr_server::Remoter;
//! use dwr_common::{Call, Calls};
//! use serde_json::json;
//!
//! let mut registry = MethodRegistry::new();
//! registry.register("Demo", "sayHello", 1, |params| {
//!     let name = params[0].as_str().unwrap_or("stranger");
//!     Ok(json!(format!("Hello, {}", name)))
//! });
//!
//! let calls: Calls = vec![Call::new("0", "Demo", "sayHello", vec![json!("Joe")])]
//!     .into_iter()
//!     .collect();
//! let replies = registry.execute(calls).unwrap();
//! assert!(replies.replies[0].is_success());
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::Arc;

use dwr_common::{Call, Calls, DwrError, Replies, Reply, Result};
use serde_json::Value;

use crate::remoter::{DebugPageGenerator, Remoter};

/// A remoted method. Errors become failure replies.
pub type RemoteMethod = Arc<dyn Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync>;

#[derive(Clone)]
struct MethodEntry {
    param_count: usize,
    handler: RemoteMethod,
}

#[derive(Clone, Default)]
pub struct MethodRegistry {
    interfaces: BTreeMap<String, BTreeMap<String, MethodEntry>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `script_name.method_name` taking exactly `param_count`
    /// parameters.
    pub fn register<F>(
        &mut self,
        script_name: &str,
        method_name: &str,
        param_count: usize,
        handler: F,
    ) -> &mut Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, String> + Send + Sync + 'static,
    {
        self.interfaces
            .entry(script_name.to_string())
            .or_default()
            .insert(
                method_name.to_string(),
                MethodEntry {
                    param_count,
                    handler: Arc::new(handler),
                },
            );
        self
    }

    pub fn interface_names(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    pub fn contains(&self, script_name: &str, method_name: &str) -> bool {
        self.interfaces
            .get(script_name)
            .is_some_and(|methods| methods.contains_key(method_name))
    }

    fn methods(&self, script_name: &str) -> Result<&BTreeMap<String, MethodEntry>> {
        self.interfaces
            .get(script_name)
            .ok_or_else(|| DwrError::RoutingMiss(format!("No such interface: {}", script_name)))
    }

    fn execute_call(&self, call: Call) -> Reply {
        let entry = self
            .interfaces
            .get(&call.script_name)
            .and_then(|methods| methods.get(&call.method_name));

        let Some(entry) = entry else {
            tracing::debug!("No such method: {}.{}", call.script_name, call.method_name);
            return Reply::failure(
                call.id,
                format!("No such method: {}.{}", call.script_name, call.method_name),
            );
        };

        if call.params.len() != entry.param_count {
            return Reply::failure(
                call.id,
                format!(
                    "Wrong number of parameters for {}.{}: expected {}, got {}",
                    call.script_name,
                    call.method_name,
                    entry.param_count,
                    call.params.len()
                ),
            );
        }

        match (entry.handler)(&call.params) {
            Ok(value) => Reply::success(call.id, value),
            Err(message) => {
                tracing::debug!(
                    "{}.{} failed: {}",
                    call.script_name,
                    call.method_name,
                    message
                );
                Reply::failure(call.id, message)
            }
        }
    }
}

impl Remoter for MethodRegistry {
    fn execute(&self, calls: Calls) -> Result<Replies> {
        Ok(calls.into_iter().map(|call| self.execute_call(call)).collect())
    }
}

impl DebugPageGenerator for MethodRegistry {
    fn index_page(&self, root: &str) -> Result<String> {
        let mut page = String::from("Classes known to DWR:\n\n");
        for (name, methods) in &self.interfaces {
            let _ = writeln!(
                page,
                "  {} ({} methods): {}/test/{}",
                name,
                methods.len(),
                root,
                name
            );
        }
        Ok(page)
    }

    fn test_page(&self, root: &str, script_name: &str) -> Result<String> {
        let methods = self.methods(script_name)?;

        let mut page = format!("Methods for {}:\n\n", script_name);
        for (name, entry) in methods {
            let _ = writeln!(page, "  {}({})", name, param_list(entry.param_count));
        }
        let _ = write!(
            page,
            "\nTo use this interface, include:\n\
             <script type='text/javascript' src='{root}/interface/{script}.js'></script>\n\
             <script type='text/javascript' src='{root}/engine.js'></script>\n",
            root = root,
            script = script_name
        );
        Ok(page)
    }

    fn interface_script(&self, script_name: &str, root: &str) -> Result<String> {
        let methods = self.methods(script_name)?;

        let mut script = format!(
            "// Interface for {name}\n\
             if (typeof DWREngine == 'undefined') DWREngine = {{}};\n\
             if (DWREngine._defaultPath == undefined) DWREngine._defaultPath = '{root}';\n\
             function {name}() {{ }}\n\
             {name}._path = '{root}';\n",
            name = script_name,
            root = root
        );

        for (method, entry) in methods {
            let params = param_list(entry.param_count);
            let args = if params.is_empty() {
                "callback".to_string()
            } else {
                format!("{}, callback", params)
            };
            let _ = write!(
                script,
                "{name}.{method} = function({args}) {{\n  \
                 DWREngine._execute({name}._path, '{name}', '{method}', {args});\n\
                 }};\n",
                name = script_name,
                method = method,
                args = args
            );
        }

        Ok(script)
    }
}

fn param_list(count: usize) -> String {
    (0..count)
        .map(|i| format!("p{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        registry
            .register("Demo", "sayHello", 1, |params| {
                Ok(json!(format!("Hello, {}", params[0].as_str().unwrap_or("?"))))
            })
            .register("Demo", "fail", 0, |_| Err("it broke".to_string()));
        registry
    }

    fn batch(calls: Vec<Call>) -> Calls {
        calls.into_iter().collect()
    }

    #[test]
    fn test_execute_success() {
        let replies = registry()
            .execute(batch(vec![Call::new("1", "Demo", "sayHello", vec![json!("Joe")])]))
            .unwrap();
        assert_eq!(replies.replies, vec![Reply::success("1", json!("Hello, Joe"))]);
    }

    #[test]
    fn test_unknown_method_is_failure_reply() {
        let replies = registry()
            .execute(batch(vec![Call::new("1", "Demo", "nope", vec![])]))
            .unwrap();
        assert_eq!(replies.replies, vec![Reply::failure("1", "No such method: Demo.nope")]);
    }

    #[test]
    fn test_wrong_arity_is_failure_reply() {
        let replies = registry()
            .execute(batch(vec![Call::new("1", "Demo", "sayHello", vec![])]))
            .unwrap();
        assert!(!replies.replies[0].is_success());
    }

    #[test]
    fn test_handler_error_is_failure_reply() {
        let replies = registry()
            .execute(batch(vec![
                Call::new("1", "Demo", "fail", vec![]),
                Call::new("2", "Demo", "sayHello", vec![json!("Ann")]),
            ]))
            .unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies.replies[0], Reply::failure("1", "it broke"));
        assert!(replies.replies[1].is_success());
    }

    #[test]
    fn test_interface_script() {
        let script = registry().interface_script("Demo", "/dwr").unwrap();
        assert!(script.contains("function Demo() { }"));
        assert!(script.contains("Demo._path = '/dwr';"));
        assert!(script.contains("Demo.sayHello = function(p0, callback) {"));
        assert!(script.contains("DWREngine._execute(Demo._path, 'Demo', 'sayHello', p0, callback);"));
        assert!(script.contains("Demo.fail = function(callback) {"));
    }

    #[test]
    fn test_unknown_interface_is_routing_miss() {
        assert!(matches!(
            registry().interface_script("Nope", "/dwr"),
            Err(DwrError::RoutingMiss(_))
        ));
        assert!(matches!(
            registry().test_page("/dwr", "Nope"),
            Err(DwrError::RoutingMiss(_))
        ));
    }

    #[test]
    fn test_pages_list_interfaces() {
        let registry = registry();
        let index = registry.index_page("/dwr").unwrap();
        assert!(index.contains("Demo (2 methods): /dwr/test/Demo"));

        let test = registry.test_page("/dwr", "Demo").unwrap();
        assert!(test.contains("sayHello(p0)"));
        assert!(test.contains("/dwr/interface/Demo.js"));
    }
}
