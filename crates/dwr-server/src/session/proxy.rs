use std::sync::Arc;

use dwr_common::Result;
use serde_json::{Map, Value};

use super::{ScriptSession, ScriptSessionFilter};
use crate::outbound::{Converter, JsonConverter, ScriptData};
use crate::script_buffer::ScriptBuffer;

/// Sends `DWRUtil` calls to a set of script sessions.
///
/// Every call renders one script and hands the same text to each session in
/// turn. Deliveries are independent: there is no rollback if a session
/// drops the script.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use dwr_server::session::{QueuedScriptSession, ScriptProxy, ScriptSession};
///
/// let page = Arc::new(QueuedScriptSession::new("page-1"));
/// let sessions: Vec<Arc<dyn ScriptSession>> = vec![page.clone()];
/// let proxy = ScriptProxy::from_sessions(sessions);
/// proxy.set_value("status", "Ready", false)?;
///
/// assert_eq!(page.drain(), vec![r#"DWRUtil.setValue("status","Ready",null);"#]);
/// # Ok::<(), dwr_common::DwrError>(())
/// ```
pub struct ScriptProxy {
    sessions: Vec<Arc<dyn ScriptSession>>,
    converter: Arc<dyn Converter>,
}

impl ScriptProxy {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        ScriptProxy {
            sessions: Vec::new(),
            converter,
        }
    }

    /// Targets every given session, converting with [`JsonConverter`].
    pub fn from_sessions<I>(sessions: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ScriptSession>>,
    {
        let mut proxy = Self::new(Arc::new(JsonConverter::new()));
        proxy.sessions.extend(sessions);
        proxy
    }

    /// Targets the given sessions that pass `filter`.
    pub fn filtered<I, F>(sessions: I, filter: &F) -> Self
    where
        I: IntoIterator<Item = Arc<dyn ScriptSession>>,
        F: ScriptSessionFilter + ?Sized,
    {
        Self::from_sessions(
            sessions
                .into_iter()
                .filter(|session| filter.matches(session.as_ref())),
        )
    }

    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn add_session(&mut self, session: Arc<dyn ScriptSession>) {
        self.sessions.push(session);
    }

    pub fn sessions(&self) -> &[Arc<dyn ScriptSession>] {
        &self.sessions
    }

    /// A fresh buffer using this proxy's converter.
    pub fn buffer(&self) -> ScriptBuffer {
        ScriptBuffer::new(self.converter.clone())
    }

    /// `DWRUtil.setValue(id, value, options)`
    pub fn set_value(
        &self,
        element_id: &str,
        value: impl Into<ScriptData>,
        escape_html: bool,
    ) -> Result<()> {
        let mut buffer = self.buffer();
        buffer
            .append_script("DWRUtil.setValue(")?
            .append_data(element_id)?
            .append_script_char(',')?
            .append_data(value)?
            .append_script_char(',')?
            .append_script(html_options(escape_html))?
            .append_script(");")?;
        self.add_script(buffer)
    }

    /// `DWRUtil.setValues(map, options)`: one `setValue` per key.
    pub fn set_values(&self, values: Map<String, Value>, escape_html: bool) -> Result<()> {
        let mut buffer = self.buffer();
        buffer
            .append_script("DWRUtil.setValues(")?
            .append_data(Value::Object(values))?
            .append_script_char(',')?
            .append_script(html_options(escape_html))?
            .append_script(");")?;
        self.add_script(buffer)
    }

    /// `DWRUtil.addOptions(id, array)`: each string is both value and text.
    pub fn add_options(&self, element_id: &str, options: &[String]) -> Result<()> {
        let array = Value::Array(options.iter().cloned().map(Value::String).collect());
        let mut buffer = self.buffer();
        buffer
            .append_script("DWRUtil.addOptions(")?
            .append_data(element_id)?
            .append_script_char(',')?
            .append_data(array)?
            .append_script(");")?;
        self.add_script(buffer)
    }

    /// `DWRUtil.addOptions(id, objects, valueProp, textProp)`
    pub fn add_options_with_properties(
        &self,
        element_id: &str,
        objects: Vec<Value>,
        value_property: &str,
        text_property: &str,
    ) -> Result<()> {
        let mut buffer = self.buffer();
        buffer
            .append_script("DWRUtil.addOptions(")?
            .append_data(element_id)?
            .append_script_char(',')?
            .append_data(Value::Array(objects))?
            .append_script_char(',')?
            .append_data(value_property)?
            .append_script_char(',')?
            .append_data(text_property)?
            .append_script(");")?;
        self.add_script(buffer)
    }

    pub fn remove_all_options(&self, element_id: &str) -> Result<()> {
        self.element_call("DWRUtil.removeAllOptions(", element_id)
    }

    pub fn remove_all_rows(&self, element_id: &str) -> Result<()> {
        self.element_call("DWRUtil.removeAllRows(", element_id)
    }

    /// Exports `buffer` and delivers the script to every session.
    pub fn add_script(&self, mut buffer: ScriptBuffer) -> Result<()> {
        let script = buffer.export()?;
        tracing::debug!("Delivering script to {} sessions", self.sessions.len());
        for session in &self.sessions {
            session.add_script(script.clone());
        }
        Ok(())
    }

    fn element_call(&self, function: &str, element_id: &str) -> Result<()> {
        let mut buffer = self.buffer();
        buffer
            .append_script(function)?
            .append_data(element_id)?
            .append_script(");")?;
        self.add_script(buffer)
    }
}

fn html_options(escape_html: bool) -> &'static str {
    if escape_html {
        "{escapeHtml:true}"
    } else {
        "null"
    }
}
