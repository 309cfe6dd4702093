//! Wire transports
//!
//! A [`Marshaller`] turns a collected request into a batch of calls and the
//! batch's replies back into a response. Two transports are provided:
//!
//! - [`PlainJsMarshaller`] for XMLHttpRequest calls (`/plainjs`)
//! - [`HtmlJsMarshaller`] for the hidden-iframe fallback (`/htmljs`)
//!
//! Both render each reply as one exported [`ScriptBuffer`].

mod html;
mod inbound;
mod plain;

use std::sync::Arc;

use dwr_common::{Calls, HyperResponse, InboundRequest, Replies, Reply, Result};

use crate::outbound::Converter;
use crate::script_buffer::ScriptBuffer;

pub use html::HtmlJsMarshaller;
pub use inbound::parse_batch;
pub use plain::PlainJsMarshaller;

pub trait Marshaller: Send + Sync {
    /// Parse the batch carried by `request`.
    fn marshall_inbound(&self, request: &InboundRequest) -> Result<Calls>;

    /// Encode the replies for a batch.
    fn marshall_outbound(&self, replies: &Replies) -> Result<HyperResponse>;
}

/// Render one script per reply, in reply order.
///
/// A reply whose value cannot be converted is sent as a server error for
/// that call instead, so one bad value does not sink the whole batch.
pub(crate) fn reply_scripts(converter: &Arc<dyn Converter>, replies: &Replies) -> Result<Vec<String>> {
    replies
        .iter()
        .map(|reply| match reply_script(converter, reply) {
            Ok(script) => Ok(script),
            Err(e) => {
                tracing::warn!("Failed to convert reply for call {}: {}", reply.call_id, e);
                let fallback = Reply::failure(reply.call_id.clone(), e.to_string());
                reply_script(converter, &fallback)
            }
        })
        .collect()
}

fn reply_script(converter: &Arc<dyn Converter>, reply: &Reply) -> Result<String> {
    let mut buffer = ScriptBuffer::new(converter.clone());
    match &reply.outcome {
        Ok(value) => {
            buffer
                .append_script("DWREngine._handleResponse(")?
                .append_data(reply.call_id.as_str())?
                .append_script(", ")?
                .append_data(value.clone())?
                .append_script(");")?;
        }
        Err(fault) => {
            buffer
                .append_script("DWREngine._handleServerError(")?
                .append_data(reply.call_id.as_str())?
                .append_script(", ")?
                .append_data(fault.message.as_str())?
                .append_script(");")?;
        }
    }
    buffer.export()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::{JsonConverter, OutboundContext, OutboundVariable, ScriptData};
    use dwr_common::DwrError;
    use serde_json::json;

    fn json_converter() -> Arc<dyn Converter> {
        Arc::new(JsonConverter::new())
    }

    #[test]
    fn test_success_reply() {
        let replies: Replies = vec![Reply::success("12", json!({"a": [1]}))].into_iter().collect();
        assert_eq!(
            reply_scripts(&json_converter(), &replies).unwrap(),
            vec![r#"var s0={"a":[1]};DWREngine._handleResponse("12", s0);"#]
        );
    }

    #[test]
    fn test_failure_reply() {
        let replies: Replies = vec![Reply::failure("3", "No such method: A.b")].into_iter().collect();
        assert_eq!(
            reply_scripts(&json_converter(), &replies).unwrap(),
            vec![r#"DWREngine._handleServerError("3", "No such method: A.b");"#]
        );
    }

    /// Refuses arrays so reply conversion can be made to fail.
    struct NoArrays;

    impl Converter for NoArrays {
        fn convert(&self, data: &ScriptData, ctx: &mut OutboundContext) -> Result<OutboundVariable> {
            if matches!(data.downcast_ref::<serde_json::Value>(), Some(serde_json::Value::Array(_))) {
                return Err(DwrError::marshal("arrays are not allowed"));
            }
            JsonConverter::new().convert(data, ctx)
        }
    }

    #[test]
    fn test_unconvertible_value_becomes_server_error() {
        let converter: Arc<dyn Converter> = Arc::new(NoArrays);
        let replies: Replies = vec![
            Reply::success("1", json!([1, 2])),
            Reply::success("2", json!("ok")),
        ]
        .into_iter()
        .collect();

        let scripts = reply_scripts(&converter, &replies).unwrap();
        assert!(scripts[0].starts_with(r#"DWREngine._handleServerError("1", "#));
        assert!(scripts[0].contains("arrays are not allowed"));
        assert_eq!(scripts[1], r#"DWREngine._handleResponse("2", "ok");"#);
    }
}
