use std::sync::Arc;

use dwr_common::transport::http::mime;
use dwr_common::{Calls, HttpTransport, HyperResponse, InboundRequest, Replies, Result};
use hyper::StatusCode;

use super::inbound::parse_batch;
use super::{reply_scripts, Marshaller};
use crate::outbound::Converter;

/// XMLHttpRequest transport.
///
/// The request body holds one `key=value` pair per line; the reply is plain
/// script, one statement per reply.
pub struct PlainJsMarshaller {
    converter: Arc<dyn Converter>,
}

impl PlainJsMarshaller {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        PlainJsMarshaller { converter }
    }
}

impl Marshaller for PlainJsMarshaller {
    fn marshall_inbound(&self, request: &InboundRequest) -> Result<Calls> {
        let body = request.body_text()?;

        // GET requests carry the batch in the query string
        if body.trim().is_empty() {
            let query = request.query.as_deref().unwrap_or_default();
            return parse_batch(decode_pairs(query));
        }

        let pairs = body
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .flat_map(decode_pairs);
        parse_batch(pairs)
    }

    fn marshall_outbound(&self, replies: &Replies) -> Result<HyperResponse> {
        let mut body = String::new();
        for script in reply_scripts(&self.converter, replies)? {
            body.push_str(&script);
            body.push('\n');
        }
        Ok(HttpTransport::text(StatusCode::OK, mime::PLAIN, body))
    }
}

fn decode_pairs(encoded: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(encoded.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::JsonConverter;
    use dwr_common::Reply;
    use http_body_util::BodyExt;
    use hyper::header::CONTENT_TYPE;
    use hyper::Method;
    use serde_json::json;

    fn marshaller() -> PlainJsMarshaller {
        PlainJsMarshaller::new(Arc::new(JsonConverter::new()))
    }

    #[test]
    fn test_parses_body_lines() {
        let request = InboundRequest::new(Method::POST, "/dwr", "/plainjs").with_body(
            "callCount=1\r\nc0-scriptName=Demo\r\nc0-methodName=sayHello\r\nc0-id=7\r\nc0-param0=string:Joe%20Bloggs\r\n",
        );
        let calls = marshaller().marshall_inbound(&request).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls.calls[0].id, "7");
        assert_eq!(calls.calls[0].params, vec![json!("Joe Bloggs")]);
    }

    #[test]
    fn test_falls_back_to_query_string() {
        let request = InboundRequest::new(Method::GET, "/dwr", "/plainjs")
            .with_query("callCount=1&c0-scriptName=Demo&c0-methodName=ping");
        let calls = marshaller().marshall_inbound(&request).unwrap();
        assert_eq!(calls.calls[0].method_name, "ping");
    }

    #[tokio::test]
    async fn test_outbound_is_plain_script() {
        let replies: Replies = vec![
            Reply::success("1", json!(42)),
            Reply::failure("2", "boom"),
        ]
        .into_iter()
        .collect();

        let response = marshaller().marshall_outbound(&replies).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/plain");

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "DWREngine._handleResponse(\"1\", 42);\nDWREngine._handleServerError(\"2\", \"boom\");\n"
        );
    }
}
