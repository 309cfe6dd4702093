use std::sync::Arc;

use dwr_common::transport::http::mime;
use dwr_common::{Calls, HttpTransport, HyperResponse, InboundRequest, Replies, Result};
use hyper::StatusCode;

use super::inbound::parse_batch;
use super::{reply_scripts, Marshaller};
use crate::outbound::Converter;

const PREFIX: &str = "<script type='text/javascript'>\nvar DWREngine = window.parent.DWREngine;\n";
const SUFFIX: &str = "</script>\n";

/// Hidden-iframe transport.
///
/// The batch arrives as ordinary form data. The reply is an HTML page whose
/// script reaches back into the parent window's engine.
pub struct HtmlJsMarshaller {
    converter: Arc<dyn Converter>,
}

impl HtmlJsMarshaller {
    pub fn new(converter: Arc<dyn Converter>) -> Self {
        HtmlJsMarshaller { converter }
    }
}

impl Marshaller for HtmlJsMarshaller {
    fn marshall_inbound(&self, request: &InboundRequest) -> Result<Calls> {
        parse_batch(request.form_pairs())
    }

    fn marshall_outbound(&self, replies: &Replies) -> Result<HyperResponse> {
        let mut body = String::from(PREFIX);
        for script in reply_scripts(&self.converter, replies)? {
            // Must not close the surrounding script element early
            body.push_str(&script.replace("</", "<\\/"));
            body.push('\n');
        }
        body.push_str(SUFFIX);
        Ok(HttpTransport::text(StatusCode::OK, mime::HTML, body))
    }
}
