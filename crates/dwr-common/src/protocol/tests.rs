//! Tests for the batch and reply types

#[cfg(test)]
mod tests {
    use super::super::*;
    use hyper::StatusCode;
    use serde_json::json;

    #[test]
    fn test_call_creation() {
        let call = Call::new("c0", "Demo", "sayHello", vec![json!("Joe")]);
        assert_eq!(call.id, "c0");
        assert_eq!(call.script_name, "Demo");
        assert_eq!(call.method_name, "sayHello");
        assert_eq!(call.params, vec![json!("Joe")]);
    }

    #[test]
    fn test_calls_collect_preserves_order() {
        let calls: Calls = (0..3)
            .map(|i| Call::new(i.to_string(), "Demo", "m", vec![]))
            .collect();
        assert_eq!(calls.len(), 3);
        let ids: Vec<_> = calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_reply_success() {
        let reply = Reply::success("7", json!({"ok": true}));
        assert!(reply.is_success());
        assert_eq!(reply.call_id, "7");
        assert_eq!(reply.outcome, Ok(json!({"ok": true})));
    }

    #[test]
    fn test_reply_failure_is_data() {
        let reply = Reply::failure("7", "No such method: Demo.nope");
        assert!(!reply.is_success());
        assert_eq!(
            reply.outcome,
            Err(ReplyFault::new("No such method: Demo.nope"))
        );
    }

    #[test]
    fn test_empty_batches() {
        assert!(Calls::new().is_empty());
        assert!(Replies::new().is_empty());
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(DwrError::RoutingMiss("/nope".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(DwrError::marshal("bad").status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            DwrError::ResourceNotFound("/engine.js".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DwrError::InvalidState("closed".into()).to_string(),
            "Invalid state: closed"
        );
    }
}
