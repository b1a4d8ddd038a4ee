//! Message classification for the CDP reader task.

/// Classification of an incoming CDP message.
#[derive(Debug, PartialEq, Eq)]
pub enum MessageKind {
    /// Answer to a command we sent (has `id`).
    Response { id: u64 },
    /// Unsolicited event (has `method`, no `id`).
    Event,
    /// Neither; logged and dropped.
    Unknown,
}

/// Classify a CDP message by inspecting its `id` and `method` fields.
pub fn classify_message(json: &serde_json::Value) -> MessageKind {
    let id = json.get("id").and_then(|v| v.as_u64());
    let method = json.get("method").and_then(|v| v.as_str());

    match (id, method) {
        (Some(id), _) => MessageKind::Response { id },
        (None, Some(_)) => MessageKind::Event,
        (None, None) => MessageKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_response() {
        let json = serde_json::json!({"id": 7, "result": {}});
        assert_eq!(classify_message(&json), MessageKind::Response { id: 7 });
    }

    #[test]
    fn test_classify_error_response() {
        let json = serde_json::json!({"id": 8, "error": {"code": -32000, "message": "x"}});
        assert_eq!(classify_message(&json), MessageKind::Response { id: 8 });
    }

    #[test]
    fn test_classify_event() {
        let json = serde_json::json!({"method": "Debugger.scriptParsed", "params": {}});
        assert_eq!(classify_message(&json), MessageKind::Event);
    }

    #[test]
    fn test_classify_unknown() {
        let json = serde_json::json!({"data": "something"});
        assert_eq!(classify_message(&json), MessageKind::Unknown);
    }
}
