//! API shape tests — validates that controller response shapes match what
//! the operator panel expects.
//!
//! These assert field names and types on representative JSON so panel-side
//! parsing never silently breaks.

/// Every mutating route answers `{ success, error? }`; `error` is present
/// only on failure.
#[test]
fn test_router_response_shape() {
    let ok = serde_json::json!({ "success": true });
    assert!(ok["success"].as_bool().unwrap());
    assert!(ok.get("error").is_none());

    let failed = serde_json::json!({
        "success": false,
        "error": "No active session for this context",
    });
    assert!(!failed["success"].as_bool().unwrap());
    assert!(failed["error"].is_string());
}

/// A one-off scrape flattens its outcome into the response body.
#[test]
fn test_scrape_response_shape() {
    let response = serde_json::json!({
        "success": true,
        "result": {
            "ok": true,
            "text": "bye",
            "auxiliary": "+15550100",
        },
        "relayed": true,
        "injected": true,
    });

    assert!(response["success"].is_boolean());
    assert!(response["result"]["ok"].is_boolean());
    assert!(response["result"]["text"].is_string());
    assert!(response["relayed"].is_boolean());
}

/// GET /api/status aggregates indicators, sessions, and context ids.
#[test]
fn test_status_response_shape() {
    let status = serde_json::json!({
        "indicators": {
            "tab-1": { "active": true, "label": "Monitoring: Active" },
        },
        "sessions": [
            {
                "contextId": "tab-1",
                "endpoint": "http://localhost:3000/sms",
                "active": true,
                "lastObservedText": "bye",
            }
        ],
        "contexts": ["tab-1"],
    });

    assert!(status["indicators"].is_object());
    assert!(status["indicators"]["tab-1"]["active"].is_boolean());
    assert!(status["indicators"]["tab-1"]["label"].is_string());
    assert!(status["sessions"].is_array());

    let session = &status["sessions"][0];
    assert!(session["contextId"].is_string());
    assert!(session["endpoint"].is_string());
    assert!(session["active"].is_boolean());
    assert!(status["contexts"].is_array());
}

/// Settings round-trip on the camelCase keys the panel reads and writes.
#[test]
fn test_settings_shape() {
    let settings = serde_json::json!({
        "selectorMethod": "css",
        "selector": ".message, .text-message, .sms-message",
        "customSelectors": [".message", ".text-message", ".message-body"],
        "endpoint": "http://localhost:3000/sms",
        "isMonitoring": false,
        "pollIntervalMs": 1000,
        "settleDelayMs": 500,
    });

    assert!(settings["selectorMethod"].is_string());
    assert!(settings["selector"].is_string());
    assert!(settings["customSelectors"].is_array());
    assert!(settings["endpoint"].is_string());
    assert!(settings["isMonitoring"].is_boolean());
    assert!(settings["pollIntervalMs"].is_number());
    assert!(settings["settleDelayMs"].is_number());
}

/// Relay request body sent to the operator endpoint.
#[test]
fn test_relay_payload_shape() {
    let payload = serde_json::json!({
        "text": "bye",
        "auxiliary": "+15550100",
        "source": "https://messages.example.com/web",
        "timestamp": "2026-08-30T12:00:00+00:00",
    });

    assert!(payload["text"].is_string());
    assert!(payload["source"].is_string());
    assert!(payload["timestamp"].is_string());
    assert!(payload.get("method").is_none());

    let selection = serde_json::json!({
        "text": "call me back",
        "source": "https://messages.example.com/web",
        "timestamp": "2026-08-30T12:00:00+00:00",
        "method": "context_menu_selection",
    });
    assert_eq!(selection["method"], "context_menu_selection");
}
