//! OCSF (Open Cybersecurity Schema Framework) structured event logging.
//!
//! Audit events are emitted via `tracing::info!(target: "ocsf", ..)` as
//! structured JSON. Never panics: serialization errors drop the event.

use serde_json::{Value, json};
use std::time::{SystemTime, UNIX_EPOCH};

// OCSF event class UIDs
pub const CLASS_AUTHENTICATION: u32 = 3001;

// Activity IDs
pub const ACTIVITY_LOGON: u32 = 1;
pub const ACTIVITY_SERVICE_TICKET: u32 = 4; // Token refresh
pub const ACTIVITY_OTHER: u32 = 99; // Authorization decisions

// Status IDs
pub const STATUS_SUCCESS: u32 = 1;
pub const STATUS_FAILURE: u32 = 2;

// Severity IDs
pub const SEVERITY_INFORMATIONAL: u32 = 1;
pub const SEVERITY_LOW: u32 = 2;
pub const SEVERITY_MEDIUM: u32 = 3;
pub const SEVERITY_HIGH: u32 = 4;

const AUTH_PROTOCOL_OAUTH2: u32 = 10;

pub const DECISION_PERMIT: &str = "permit";
pub const DECISION_DENY: &str = "deny";

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn severity_name(id: u32) -> &'static str {
    match id {
        SEVERITY_INFORMATIONAL => "Informational",
        SEVERITY_LOW => "Low",
        SEVERITY_MEDIUM => "Medium",
        SEVERITY_HIGH => "High",
        5 => "Critical",
        _ => "Unknown",
    }
}

fn status_name(id: u32) -> &'static str {
    match id {
        STATUS_SUCCESS => "Success",
        _ => "Failure",
    }
}

fn product() -> Value {
    json!({
        "name": "hub-access",
        "version": env!("CARGO_PKG_VERSION"),
        "vendor_name": "Knowledge Hub"
    })
}

fn with_actor(mut event: Value, user_id: Option<&str>) -> Value {
    if let Some(uid) = user_id {
        event["actor"] = json!({
            "user": {
                "uid": uid,
                "type_id": 1,
                "type": "User"
            }
        });
    }
    event
}

fn emit(event: &Value) {
    if let Ok(json) = serde_json::to_string(event) {
        tracing::info!(target: "ocsf", "{}", json);
    }
}

fn authentication_payload(
    activity_id: u32,
    activity_name: &str,
    status_id: u32,
    severity_id: u32,
    user_id: Option<&str>,
    message: &str,
) -> Value {
    let event = json!({
        "class_uid": CLASS_AUTHENTICATION,
        "class_name": "Authentication",
        "activity_id": activity_id,
        "activity_name": activity_name,
        "severity_id": severity_id,
        "severity": severity_name(severity_id),
        "status_id": status_id,
        "status": status_name(status_id),
        "time": now_millis(),
        "metadata": { "product": product() },
        "auth_protocol_id": AUTH_PROTOCOL_OAUTH2,
        "auth_protocol": "OAuth 2.0/OIDC",
        "message": message,
    });
    with_actor(event, user_id)
}

fn authorization_payload(
    action: &str,
    resource_id: &str,
    decision: &str,
    reason: &str,
    severity_id: u32,
    user_id: Option<&str>,
) -> Value {
    let status_id = if decision == DECISION_PERMIT {
        STATUS_SUCCESS
    } else {
        STATUS_FAILURE
    };

    let event = json!({
        "class_uid": CLASS_AUTHENTICATION,
        "class_name": "Authentication",
        "activity_id": ACTIVITY_OTHER,
        "activity_name": "Other",
        "severity_id": severity_id,
        "severity": severity_name(severity_id),
        "status_id": status_id,
        "status": status_name(status_id),
        "time": now_millis(),
        "metadata": {
            "product": product(),
            "authorization": {
                "action": action,
                "resource": { "uid": resource_id },
                "decision": decision,
                "reason": reason,
            }
        },
        "message": format!("Access {decision} for {action} on {resource_id}"),
    });
    with_actor(event, user_id)
}

/// Emit an OCSF Authentication (3001) event.
pub fn authentication_event(
    activity_id: u32,
    activity_name: &str,
    status_id: u32,
    severity_id: u32,
    user_id: Option<&str>,
    message: &str,
) {
    emit(&authentication_payload(
        activity_id,
        activity_name,
        status_id,
        severity_id,
        user_id,
        message,
    ));
}

/// Emit an authorization decision (class 3001, activity 99/Other).
pub fn authorization_event(
    action: &str,
    resource_id: &str,
    decision: &str,
    reason: &str,
    severity_id: u32,
    user_id: Option<&str>,
) {
    emit(&authorization_payload(
        action,
        resource_id,
        decision,
        reason,
        severity_id,
        user_id,
    ));
}
