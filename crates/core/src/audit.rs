//! Audit log action tags and detail redaction.
//!
//! The writer itself lives in the API crate; this module only defines what
//! gets written.

/// Action tags stored in `logs.action`.
pub mod actions {
    pub const LOGIN: &str = "login";
    pub const CREATE_USER: &str = "create_user";
    pub const UPDATE_USER: &str = "update_user";
    pub const DEACTIVATE_USER: &str = "deactivate_user";
    pub const UPDATE_PROFILE: &str = "update_profile";
    pub const UPDATE_CATALOG: &str = "update_catalog";
    pub const CREATE_TICKET: &str = "create_ticket";
    pub const UPDATE_STATUS: &str = "update_status";
    pub const UPDATE_PRIORITY: &str = "update_priority";
    pub const UPDATE_CATEGORY: &str = "update_category";
    pub const UPDATE_ASSIGNMENT: &str = "update_assignment";
    pub const ADD_COMMENT: &str = "add_comment";
    pub const ADD_ATTACHMENT: &str = "add_attachment";
    pub const SUBMIT_EVIDENCE: &str = "submit_evidence";
    pub const CREATE_REQUISITION: &str = "create_requisition";
    pub const UPDATE_REQUISITION: &str = "update_requisition";
    pub const REJECT_REQUISITION: &str = "reject_requisition";

    pub const ALL: &[&str] = &[
        LOGIN,
        CREATE_USER,
        UPDATE_USER,
        DEACTIVATE_USER,
        UPDATE_PROFILE,
        UPDATE_CATALOG,
        CREATE_TICKET,
        UPDATE_STATUS,
        UPDATE_PRIORITY,
        UPDATE_CATEGORY,
        UPDATE_ASSIGNMENT,
        ADD_COMMENT,
        ADD_ATTACHMENT,
        SUBMIT_EVIDENCE,
        CREATE_REQUISITION,
        UPDATE_REQUISITION,
        REJECT_REQUISITION,
    ];
}

pub fn is_known_action(action: &str) -> bool {
    actions::ALL.contains(&action)
}

/// Key substrings whose values never reach the log table.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "token",
    "secret",
    "api_key",
    "authorization",
    "credential",
];

const REDACTED: &str = "[REDACTED]";

/// Replace the value of every key containing a [`SENSITIVE_FIELDS`] entry
/// (case-insensitive) with `"[REDACTED]"`, recursing into nested objects and
/// arrays.
pub fn redact_sensitive_fields(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;

    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, val)| {
                    let lower = key.to_lowercase();
                    let val = if SENSITIVE_FIELDS.iter().any(|f| lower.contains(f)) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_sensitive_fields(val)
                    };
                    (key.clone(), val)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_fields).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn password_is_redacted() {
        let out = redact_sensitive_fields(&json!({
            "email": "ana@gemelli.edu.co",
            "password": "hunter22"
        }));
        assert_eq!(out["password"], "[REDACTED]");
        assert_eq!(out["email"], "ana@gemelli.edu.co");
    }

    #[test]
    fn key_match_is_case_insensitive_and_substring() {
        let out = redact_sensitive_fields(&json!({ "newPassword": "x", "AccessToken": "y" }));
        assert_eq!(out["newPassword"], "[REDACTED]");
        assert_eq!(out["AccessToken"], "[REDACTED]");
    }

    #[test]
    fn nested_values_are_redacted() {
        let out = redact_sensitive_fields(&json!({
            "user": { "secret": "s" },
            "list": [{ "token": "t", "ok": 1 }]
        }));
        assert_eq!(out["user"]["secret"], "[REDACTED]");
        assert_eq!(out["list"][0]["token"], "[REDACTED]");
        assert_eq!(out["list"][0]["ok"], 1);
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(redact_sensitive_fields(&json!(42)), json!(42));
    }

    #[test]
    fn action_tags_are_known() {
        assert!(is_known_action(actions::UPDATE_STATUS));
        assert!(!is_known_action("delete_ticket"));
    }
}
