//! `tp_auth_status`: report whether the stored session is usable.

use serde_json::{json, Map, Value};

use super::sanitize::sanitize_result;
use crate::auth::storage::CredentialResolver;
use crate::auth::validator::{AuthStatus, SessionValidator};

const AUTHENTICATE_ACTION: &str = "Run 'tp-mcp auth' to authenticate";

/// What the user should do about a failed validation.
pub fn action_for(status: AuthStatus) -> &'static str {
    match status {
        AuthStatus::Expired => "Session expired. Run 'tp-mcp auth' to re-authenticate.",
        AuthStatus::Invalid => "Invalid credentials. Run 'tp-mcp auth' to re-authenticate.",
        AuthStatus::NetworkError => "Network error. Check connection and retry.",
        AuthStatus::Valid | AuthStatus::NoCredential => AUTHENTICATE_ACTION,
    }
}

/// Check the stored credential against the API.
///
/// The returned map never carries the secret itself.
pub async fn auth_status(
    resolver: &CredentialResolver,
    validator: &dyn SessionValidator,
) -> Map<String, Value> {
    let credential = resolver.get();
    let Some(secret) = credential.secret() else {
        return to_map(json!({
            "valid": false,
            "athlete_id": null,
            "message": "No credential stored",
            "action_needed": AUTHENTICATE_ACTION,
        }));
    };

    let result = validator.validate(secret.expose()).await;
    let value = if result.is_valid() {
        json!({
            "valid": true,
            "athlete_id": result.athlete_id,
            "email": result.email,
            "storage": resolver.storage_backend(),
            "message": "Authentication valid",
            "action_needed": null,
        })
    } else {
        json!({
            "valid": false,
            "athlete_id": null,
            "message": result.message,
            "action_needed": action_for(result.status),
        })
    };
    to_map(value)
}

pub(crate) fn to_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => sanitize_result(map),
        _ => Map::new(),
    }
}
