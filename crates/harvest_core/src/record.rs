use serde::Serialize;
use serde_json::Value;

use crate::ConnectionIdentity;

pub const DEFAULT_PROFILE_BASE_URL: &str = "https://www.linkedin.com/in";

/// Contact details as delivered by the lookup, before normalization.
///
/// Every field is optional; a payload missing any of them still normalizes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// Left untyped: anything other than an array means "no phones".
    pub phones: Option<Value>,
    pub headline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_url: String,
    pub phones: Option<Vec<String>>,
    pub title: String,
}

impl ConnectionRecord {
    /// Normalize a raw contact. `profile_url` is always derived from the identity.
    pub fn from_contact(
        identity: &ConnectionIdentity,
        profile_base_url: &str,
        raw: RawContact,
    ) -> Self {
        Self {
            first_name: raw.first_name.unwrap_or_default(),
            last_name: raw.last_name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            profile_url: profile_url(profile_base_url, identity),
            phones: normalize_phones(raw.phones),
            title: raw.headline.unwrap_or_default(),
        }
    }
}

pub fn profile_url(base: &str, identity: &ConnectionIdentity) -> String {
    format!("{}/{}", base.trim_end_matches('/'), identity)
}

fn normalize_phones(value: Option<Value>) -> Option<Vec<String>> {
    match value {
        Some(Value::Array(entries)) => Some(entries.iter().filter_map(phone_number).collect()),
        _ => None,
    }
}

// Entries are `{ "number": "...", "type": "..." }`; bare strings are accepted too.
fn phone_number(entry: &Value) -> Option<String> {
    match entry {
        Value::String(number) => Some(number.clone()),
        Value::Object(map) => map
            .get("number")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned),
        _ => None,
    }
}
