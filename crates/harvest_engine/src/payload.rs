//! Parsing of the normalized Voyager payloads.
//!
//! Responses carry a heterogeneous `included` list whose entries are tagged by
//! `$type`. Each entry is parsed into [`IncludedEntity`]; unknown or untagged
//! entries become [`IncludedEntity::Other`], while a known tag with a malformed
//! body is a decode error.
use harvest_core::{ConnectionIdentity, RawContact};
use serde::Deserialize;
use serde_json::Value;

use crate::{FailureKind, LookupError};

pub const MINI_PROFILE_TYPE: &str = "com.linkedin.voyager.identity.shared.MiniProfile";
pub const CONTACT_INFO_TYPE: &str = "com.linkedin.voyager.identity.profile.ProfileContactInfo";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "$type")]
pub enum IncludedEntity {
    #[serde(rename = "com.linkedin.voyager.identity.shared.MiniProfile")]
    MiniProfile(MiniProfile),
    #[serde(rename = "com.linkedin.voyager.identity.profile.ProfileContactInfo")]
    ContactInfo(ContactInfo),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniProfile {
    pub public_identifier: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub phone_numbers: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct NormalizedResponse {
    #[serde(default)]
    included: Vec<Value>,
}

pub fn parse_included(bytes: &[u8]) -> Result<Vec<IncludedEntity>, LookupError> {
    let response: NormalizedResponse = serde_json::from_slice(bytes)
        .map_err(|err| LookupError::new(FailureKind::Decode, err.to_string()))?;

    response
        .included
        .into_iter()
        .map(|value| {
            let tagged = value.get("$type").is_some_and(Value::is_string);
            match serde_json::from_value::<IncludedEntity>(value) {
                Ok(entity) => Ok(entity),
                Err(_) if !tagged => Ok(IncludedEntity::Other),
                Err(err) => Err(LookupError::new(FailureKind::Decode, err.to_string())),
            }
        })
        .collect()
}

/// Public identifiers of every mini profile, in payload order.
pub fn connection_identities(entities: &[IncludedEntity]) -> Vec<ConnectionIdentity> {
    entities
        .iter()
        .filter_map(|entity| match entity {
            IncludedEntity::MiniProfile(profile) => {
                Some(ConnectionIdentity::new(profile.public_identifier.clone()))
            }
            _ => None,
        })
        .collect()
}

/// Combine the contact-info record with the matching mini profile.
///
/// The contact-info record is required. Names and headline come from the mini
/// profile for `identity`, falling back to the first mini profile present, and
/// default to empty when there is none.
pub fn contact_from_entities(
    identity: &ConnectionIdentity,
    entities: Vec<IncludedEntity>,
) -> Result<RawContact, LookupError> {
    let mut contact_info = None;
    let mut matching = None;
    let mut first_profile = None;
    for entity in entities {
        match entity {
            IncludedEntity::ContactInfo(info) if contact_info.is_none() => contact_info = Some(info),
            IncludedEntity::MiniProfile(profile) => {
                if profile.public_identifier == identity.as_str() {
                    matching = Some(profile);
                } else if first_profile.is_none() {
                    first_profile = Some(profile);
                }
            }
            _ => {}
        }
    }

    let info = contact_info.ok_or_else(|| {
        LookupError::new(
            FailureKind::MissingVariant {
                expected: CONTACT_INFO_TYPE,
            },
            format!("no contact info for {identity}"),
        )
    })?;
    let profile = matching.or(first_profile);

    Ok(RawContact {
        first_name: profile.as_ref().and_then(|p| p.first_name.clone()),
        last_name: profile.as_ref().and_then(|p| p.last_name.clone()),
        email: info.email_address,
        phones: info.phone_numbers,
        headline: profile.and_then(|p| p.occupation),
    })
}
