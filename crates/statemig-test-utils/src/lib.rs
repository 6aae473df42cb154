//! Testing utilities for the statemig workspace
//!
//! Shared fixtures and proptest strategies for application state records.

#![allow(missing_docs)]

use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};
use statemig_record::RawRecord;
use statemig_schema::resources::application::schema_v0;

/// Build a record from a JSON object literal
///
/// # Panics
/// Panics if `value` is not a JSON object.
pub fn record(value: JsonValue) -> RawRecord {
    RawRecord::try_from(value).expect("fixture must be a JSON object")
}

/// Fully populated v0 application state, as a provider would have written it
pub fn application_v0() -> RawRecord {
    record(json!({
        "application_id": "00000000-0000-0000-0000-00000000a001",
        "object_id": "00000000-0000-0000-0000-00000000b001",
        "display_name": "billing-api",
        "available_to_other_tenants": false,
        "fallback_public_client_enabled": null,
        "group_membership_claims": "SecurityGroup",
        "homepage": "https://billing.example.com",
        "identifier_uris": ["api://billing"],
        "logout_url": "https://billing.example.com/logout",
        "oauth2_allow_implicit_flow": false,
        "owners": ["00000000-0000-0000-0000-00000000c001"],
        "public_client": true,
        "reply_urls": ["https://billing.example.com/callback"],
        "type": "webapp/api",
        "prevent_duplicate_names": false,
        "app_role": [{
            "id": "00000000-0000-0000-0000-00000000d001",
            "allowed_member_types": ["User"],
            "description": "Administrators",
            "display_name": "Admin",
            "enabled": true,
            "is_enabled": true,
            "value": "Admin"
        }],
        "optional_claims": [{
            "access_token": [{
                "name": "groups",
                "source": null,
                "essential": false,
                "additional_properties": ["emit_as_roles"]
            }],
            "id_token": []
        }],
        "required_resource_access": [{
            "resource_app_id": "00000003-0000-0000-c000-000000000000",
            "resource_access": [{
                "id": "e1fe6dd8-ba31-4d61-89e7-88639da4683d",
                "type": "Scope"
            }]
        }]
    }))
}

/// Minimal v0 state carrying only the two migrated attributes
pub fn legacy_pair(claims: &str, public_client: bool) -> RawRecord {
    record(json!({
        "group_membership_claims": claims,
        "public_client": public_client
    }))
}

/// Values an optional boolean attribute takes in stored state
pub fn arb_optional_bool() -> impl Strategy<Value = Option<JsonValue>> {
    prop_oneof![
        Just(None),
        Just(Some(JsonValue::Null)),
        any::<bool>().prop_map(|b| Some(JsonValue::Bool(b))),
    ]
}

/// Values `group_membership_claims` takes in v0 state
pub fn arb_claims() -> impl Strategy<Value = Option<JsonValue>> {
    prop_oneof![
        Just(None),
        Just(Some(JsonValue::Null)),
        prop_oneof![
            Just("None"),
            Just("SecurityGroup"),
            Just("All"),
            Just("DirectoryRole"),
            Just("ApplicationGroup"),
        ]
        .prop_map(|s| Some(JsonValue::from(s))),
    ]
}

/// JSON number literals whose text must survive a migration as written
///
/// Covers integers beyond `u64`, decimals with trailing zeros and
/// exponent forms.
pub fn arb_number_text() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        "-?[1-9][0-9]{20,30}",
        "-?(0|[1-9][0-9]{0,3})\\.[0-9]{0,5}0",
        "-?[1-9](\\.[0-9]{1,3})?[eE][+-]?[0-9]{1,3}",
    ]
}

/// A JSON number parsed from [`arb_number_text`]
pub fn arb_number() -> impl Strategy<Value = JsonValue> {
    arb_number_text().prop_map(|text| {
        serde_json::from_str(&text).expect("strategy yields valid JSON numbers")
    })
}

/// Untouched v0 attributes with plausible values
///
/// `app_role` also carries numeric members so arbitrary number literals
/// flow through every property.
pub fn arb_passthrough() -> impl Strategy<Value = Vec<(&'static str, JsonValue)>> {
    let entries = vec![
        ("display_name", "[a-z][a-z0-9-]{0,15}".prop_map(JsonValue::from).boxed()),
        ("homepage", "https://[a-z]{1,8}\\.example\\.com".prop_map(JsonValue::from).boxed()),
        ("available_to_other_tenants", any::<bool>().prop_map(JsonValue::from).boxed()),
        ("oauth2_allow_implicit_flow", any::<bool>().prop_map(JsonValue::from).boxed()),
        (
            "owners",
            prop::collection::vec("[0-9a-f]{8}", 0..3)
                .prop_map(JsonValue::from)
                .boxed(),
        ),
        (
            "identifier_uris",
            prop::collection::vec("api://[a-z]{1,8}", 0..3)
                .prop_map(JsonValue::from)
                .boxed(),
        ),
        (
            "web",
            ("https://[a-z]{1,8}\\.example\\.com", any::<bool>())
                .prop_map(|(url, implicit)| {
                    json!([{
                        "homepage_url": url,
                        "implicit_grant": [{"access_token_issuance_enabled": implicit}]
                    }])
                })
                .boxed(),
        ),
        (
            "app_role",
            (arb_number(), prop::collection::vec(arb_number(), 0..3))
                .prop_map(|(weight, limits)| {
                    json!([{
                        "allowed_member_types": ["User"],
                        "description": "Readers",
                        "display_name": "Reader",
                        "value": "Reader",
                        "weight": weight,
                        "limits": limits
                    }])
                })
                .boxed(),
        ),
    ];

    entries
        .into_iter()
        .map(|(key, strategy)| {
            prop::option::of(strategy).prop_map(move |value| value.map(|v| (key, v)))
        })
        .collect::<Vec<_>>()
        .prop_map(|entries| entries.into_iter().flatten().collect())
}

/// Arbitrary v0 application record
///
/// Every key is declared by the v0 descriptor; every attribute may be
/// absent, and the migrated ones may also be null.
pub fn arb_v0_record() -> impl Strategy<Value = RawRecord> {
    (
        arb_claims(),
        arb_optional_bool(),
        arb_optional_bool(),
        arb_passthrough(),
    )
        .prop_map(|(claims, public_client, fallback, rest)| {
            let mut map = serde_json::Map::new();
            for (key, value) in rest {
                map.insert(key.to_string(), value);
            }
            if let Some(v) = claims {
                map.insert("group_membership_claims".to_string(), v);
            }
            if let Some(v) = public_client {
                map.insert("public_client".to_string(), v);
            }
            if let Some(v) = fallback {
                map.insert("fallback_public_client_enabled".to_string(), v);
            }
            let record = RawRecord::from(map);
            debug_assert!(schema_v0().unknown_keys(&record).is_empty());
            record
        })
}
