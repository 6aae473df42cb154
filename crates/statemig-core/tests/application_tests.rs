use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use statemig_core::resources::application::{self, upgrade_v0};
use statemig_core::{MigratorConfig, UpgradeError, VersionedRecord};
use statemig_record::{RawRecord, RecordDigest, Value};
use statemig_schema::resources::application::{schema_v1, V0, V1};
use statemig_test_utils::{application_v0, arb_number_text, arb_v0_record, legacy_pair, record};

fn keys(record: &RawRecord) -> BTreeSet<String> {
    record.keys().map(str::to_string).collect()
}

#[test]
fn test_full_record_upgrade() {
    let input = application_v0();
    let output = upgrade_v0(&input).unwrap();

    assert_eq!(
        output.get("group_membership_claims"),
        Some(&Value::from(vec![Value::from("SecurityGroup")]))
    );
    assert_eq!(
        output.get("fallback_public_client_enabled"),
        Some(&Value::Bool(true))
    );
    assert!(!output.contains_key("public_client"));

    // nested blocks pass through untouched
    for key in ["app_role", "optional_claims", "required_resource_access", "owners"] {
        assert_eq!(output.get(key), input.get(key), "{key} changed");
    }
    assert!(schema_v1().unknown_keys(&output).is_empty());
}

#[test]
fn test_scenarios() {
    assert_eq!(
        upgrade_v0(&record(json!({"group_membership_claims": "All"}))).unwrap(),
        record(json!({"group_membership_claims": ["All"]}))
    );
    assert_eq!(
        upgrade_v0(&record(json!({"public_client": true}))).unwrap(),
        record(json!({"fallback_public_client_enabled": true}))
    );
    assert_eq!(
        upgrade_v0(&record(json!({"public_client": true, "fallback_public_client_enabled": false})))
            .unwrap(),
        record(json!({"fallback_public_client_enabled": false}))
    );
    assert_eq!(upgrade_v0(&RawRecord::new()).unwrap(), RawRecord::new());
}

#[test]
fn test_numbers_survive_byte_for_byte() {
    let input = RawRecord::from_json(
        r#"{"group_membership_claims":"All","n_big":123456789012345678901234567890,"n_dec":1.10,"n_exp":1e2}"#,
    )
    .unwrap();
    let output = upgrade_v0(&input).unwrap();

    assert_eq!(
        serde_json::to_string(&output).unwrap(),
        r#"{"group_membership_claims":["All"],"n_big":123456789012345678901234567890,"n_dec":1.10,"n_exp":1e2}"#
    );
}

#[test]
fn test_already_current_record_untouched() {
    let v1 = VersionedRecord::new(V1, record(json!({"group_membership_claims": ["All"]})));
    assert_eq!(application::upgrader().upgrade(&v1).unwrap(), v1);
}

#[test]
fn test_future_record_rejected() {
    let future = VersionedRecord::new(V1.next(), RawRecord::new());
    assert!(matches!(
        application::upgrader().upgrade(&future),
        Err(UpgradeError::FutureVersion { .. })
    ));
}

#[test]
fn test_batch_matches_sequential() {
    let upgrader = application::upgrader()
        .with_config(MigratorConfig::new().with_parallel_threshold(4));
    let records: Vec<_> = (0..32)
        .map(|i| {
            let claims = if i % 2 == 0 { "All" } else { "None" };
            VersionedRecord::new(V0, legacy_pair(claims, i % 3 == 0))
        })
        .collect();

    let batch = upgrader.upgrade_batch(&records);
    let sequential: Vec<_> = records.iter().map(|r| upgrader.upgrade(r)).collect();
    assert_eq!(batch, sequential);
}

proptest! {
    #[test]
    fn prop_key_closure(input in arb_v0_record()) {
        let output = upgrade_v0(&input).unwrap();

        let mut allowed = keys(&input);
        allowed.remove("public_client");
        allowed.insert("fallback_public_client_enabled".to_string());

        prop_assert!(keys(&output).is_subset(&allowed));
        prop_assert!(!output.contains_key("public_client"));
        prop_assert!(schema_v1().unknown_keys(&output).is_empty());
    }

    #[test]
    fn prop_untouched_values_preserved(input in arb_v0_record()) {
        let output = upgrade_v0(&input).unwrap();
        let migrated = ["group_membership_claims", "public_client", "fallback_public_client_enabled"];

        for (key, value) in input.iter().filter(|(k, _)| !migrated.contains(&k.as_str())) {
            prop_assert_eq!(output.get(key), Some(value));
        }
    }

    #[test]
    fn prop_claims_wrapped(input in arb_v0_record()) {
        let output = upgrade_v0(&input).unwrap();
        match input.get("group_membership_claims") {
            Some(Value::String(s)) => prop_assert_eq!(
                output.get("group_membership_claims"),
                Some(&Value::from(vec![Value::from(s.as_str())]))
            ),
            other => prop_assert_eq!(output.get("group_membership_claims"), other),
        }
    }

    #[test]
    fn prop_new_value_precedence(input in arb_v0_record()) {
        let output = upgrade_v0(&input).unwrap();
        let fallback = output.get("fallback_public_client_enabled");

        if input.is_present("fallback_public_client_enabled") {
            prop_assert_eq!(fallback, input.get("fallback_public_client_enabled"));
        } else if input.is_present("public_client") {
            prop_assert_eq!(fallback, input.get("public_client"));
        } else {
            prop_assert_eq!(fallback, input.get("fallback_public_client_enabled"));
        }
    }

    #[test]
    fn prop_numbers_survive_verbatim(input in arb_v0_record(), extra in arb_number_text()) {
        let mut input = input;
        let number: serde_json::Value = serde_json::from_str(&extra).unwrap();
        input.insert("n_extra", Value::from(number));
        let output = upgrade_v0(&input).unwrap();

        prop_assert_eq!(
            serde_json::to_string(&output.get("n_extra")).unwrap(),
            extra
        );
        prop_assert_eq!(
            serde_json::to_string(&output.get("app_role")).unwrap(),
            serde_json::to_string(&input.get("app_role")).unwrap()
        );
    }

    #[test]
    fn prop_deterministic_and_atomic(input in arb_v0_record()) {
        let before = RecordDigest::of(&input);
        let first = upgrade_v0(&input).unwrap();
        let second = upgrade_v0(&input).unwrap();

        prop_assert_eq!(RecordDigest::of(&first), RecordDigest::of(&second));
        prop_assert_eq!(RecordDigest::of(&input), before);
    }

    #[test]
    fn prop_upgrader_matches_transition(input in arb_v0_record()) {
        let via_upgrader = application::upgrader()
            .upgrade(&VersionedRecord::new(V0, input.clone()))
            .unwrap();
        prop_assert_eq!(via_upgrader.schema_version, V1);
        prop_assert_eq!(via_upgrader.attributes, upgrade_v0(&input).unwrap());
    }
}
