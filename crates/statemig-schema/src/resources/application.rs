//! `azuread_application` descriptors
//!
//! Version 0 is the layout written by the 1.x provider before the state
//! upgrade; version 1 differs only in two places:
//! - `group_membership_claims` is a list of strings instead of a string
//! - `public_client` is gone, replaced by `fallback_public_client_enabled`

use once_cell::sync::Lazy;
use statemig_record::FieldPath;

use crate::field::{Block, FieldSchema};
use crate::kind::{ScalarKind, Validation};
use crate::resource::ResourceSchema;
use crate::version::SchemaVersion;

/// Resource type name
pub const TYPE_NAME: &str = "azuread_application";

/// Layout before the upgrade
pub const V0: SchemaVersion = SchemaVersion::new(0);

/// Current layout
pub const V1: SchemaVersion = SchemaVersion::new(1);

static SCHEMA_V0: Lazy<ResourceSchema> =
    Lazy::new(|| ResourceSchema::new(TYPE_NAME, V0, root_v0()));

static SCHEMA_V1: Lazy<ResourceSchema> =
    Lazy::new(|| ResourceSchema::new(TYPE_NAME, V1, root_v1()));

/// Descriptor for schema version 0
#[must_use]
pub fn schema_v0() -> &'static ResourceSchema {
    &SCHEMA_V0
}

/// Descriptor for schema version 1
#[must_use]
pub fn schema_v1() -> &'static ResourceSchema {
    &SCHEMA_V1
}

/// Descriptor for `version`, if one is declared
#[must_use]
pub fn schema_for(version: SchemaVersion) -> Option<&'static ResourceSchema> {
    match version.get() {
        0 => Some(schema_v0()),
        1 => Some(schema_v1()),
        _ => None,
    }
}

const GROUP_MEMBERSHIP_CLAIMS: [&str; 5] =
    ["All", "None", "ApplicationGroup", "DirectoryRole", "SecurityGroup"];

const ADDITIONAL_CLAIM_PROPERTIES: [&str; 7] = [
    "dns_domain_and_sam_account_name",
    "emit_as_roles",
    "include_externally_authenticated_upn",
    "include_externally_authenticated_upn_without_hash",
    "netbios_domain_and_sam_account_name",
    "sam_account_name",
    "use_guid",
];

fn path(segments: &[&str]) -> FieldPath {
    FieldPath::new(segments.iter().map(|s| (*s).to_string()).collect())
}

fn root_v1() -> Block {
    root_v0()
        .without("public_client")
        .field(
            FieldSchema::bool("fallback_public_client_enabled")
                .optional()
                .computed(),
        )
        .field(
            FieldSchema::list_of("group_membership_claims", ScalarKind::String)
                .optional()
                .validation(Validation::one_of(GROUP_MEMBERSHIP_CLAIMS)),
        )
}

fn root_v0() -> Block {
    Block::new()
        .field(
            FieldSchema::string("display_name")
                .optional()
                .computed()
                .exactly_one_of([path(&["display_name"]), path(&["name"])])
                .validation(Validation::NotEmpty),
        )
        .field(
            FieldSchema::string("name")
                .optional()
                .computed()
                .exactly_one_of([path(&["display_name"]), path(&["name"])])
                .validation(Validation::NotEmpty)
                .deprecated(
                    "This property has been renamed to `display_name` and will be removed in version 2.0 of the AzureAD provider",
                ),
        )
        .field(FieldSchema::single_block("api", api_block()).optional().computed())
        .field(FieldSchema::block_set("app_role", app_role_block()).optional().computed())
        .field(
            FieldSchema::bool("available_to_other_tenants")
                .optional()
                .computed()
                .conflicts_with([path(&["sign_in_audience"])])
                .deprecated(
                    "[NOTE] This attribute will be replaced by a new property `sign_in_audience` in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::bool("fallback_public_client_enabled")
                .optional()
                .computed()
                .conflicts_with([path(&["public_client"])]),
        )
        .field(
            FieldSchema::string("group_membership_claims")
                .optional()
                .validation(Validation::one_of(GROUP_MEMBERSHIP_CLAIMS))
                .deprecated(
                    "[NOTE] This attribute will become a list in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::string("homepage")
                .optional()
                .computed()
                .validation(Validation::HttpUrl)
                .conflicts_with([path(&["web", "0", "homepage_url"])])
                .deprecated(
                    "[NOTE] This attribute will be replaced by a new attribute `homepage_url` in the `web` block in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::list_of("identifier_uris", ScalarKind::String)
                .optional()
                .computed()
                .validation(Validation::AppUri),
        )
        .field(
            FieldSchema::string("logout_url")
                .optional()
                .computed()
                .validation(Validation::HttpUrl)
                .conflicts_with([path(&["web", "0", "logout_url"])])
                .deprecated(
                    "[NOTE] This attribute will be moved into the `web` block in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::bool("oauth2_allow_implicit_flow")
                .optional()
                .computed()
                .conflicts_with([path(&[
                    "web",
                    "0",
                    "implicit_grant",
                    "0",
                    "access_token_issuance_enabled",
                ])])
                .deprecated(
                    "[NOTE] This attribute will be moved to the `implicit_grant` block and renamed to `access_token_issuance_enabled` in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::block_set("oauth2_permissions", oauth2_permissions_block())
                .optional()
                .computed()
                .deprecated(
                    "[NOTE] The `oauth2_permissions` block has been renamed to `oauth2_permission_scope` and moved to the `api` block. `oauth2_permissions` will be removed in version 2.0 of the AzureAD provider.",
                ),
        )
        .field(FieldSchema::single_block("optional_claims", optional_claims_block()).optional())
        .field(
            FieldSchema::set_of("owners", ScalarKind::String)
                .optional()
                .computed()
                .validation(Validation::NotEmpty),
        )
        .field(
            FieldSchema::bool("public_client")
                .optional()
                .computed()
                .conflicts_with([path(&["fallback_public_client_enabled"])])
                .deprecated(
                    "[NOTE] This legacy attribute will be renamed to `fallback_public_client_enabled` in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::set_of("reply_urls", ScalarKind::String)
                .optional()
                .computed()
                .validation(Validation::NotEmpty)
                .conflicts_with([path(&["web", "0", "redirect_uris"])])
                .deprecated(
                    "[NOTE] This attribute will be replaced by a new attribute `redirect_uris` in the `web` block in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::block_set("required_resource_access", required_resource_access_block())
                .optional(),
        )
        .field(
            FieldSchema::string("sign_in_audience")
                .optional()
                .computed()
                .validation(Validation::one_of(["AzureADMyOrg", "AzureADMultipleOrgs"]))
                .conflicts_with([path(&["available_to_other_tenants"])]),
        )
        .field(
            FieldSchema::string("type")
                .optional()
                .default_value("webapp/api")
                .validation(Validation::one_of(["webapp/api", "native"]))
                .deprecated(
                    "[NOTE] This legacy property is deprecated and will be removed in version 2.0 of the AzureAD provider",
                ),
        )
        .field(FieldSchema::single_block("web", web_block()).optional().computed())
        .field(FieldSchema::string("application_id").computed_only())
        .field(FieldSchema::string("object_id").computed_only())
        .field(
            FieldSchema::bool("prevent_duplicate_names")
                .optional()
                .default_value(false),
        )
}

fn not_empty(name: &str) -> FieldSchema {
    FieldSchema::string(name).validation(Validation::NotEmpty)
}

fn api_block() -> Block {
    let scope = Block::new()
        .field(FieldSchema::string("id").required())
        .field(not_empty("admin_consent_description").optional())
        .field(not_empty("admin_consent_display_name").optional())
        .field(FieldSchema::bool("enabled").optional())
        .field(
            FieldSchema::string("type")
                .optional()
                .default_value("User")
                .validation(Validation::one_of(["Admin", "User"])),
        )
        .field(not_empty("user_consent_description").optional())
        .field(not_empty("user_consent_display_name").optional())
        .field(
            FieldSchema::string("value")
                .optional()
                .validation(Validation::ClaimValue),
        );

    Block::new().field(FieldSchema::block_set("oauth2_permission_scope", scope).optional())
}

fn app_role_block() -> Block {
    Block::new()
        .field(FieldSchema::string("id").computed_only())
        .field(
            FieldSchema::set_of("allowed_member_types", ScalarKind::String)
                .required()
                .min_items(1)
                .validation(Validation::one_of(["Application", "User"])),
        )
        .field(not_empty("description").required())
        .field(not_empty("display_name").required())
        .field(FieldSchema::bool("enabled").optional().default_value(true))
        .field(
            FieldSchema::bool("is_enabled")
                .optional()
                .default_value(true)
                .deprecated(
                    "[NOTE] This attribute has been renamed to `enabled` and will be removed in version 2.0 of the AzureAD provider",
                ),
        )
        .field(
            FieldSchema::string("value")
                .optional()
                .computed()
                .validation(Validation::ClaimValue),
        )
}

fn oauth2_permissions_block() -> Block {
    Block::new()
        .field(FieldSchema::string("id").computed_only())
        .field(not_empty("admin_consent_description").optional().computed())
        .field(not_empty("admin_consent_display_name").optional().computed())
        .field(FieldSchema::bool("is_enabled").optional().computed())
        .field(
            FieldSchema::string("type")
                .optional()
                .computed()
                .validation(Validation::one_of(["Admin", "User"])),
        )
        .field(FieldSchema::string("user_consent_description").optional().computed())
        .field(FieldSchema::string("user_consent_display_name").optional().computed())
        .field(not_empty("value").optional().computed())
}

fn claim_block() -> Block {
    Block::new()
        .field(FieldSchema::string("name").required())
        .field(
            FieldSchema::string("source")
                .optional()
                .validation(Validation::one_of(["user"])),
        )
        .field(FieldSchema::bool("essential").optional().default_value(false))
        .field(
            FieldSchema::list_of("additional_properties", ScalarKind::String)
                .optional()
                .validation(Validation::one_of(ADDITIONAL_CLAIM_PROPERTIES)),
        )
}

fn optional_claims_block() -> Block {
    Block::new()
        .field(FieldSchema::block_list("access_token", claim_block()).optional())
        .field(FieldSchema::block_list("id_token", claim_block()).optional())
}

fn required_resource_access_block() -> Block {
    let access = Block::new()
        .field(FieldSchema::string("id").required().validation(Validation::Uuid))
        .field(
            FieldSchema::string("type")
                .required()
                .validation(Validation::one_of(["Role", "Scope"])),
        );

    Block::new()
        .field(FieldSchema::string("resource_app_id").required())
        .field(FieldSchema::block_list("resource_access", access).required())
}

fn web_block() -> Block {
    let implicit_grant = Block::new().field(
        FieldSchema::bool("access_token_issuance_enabled")
            .optional()
            .conflicts_with([path(&["oauth2_allow_implicit_flow"])]),
    );

    Block::new()
        .field(
            FieldSchema::string("homepage_url")
                .optional()
                .validation(Validation::HttpUrl)
                .conflicts_with([path(&["homepage"])]),
        )
        .field(
            FieldSchema::string("logout_url")
                .optional()
                .validation(Validation::HttpUrl)
                .conflicts_with([path(&["logout_url"])]),
        )
        .field(
            FieldSchema::set_of("redirect_uris", ScalarKind::String)
                .optional()
                .validation(Validation::NotEmpty)
                .conflicts_with([path(&["reply_urls"])]),
        )
        .field(FieldSchema::single_block("implicit_grant", implicit_grant).optional())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Cardinality, Constraint, Element, SequenceOrder, ValueKind};
    use statemig_record::Value;

    #[test]
    fn v0_declares_every_attribute() {
        let keys = schema_v0().top_level_keys();
        assert_eq!(keys.len(), 23);
        for key in ["public_client", "group_membership_claims", "web", "owners"] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn v1_replaces_public_client() {
        let v1 = schema_v1();
        assert!(!v1.declares("public_client"));
        assert!(v1.declares("fallback_public_client_enabled"));
        assert_eq!(v1.top_level_keys().len(), 22);
        assert!(v1
            .field("fallback_public_client_enabled")
            .unwrap()
            .constraints()
            .is_empty());
    }

    #[test]
    fn group_membership_claims_becomes_list() {
        let v0 = schema_v0().field("group_membership_claims").unwrap();
        let v1 = schema_v1().field("group_membership_claims").unwrap();

        assert_eq!(v0.kind(), &ValueKind::Scalar(ScalarKind::String));
        assert_eq!(
            v1.kind(),
            &ValueKind::Sequence {
                element: Element::Scalar(ScalarKind::String),
                order: SequenceOrder::Ordered,
            }
        );
        assert_eq!(v0.cardinality(), Cardinality::Optional);
        assert!(!v1.is_deprecated());
    }

    #[test]
    fn every_other_field_is_unchanged() {
        for field in schema_v1().fields() {
            if matches!(
                field.name(),
                "group_membership_claims" | "fallback_public_client_enabled"
            ) {
                continue;
            }
            assert_eq!(schema_v0().field(field.name()), Some(field), "{}", field.name());
        }
    }

    #[test]
    fn nested_constraints_resolve() {
        let path: FieldPath = "web.0.implicit_grant.0.access_token_issuance_enabled"
            .parse()
            .unwrap();
        assert_eq!(
            schema_v0().constraints_for(&path),
            &[Constraint::ConflictsWith(vec![FieldPath::single(
                "oauth2_allow_implicit_flow"
            )])]
        );
    }

    #[test]
    fn exactly_one_of_name_group() {
        let display = schema_v0().field("display_name").unwrap();
        assert_eq!(
            display.constraints(),
            &[Constraint::ExactlyOneOf(vec![
                FieldPath::single("display_name"),
                FieldPath::single("name"),
            ])]
        );
    }

    #[test]
    fn deprecations_include_nested_is_enabled() {
        let deprecated: Vec<String> = schema_v0()
            .deprecated_fields()
            .into_iter()
            .map(|(p, _)| p.to_string())
            .collect();
        assert!(deprecated.contains(&"app_role.is_enabled".to_string()));
        assert!(deprecated.contains(&"public_client".to_string()));
        assert!(!schema_v1()
            .deprecated_fields()
            .iter()
            .any(|(p, _)| p.to_string() == "public_client"));
    }

    #[test]
    fn defaults_are_declared() {
        assert_eq!(
            schema_v0().field("type").unwrap().declared_default(),
            Some(&Value::from("webapp/api"))
        );
        let scope_type: FieldPath = "api.0.oauth2_permission_scope.type".parse().unwrap();
        assert_eq!(
            schema_v0().lookup(&scope_type).unwrap().declared_default(),
            Some(&Value::from("User"))
        );
    }

    #[test]
    fn validations_are_queryable() {
        let access_id: FieldPath = "required_resource_access.0.resource_access.0.id"
            .parse()
            .unwrap();
        assert_eq!(schema_v0().lookup(&access_id).unwrap().validator(), Some(&Validation::Uuid));

        for schema in [schema_v0(), schema_v1()] {
            let claims = schema.field("group_membership_claims").unwrap().validator().unwrap();
            assert_eq!(claims.allowed_values().map(<[String]>::len), Some(5));
            assert!(claims.allowed_values().unwrap().contains(&"SecurityGroup".to_string()));
        }

        let scope_type: FieldPath = "api.0.oauth2_permission_scope.type".parse().unwrap();
        assert_eq!(
            schema_v0().lookup(&scope_type).unwrap().validator(),
            Some(&Validation::one_of(["Admin", "User"]))
        );
        assert_eq!(
            schema_v0().field("homepage").unwrap().validator(),
            Some(&Validation::HttpUrl)
        );
        assert!(schema_v0().field("public_client").unwrap().validator().is_none());
    }

    #[test]
    fn nesting_depth_is_four() {
        // root -> optional_claims -> access_token -> additional_properties
        assert_eq!(schema_v0().nesting_depth(), 4);
        assert_eq!(schema_v1().nesting_depth(), 4);
    }

    #[test]
    fn schema_for_known_versions() {
        assert_eq!(schema_for(V0).map(ResourceSchema::version), Some(V0));
        assert_eq!(schema_for(V1).map(ResourceSchema::version), Some(V1));
        assert!(schema_for(SchemaVersion::new(7)).is_none());
    }
}
