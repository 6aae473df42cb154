//! statemig command implementations
//!
//! The binary parses arguments and prints; everything it does to records
//! lives here so it can be driven from tests.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value as JsonValue;
use statemig_core::resources::application;
use statemig_core::{ConfigFormat, MigratorConfig, VersionedRecord};
use statemig_record::{RawRecord, RecordDigest};
use statemig_schema::resources::application::schema_for;
use statemig_schema::{Block, ResourceSchema, SchemaVersion};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse stored state
///
/// Accepts a `{"schema_version", "attributes"}` envelope or a bare
/// attribute object. A bare object needs `from`; with an envelope, `from`
/// must agree with the stored version when given.
///
/// # Errors
/// Fails on malformed JSON, a non-object document, a bare object without
/// `from`, or a version mismatch.
pub fn parse_input(text: &str, from: Option<SchemaVersion>) -> Result<VersionedRecord> {
    let json: JsonValue = serde_json::from_str(text).context("input is not valid JSON")?;

    let is_envelope = json
        .as_object()
        .is_some_and(|map| map.contains_key("schema_version") && map.contains_key("attributes"));

    if is_envelope {
        let record: VersionedRecord =
            serde_json::from_value(json).context("malformed state envelope")?;
        if let Some(from) = from {
            if from != record.schema_version {
                bail!(
                    "--from {} disagrees with stored schema_version {}",
                    from,
                    record.schema_version
                );
            }
        }
        return Ok(record);
    }

    let Some(from) = from else {
        bail!("input has no schema_version; pass --from");
    };
    let attributes = RawRecord::try_from(json).context("input must be a JSON object")?;
    Ok(VersionedRecord::new(from, attributes))
}

/// Read and parse a state file
///
/// # Errors
/// Fails if the file cannot be read or [`parse_input`] fails.
pub fn read_input(path: &Path, from: Option<SchemaVersion>) -> Result<VersionedRecord> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_input(&text, from).with_context(|| format!("failed to parse {}", path.display()))
}

/// Load migrator configuration; the format follows the file extension
///
/// # Errors
/// Fails on unreadable files, unknown extensions or invalid content.
pub fn load_config(path: &Path) -> Result<MigratorConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let format = ConfigFormat::from_extension(extension)
        .with_context(|| format!("cannot load config {}", path.display()))?;
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    MigratorConfig::parse(&text, format)
        .with_context(|| format!("invalid config {}", path.display()))
}

/// Upgrade an application record
///
/// `to` overrides the configured target version.
///
/// # Errors
/// Fails with the upgrader's error, wrapped with the stored version.
pub fn upgrade(
    record: &VersionedRecord,
    mut config: MigratorConfig,
    to: Option<SchemaVersion>,
) -> Result<VersionedRecord> {
    if let Some(to) = to {
        config = config.with_target_version(to);
    }
    let upgrader = application::upgrader().with_config(config);

    let before = RecordDigest::of(&record.attributes);
    let upgraded = upgrader
        .upgrade(record)
        .with_context(|| format!("cannot upgrade state stored at {}", record.schema_version))?;
    let after = RecordDigest::of(&upgraded.attributes);

    tracing::info!(
        "{} {} [{}] -> {} [{}]",
        upgrader.type_name(),
        record.schema_version,
        before.short(),
        upgraded.schema_version,
        after.short()
    );
    Ok(upgraded)
}

/// Serialize an envelope
///
/// # Errors
/// Fails only if serialization fails.
pub fn render(record: &VersionedRecord, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(record)?
    } else {
        serde_json::to_string_pretty(record)?
    };
    Ok(text)
}

/// Application descriptor at `version`
///
/// # Errors
/// Fails for versions with no descriptor.
pub fn schema(version: SchemaVersion) -> Result<&'static ResourceSchema> {
    match schema_for(version) {
        Some(schema) => Ok(schema),
        None => bail!("no {} descriptor for {}", application_type(), version),
    }
}

/// Human-readable or JSON rendering of a descriptor
///
/// # Errors
/// Fails for unknown versions.
pub fn describe(version: SchemaVersion, json: bool) -> Result<String> {
    let schema = schema(version)?;
    if json {
        return Ok(serde_json::to_string_pretty(schema)?);
    }

    let mut out = String::new();
    writeln!(
        out,
        "{} {} ({} fields, depth {})",
        schema.type_name(),
        schema.version(),
        schema.block().len(),
        schema.nesting_depth()
    )?;
    write_block(&mut out, schema.block(), 1)?;

    let deprecated = schema.deprecated_fields();
    if !deprecated.is_empty() {
        writeln!(out, "\ndeprecated:")?;
        for (path, message) in deprecated {
            writeln!(out, "  {path}: {message}")?;
        }
    }
    Ok(out)
}

fn write_block(out: &mut String, block: &Block, level: usize) -> std::fmt::Result {
    let indent = "  ".repeat(level);
    for field in block.fields() {
        write!(
            out,
            "{indent}{}: {} ({})",
            field.name(),
            field.kind().describe(),
            field.cardinality()
        )?;
        if let Some(default) = field.declared_default() {
            write!(out, " default={}", serde_json::Value::from(default.clone()))?;
        }
        if field.is_deprecated() {
            out.push_str(" deprecated");
        }
        out.push('\n');
        if let Some(validation) = field.validator() {
            writeln!(out, "{indent}  - validates {validation}")?;
        }
        for constraint in field.constraints() {
            writeln!(out, "{indent}  - {constraint}")?;
        }
        if let Some(nested) = field.kind().block() {
            write_block(out, nested, level + 1)?;
        }
    }
    Ok(())
}

/// Top-level keys of `record` unknown to the descriptor at `version`
///
/// # Errors
/// Fails for versions with no descriptor.
pub fn check(record: &RawRecord, version: SchemaVersion) -> Result<Vec<String>> {
    Ok(schema(version)?.unknown_keys(record))
}

fn application_type() -> &'static str {
    statemig_schema::resources::application::TYPE_NAME
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_requires_from() {
        let err = parse_input(r#"{"public_client": true}"#, None).unwrap_err();
        assert!(err.to_string().contains("--from"));

        let record = parse_input(r#"{"public_client": true}"#, Some(SchemaVersion::new(0))).unwrap();
        assert_eq!(record.schema_version, SchemaVersion::new(0));
    }

    #[test]
    fn envelope_version_must_match_from() {
        let text = r#"{"schema_version": 1, "attributes": {}}"#;
        assert!(parse_input(text, None).is_ok());
        assert!(parse_input(text, Some(SchemaVersion::new(1))).is_ok());
        assert!(parse_input(text, Some(SchemaVersion::new(0))).is_err());
    }

    #[test]
    fn non_object_rejected() {
        assert!(parse_input("[1, 2]", Some(SchemaVersion::new(0))).is_err());
        assert!(parse_input("{", Some(SchemaVersion::new(0))).is_err());
    }

    #[test]
    fn describe_lists_fields_and_deprecations() {
        let text = describe(SchemaVersion::new(0), false).unwrap();
        assert!(text.starts_with("azuread_application v0 (23 fields, depth 4)"));
        assert!(text.contains("group_membership_claims: string (optional) deprecated"));
        assert!(text.contains("  - conflicts with [fallback_public_client_enabled]"));
        assert!(text.contains("\ndeprecated:\n"));

        let json: serde_json::Value =
            serde_json::from_str(&describe(SchemaVersion::new(1), true).unwrap()).unwrap();
        assert_eq!(json["type_name"], "azuread_application");
        assert_eq!(json["version"], 1);
    }

    #[test]
    fn describe_shows_declared_validations() {
        let text = describe(SchemaVersion::new(0), false).unwrap();
        assert!(text.contains(
            "group_membership_claims: string (optional) deprecated\n    - validates one of [All, None, ApplicationGroup, DirectoryRole, SecurityGroup]\n"
        ));
        assert!(text.contains("      id: string (required)\n        - validates uuid\n"));

        let json: serde_json::Value =
            serde_json::from_str(&describe(SchemaVersion::new(1), true).unwrap()).unwrap();
        assert_eq!(
            json["block"]["group_membership_claims"]["validation"]["one_of"][0],
            "All"
        );
    }

    #[test]
    fn unknown_version_rejected() {
        assert!(describe(SchemaVersion::new(7), false).is_err());
    }
}
