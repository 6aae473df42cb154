//! `azuread_application` state upgrades
//!
//! v0 → v1:
//! 1. `group_membership_claims` goes from a single string to a list
//! 2. `public_client` is renamed to `fallback_public_client_enabled`; an
//!    explicit new value wins over the legacy one
//! 3. `public_client` is removed whichever branch step 2 took

use once_cell::sync::Lazy;
use statemig_record::RawRecord;
use statemig_schema::resources::application::{TYPE_NAME, V0, V1};

use crate::error::MigrationError;
use crate::rule::{FieldTransformRule, Presence};
use crate::transition::StateTransition;
use crate::upgrader::StateUpgrader;

pub const GROUP_MEMBERSHIP_CLAIMS: &str = "group_membership_claims";
pub const PUBLIC_CLIENT: &str = "public_client";
pub const FALLBACK_PUBLIC_CLIENT_ENABLED: &str = "fallback_public_client_enabled";

static TRANSITION_V0: Lazy<StateTransition> = Lazy::new(|| {
    StateTransition::new(
        V0,
        vec![
            FieldTransformRule::wrap_in_sequence(GROUP_MEMBERSHIP_CLAIMS, Presence::Optional),
            FieldTransformRule::conditional_copy(
                PUBLIC_CLIENT,
                FALLBACK_PUBLIC_CLIENT_ENABLED,
                Presence::Optional,
            ),
            FieldTransformRule::delete(PUBLIC_CLIENT),
        ],
    )
    .with_description("wrap group_membership_claims; public_client -> fallback_public_client_enabled")
});

/// The v0 → v1 transition
#[inline]
#[must_use]
pub fn transition_v0_to_v1() -> &'static StateTransition {
    &TRANSITION_V0
}

/// Upgrade a v0 record to v1
///
/// # Errors
/// Never fails for the shipped table, since every rule is `Optional`; the
/// signature matches [`StateTransition::upgrade`].
#[inline]
pub fn upgrade_v0(record: &RawRecord) -> Result<RawRecord, MigrationError> {
    TRANSITION_V0.upgrade(record)
}

/// Registry covering every known application version
#[must_use]
pub fn upgrader() -> StateUpgrader {
    StateUpgrader::from_table(TYPE_NAME, V1, [(*TRANSITION_V0).clone()])
}
