//! Per-request authorization decisions.
//!
//! Two enforcement paths sit in front of every administrative handler:
//! a coarse role check ([`require_permission`]) used by the CRUD surface,
//! and a fine-grained S3 action check ([`require_s3_action`]) used by the
//! object-locking surface. Both decide before any handler logic runs and
//! never mutate state.

use crate::error::{Error, Result};
use crate::models::{KeyElement, Permission, Role, User};
use crate::policy::{self, S3Action, S3Policy};

/// Authenticated operator, attached to the request by the session
/// middleware once the session and account have been verified.
#[derive(Clone)]
pub struct Identity(pub User);

/// Coarse path: the identity's role must grant `permission`.
pub fn require_permission(user: &User, permission: Permission) -> Result<()> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}

/// Effective policy of an access key: its explicit S3 policy when set,
/// otherwise the bridged form of its legacy read/write/owner triple.
pub fn key_policy(key: &KeyElement) -> S3Policy {
    match &key.s3_policy {
        Some(policy) => policy.clone(),
        None => policy::legacy_to_policy(&key.permissions),
    }
}

/// Fine-grained actions that mutate object-lock state. These pass for the
/// admin role regardless of key policy content.
const WRITE_ACTIONS: &[&str] = &[
    S3Action::PUT_OBJECT_RETENTION,
    S3Action::PUT_OBJECT_LEGAL_HOLD,
    S3Action::PUT_BUCKET_OBJECT_LOCK_CONFIGURATION,
];

pub fn is_write_action(action: &str) -> bool {
    WRITE_ACTIONS.contains(&action)
}

/// Fine-grained path: `action` on `resource` must be authorized by the
/// policy of at least one access key attached to the target bucket, except
/// that write-class actions always pass for admins.
pub fn require_s3_action(
    user: &User,
    keys: &[KeyElement],
    action: &str,
    resource: &str,
) -> Result<()> {
    if is_write_action(action) && user.role == Role::Admin {
        return Ok(());
    }

    if keys
        .iter()
        .any(|key| key_policy(key).authorizes(action, resource))
    {
        Ok(())
    } else {
        Err(Error::Forbidden)
    }
}
