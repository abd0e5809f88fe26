//! S3-style policy model for per-access-key permissions.
//!
//! Policies are ordered lists of statements. Evaluation is allow-only: the
//! first `Allow` statement matching both action and resource grants access,
//! and `Deny` statements are parsed and stored but never consulted by
//! [`S3Policy::authorizes`]. Existing stored policies depend on this exact
//! behavior, so it must not be "fixed" without a policy migration.

use crate::models::Permissions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const POLICY_VERSION: &str = "2012-10-17";

/// S3 API action names understood by the policy engine.
///
/// Statements carry actions as plain strings: a policy may reference an
/// action outside this list and the validator deliberately leaves it alone.
pub struct S3Action;

impl S3Action {
    // Object-level
    pub const GET_OBJECT: &'static str = "s3:GetObject";
    pub const PUT_OBJECT: &'static str = "s3:PutObject";
    pub const DELETE_OBJECT: &'static str = "s3:DeleteObject";
    pub const GET_OBJECT_ACL: &'static str = "s3:GetObjectAcl";
    pub const PUT_OBJECT_ACL: &'static str = "s3:PutObjectAcl";
    pub const GET_OBJECT_VERSION: &'static str = "s3:GetObjectVersion";
    pub const DELETE_OBJECT_VERSION: &'static str = "s3:DeleteObjectVersion";

    // Object locking
    pub const PUT_OBJECT_LEGAL_HOLD: &'static str = "s3:PutObjectLegalHold";
    pub const GET_OBJECT_LEGAL_HOLD: &'static str = "s3:GetObjectLegalHold";
    pub const PUT_OBJECT_RETENTION: &'static str = "s3:PutObjectRetention";
    pub const GET_OBJECT_RETENTION: &'static str = "s3:GetObjectRetention";
    pub const BYPASS_GOVERNANCE_RETENTION: &'static str = "s3:BypassGovernanceRetention";

    // Multipart uploads
    pub const ABORT_MULTIPART_UPLOAD: &'static str = "s3:AbortMultipartUpload";
    pub const LIST_MULTIPART_UPLOAD_PARTS: &'static str = "s3:ListMultipartUploadParts";

    // Bucket-level
    pub const LIST_BUCKET: &'static str = "s3:ListBucket";
    pub const LIST_BUCKET_VERSIONS: &'static str = "s3:ListBucketVersions";
    pub const GET_BUCKET_LOCATION: &'static str = "s3:GetBucketLocation";
    pub const GET_BUCKET_ACL: &'static str = "s3:GetBucketAcl";
    pub const PUT_BUCKET_ACL: &'static str = "s3:PutBucketAcl";
    pub const GET_BUCKET_POLICY: &'static str = "s3:GetBucketPolicy";
    pub const PUT_BUCKET_POLICY: &'static str = "s3:PutBucketPolicy";
    pub const DELETE_BUCKET_POLICY: &'static str = "s3:DeleteBucketPolicy";
    pub const GET_BUCKET_VERSIONING: &'static str = "s3:GetBucketVersioning";
    pub const PUT_BUCKET_VERSIONING: &'static str = "s3:PutBucketVersioning";
    pub const GET_BUCKET_OBJECT_LOCK_CONFIGURATION: &'static str =
        "s3:GetBucketObjectLockConfiguration";
    pub const PUT_BUCKET_OBJECT_LOCK_CONFIGURATION: &'static str =
        "s3:PutBucketObjectLockConfiguration";

    // Bucket management
    pub const CREATE_BUCKET: &'static str = "s3:CreateBucket";
    pub const DELETE_BUCKET: &'static str = "s3:DeleteBucket";

    // Listing
    pub const LIST_ALL_MY_BUCKETS: &'static str = "s3:ListAllMyBuckets";
    pub const LIST_BUCKET_MULTIPART_UPLOADS: &'static str = "s3:ListBucketMultipartUploads";

    /// Matches every action.
    pub const WILDCARD: &'static str = "s3:*";
}

/// Statement effect strings. Kept open on decode so the validator can
/// report bad effects instead of failing at the JSON layer.
pub struct S3Effect;

impl S3Effect {
    pub const ALLOW: &'static str = "Allow";
    pub const DENY: &'static str = "Deny";
}

/// Condition block. Structurally validated JSON; carries no runtime effect
/// in v1 and is never consulted during evaluation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Condition {
    #[serde(rename = "StringEquals", default, skip_serializing_if = "Option::is_none")]
    pub string_equals: Option<HashMap<String, Value>>,
    #[serde(rename = "StringNotEquals", default, skip_serializing_if = "Option::is_none")]
    pub string_not_equals: Option<HashMap<String, Value>>,
    #[serde(rename = "StringLike", default, skip_serializing_if = "Option::is_none")]
    pub string_like: Option<HashMap<String, Value>>,
    #[serde(rename = "StringNotLike", default, skip_serializing_if = "Option::is_none")]
    pub string_not_like: Option<HashMap<String, Value>>,
    #[serde(rename = "IpAddress", default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<HashMap<String, Value>>,
    #[serde(rename = "NotIpAddress", default, skip_serializing_if = "Option::is_none")]
    pub not_ip_address: Option<HashMap<String, Value>>,
    #[serde(rename = "DateGreaterThan", default, skip_serializing_if = "Option::is_none")]
    pub date_greater_than: Option<HashMap<String, Value>>,
    #[serde(rename = "DateLessThan", default, skip_serializing_if = "Option::is_none")]
    pub date_less_than: Option<HashMap<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Statement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub effect: String,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<S3Condition>,
}

/// Complete S3 IAM-style policy. Fields default so that partially-formed
/// user input decodes and reaches the validator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Policy {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub statements: Vec<S3Statement>,
}

impl S3Policy {
    /// Whether this policy authorizes `action` on `resource`.
    ///
    /// Statements are scanned in declaration order and the first matching
    /// `Allow` wins. A matching `Deny` statement does not block evaluation
    /// of later statements, and there is no explicit-deny override.
    pub fn authorizes(&self, action: &str, resource: &str) -> bool {
        for statement in &self.statements {
            let action_matches = statement
                .actions
                .iter()
                .any(|a| a == action || a == S3Action::WILDCARD);
            if !action_matches {
                continue;
            }

            let resource_matches = statement
                .resources
                .iter()
                .any(|pattern| match_resource(pattern, resource));
            if !resource_matches {
                continue;
            }

            if statement.effect == S3Effect::ALLOW {
                return true;
            }
        }
        false
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}

/// Resource patterns match exactly or via the lone wildcard `"*"`. There is
/// no prefix or hierarchical matching; widening this would silently change
/// the meaning of stored policies.
fn match_resource(pattern: &str, resource: &str) -> bool {
    pattern == "*" || pattern == resource
}

fn allow_statement(actions: &[&str]) -> S3Statement {
    S3Statement {
        id: None,
        effect: S3Effect::ALLOW.to_string(),
        actions: actions.iter().map(|a| a.to_string()).collect(),
        resources: vec!["*".to_string()],
        condition: None,
    }
}

/// Built-in policy templates. Built fresh on every call so callers always
/// get an owned copy that cannot alias another caller's.
pub fn preset_policies() -> HashMap<String, S3Policy> {
    let mut presets = HashMap::new();

    presets.insert(
        "ReadOnly".to_string(),
        S3Policy {
            version: POLICY_VERSION.to_string(),
            id: Some("ReadOnlyPolicy".to_string()),
            statements: vec![allow_statement(&[
                S3Action::GET_OBJECT,
                S3Action::LIST_BUCKET,
                S3Action::GET_BUCKET_LOCATION,
            ])],
        },
    );

    presets.insert(
        "ReadWrite".to_string(),
        S3Policy {
            version: POLICY_VERSION.to_string(),
            id: Some("ReadWritePolicy".to_string()),
            statements: vec![allow_statement(&[
                S3Action::GET_OBJECT,
                S3Action::PUT_OBJECT,
                S3Action::DELETE_OBJECT,
                S3Action::LIST_BUCKET,
                S3Action::GET_BUCKET_LOCATION,
                S3Action::ABORT_MULTIPART_UPLOAD,
                S3Action::LIST_MULTIPART_UPLOAD_PARTS,
            ])],
        },
    );

    presets.insert(
        "FullAccess".to_string(),
        S3Policy {
            version: POLICY_VERSION.to_string(),
            id: Some("FullAccessPolicy".to_string()),
            statements: vec![allow_statement(&[S3Action::WILDCARD])],
        },
    );

    presets.insert(
        "ObjectLockManager".to_string(),
        S3Policy {
            version: POLICY_VERSION.to_string(),
            id: Some("ObjectLockManagerPolicy".to_string()),
            statements: vec![allow_statement(&[
                S3Action::GET_OBJECT,
                S3Action::PUT_OBJECT,
                S3Action::GET_OBJECT_RETENTION,
                S3Action::PUT_OBJECT_RETENTION,
                S3Action::GET_OBJECT_LEGAL_HOLD,
                S3Action::PUT_OBJECT_LEGAL_HOLD,
                S3Action::LIST_BUCKET,
                S3Action::GET_BUCKET_OBJECT_LOCK_CONFIGURATION,
                S3Action::PUT_BUCKET_OBJECT_LOCK_CONFIGURATION,
            ])],
        },
    );

    presets
}

/// Look up a single preset by name. `None` for unknown names; callers map
/// that to a 404 rather than substituting a default policy.
pub fn preset_policy(name: &str) -> Option<S3Policy> {
    preset_policies().remove(name)
}

pub fn preset_description(name: &str) -> &'static str {
    match name {
        "ReadOnly" => "Allows read-only access to objects and bucket listing",
        "ReadWrite" => "Allows read and write access to objects, including uploads and deletions",
        "FullAccess" => "Grants full administrative access to all S3 operations",
        "ObjectLockManager" => "Allows managing object retention and legal holds for compliance",
        _ => "Custom policy",
    }
}

/// Expand a legacy read/write/owner triple into a policy. The result is a
/// single Allow statement over every resource.
pub fn legacy_to_policy(legacy: &Permissions) -> S3Policy {
    let mut actions = Vec::new();

    if legacy.read {
        actions.extend(
            [
                S3Action::GET_OBJECT,
                S3Action::LIST_BUCKET,
                S3Action::GET_BUCKET_LOCATION,
            ]
            .map(str::to_string),
        );
    }

    if legacy.write {
        actions.extend(
            [
                S3Action::PUT_OBJECT,
                S3Action::DELETE_OBJECT,
                S3Action::ABORT_MULTIPART_UPLOAD,
                S3Action::LIST_MULTIPART_UPLOAD_PARTS,
            ]
            .map(str::to_string),
        );
    }

    if legacy.owner {
        actions.extend(
            [
                S3Action::GET_BUCKET_ACL,
                S3Action::PUT_BUCKET_ACL,
                S3Action::GET_BUCKET_POLICY,
                S3Action::PUT_BUCKET_POLICY,
                S3Action::DELETE_BUCKET_POLICY,
            ]
            .map(str::to_string),
        );
    }

    S3Policy {
        version: POLICY_VERSION.to_string(),
        id: Some("ConvertedLegacyPolicy".to_string()),
        statements: vec![S3Statement {
            id: None,
            effect: S3Effect::ALLOW.to_string(),
            actions,
            resources: vec!["*".to_string()],
            condition: None,
        }],
    }
}

/// Collapse a policy onto the legacy triple. Lossy: arbitrary policies fold
/// down to three booleans, so converting back does not reproduce the input.
/// Only Allow statements are considered.
pub fn policy_to_legacy(policy: &S3Policy) -> Permissions {
    let mut permissions = Permissions::default();

    for statement in &policy.statements {
        if statement.effect != S3Effect::ALLOW {
            continue;
        }

        for action in &statement.actions {
            match action.as_str() {
                S3Action::GET_OBJECT | S3Action::LIST_BUCKET | S3Action::GET_BUCKET_LOCATION => {
                    permissions.read = true
                }
                S3Action::PUT_OBJECT | S3Action::DELETE_OBJECT => permissions.write = true,
                S3Action::GET_BUCKET_ACL | S3Action::PUT_BUCKET_ACL | S3Action::WILDCARD => {
                    permissions.owner = true
                }
                _ => {}
            }
        }
    }

    permissions
}

/// Structural validation. Every violated check is reported, none
/// short-circuits, and a policy is valid iff the returned list is empty.
/// Action names are not checked against the known action list.
pub fn validate_policy(policy: &S3Policy) -> Vec<String> {
    let mut errors = Vec::new();

    if policy.version.is_empty() {
        errors.push("Policy version is required".to_string());
    }

    if policy.statements.is_empty() {
        errors.push("Policy must contain at least one statement".to_string());
    }

    for (i, statement) in policy.statements.iter().enumerate() {
        if statement.effect != S3Effect::ALLOW && statement.effect != S3Effect::DENY {
            errors.push(format!("Statement {}: Effect must be 'Allow' or 'Deny'", i));
        }
        if statement.actions.is_empty() {
            errors.push(format!("Statement {}: Must contain at least one action", i));
        }
        if statement.resources.is_empty() {
            errors.push(format!("Statement {}: Must contain at least one resource", i));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(effect: &str, actions: &[&str], resources: &[&str]) -> S3Statement {
        S3Statement {
            id: None,
            effect: effect.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
            condition: None,
        }
    }

    fn policy_of(statements: Vec<S3Statement>) -> S3Policy {
        S3Policy {
            version: POLICY_VERSION.to_string(),
            id: None,
            statements,
        }
    }

    #[test]
    fn allow_statement_grants_matching_action() {
        let policy = policy_of(vec![statement(
            S3Effect::ALLOW,
            &[S3Action::GET_OBJECT],
            &["*"],
        )]);

        assert!(policy.authorizes(S3Action::GET_OBJECT, "bucket/key"));
        assert!(!policy.authorizes(S3Action::PUT_OBJECT, "bucket/key"));
    }

    #[test]
    fn wildcard_action_matches_everything() {
        let policy = policy_of(vec![statement(S3Effect::ALLOW, &[S3Action::WILDCARD], &["*"])]);

        assert!(policy.authorizes(S3Action::DELETE_BUCKET, "any"));
        assert!(policy.authorizes("s3:SomethingNew", "any"));
    }

    #[test]
    fn resource_matching_is_exact_or_wildcard_only() {
        let policy = policy_of(vec![statement(
            S3Effect::ALLOW,
            &[S3Action::GET_OBJECT],
            &["bucket-a"],
        )]);

        assert!(policy.authorizes(S3Action::GET_OBJECT, "bucket-a"));
        assert!(!policy.authorizes(S3Action::GET_OBJECT, "bucket-a/key"));
        assert!(!policy.authorizes(S3Action::GET_OBJECT, "bucket"));

        // A trailing star is not a prefix pattern, only the lone "*" is special.
        let prefixed = policy_of(vec![statement(
            S3Effect::ALLOW,
            &[S3Action::GET_OBJECT],
            &["bucket-a/*"],
        )]);
        assert!(!prefixed.authorizes(S3Action::GET_OBJECT, "bucket-a/key"));
        assert!(prefixed.authorizes(S3Action::GET_OBJECT, "bucket-a/*"));
    }

    #[test]
    fn pure_deny_policy_never_authorizes() {
        let policy = policy_of(vec![statement(
            S3Effect::DENY,
            &[S3Action::GET_OBJECT],
            &["*"],
        )]);

        assert!(!policy.authorizes(S3Action::GET_OBJECT, "bucket/key"));
    }

    #[test]
    fn deny_statements_do_not_override_later_allows() {
        // Deny listed first and matching; the evaluator still reaches the
        // Allow below it. Intentional v1 behavior.
        let policy = policy_of(vec![
            statement(S3Effect::DENY, &[S3Action::GET_OBJECT], &["*"]),
            statement(S3Effect::ALLOW, &[S3Action::GET_OBJECT], &["*"]),
        ]);

        assert!(policy.authorizes(S3Action::GET_OBJECT, "bucket/key"));
    }

    #[test]
    fn first_matching_allow_wins() {
        let policy = policy_of(vec![
            statement(S3Effect::ALLOW, &[S3Action::GET_OBJECT], &["bucket-a"]),
            statement(S3Effect::ALLOW, &[S3Action::GET_OBJECT], &["bucket-b"]),
        ]);

        assert!(policy.authorizes(S3Action::GET_OBJECT, "bucket-a"));
        assert!(policy.authorizes(S3Action::GET_OBJECT, "bucket-b"));
        assert!(!policy.authorizes(S3Action::GET_OBJECT, "bucket-c"));
    }

    #[test]
    fn statements_with_unknown_effect_never_match() {
        let policy = policy_of(vec![statement("Maybe", &[S3Action::GET_OBJECT], &["*"])]);
        assert!(!policy.authorizes(S3Action::GET_OBJECT, "x"));
    }

    #[test]
    fn legacy_round_trip_is_identity() {
        for read in [false, true] {
            for write in [false, true] {
                for owner in [false, true] {
                    let legacy = Permissions { read, write, owner };
                    assert_eq!(policy_to_legacy(&legacy_to_policy(&legacy)), legacy);
                }
            }
        }
    }

    #[test]
    fn legacy_read_expands_to_read_actions() {
        let policy = legacy_to_policy(&Permissions {
            read: true,
            write: false,
            owner: false,
        });

        assert_eq!(policy.statements.len(), 1);
        assert_eq!(
            policy.statements[0].actions,
            vec![
                S3Action::GET_OBJECT,
                S3Action::LIST_BUCKET,
                S3Action::GET_BUCKET_LOCATION,
            ]
        );
        assert_eq!(policy.statements[0].resources, vec!["*"]);
    }

    #[test]
    fn policy_to_legacy_is_lossy() {
        // GetObject alone sets read; converting back adds ListBucket and
        // GetBucketLocation, so the policy side does not round trip.
        let policy = policy_of(vec![statement(
            S3Effect::ALLOW,
            &[S3Action::GET_OBJECT],
            &["*"],
        )]);

        let legacy = policy_to_legacy(&policy);
        assert!(legacy.read && !legacy.write && !legacy.owner);

        let back = legacy_to_policy(&legacy);
        assert_ne!(back.statements[0].actions, policy.statements[0].actions);
    }

    #[test]
    fn wildcard_action_implies_owner() {
        let policy = policy_of(vec![statement(S3Effect::ALLOW, &[S3Action::WILDCARD], &["*"])]);
        let legacy = policy_to_legacy(&policy);
        assert!(legacy.owner);
        assert!(!legacy.read);
    }

    #[test]
    fn deny_statements_do_not_contribute_legacy_permissions() {
        let policy = policy_of(vec![statement(
            S3Effect::DENY,
            &[S3Action::GET_OBJECT, S3Action::PUT_OBJECT],
            &["*"],
        )]);

        assert_eq!(policy_to_legacy(&policy), Permissions::default());
    }

    #[test]
    fn preset_lookup_is_stable_and_owned() {
        let first = preset_policy("ReadOnly").unwrap();
        let second = preset_policy("ReadOnly").unwrap();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        assert_eq!(first.version, POLICY_VERSION);
        assert_eq!(first.statements[0].actions.len(), 3);
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(preset_policy("DoesNotExist").is_none());
    }

    #[test]
    fn presets_cover_the_four_templates() {
        let presets = preset_policies();
        for name in ["ReadOnly", "ReadWrite", "FullAccess", "ObjectLockManager"] {
            assert!(presets.contains_key(name), "missing preset {}", name);
            assert!(validate_policy(&presets[name]).is_empty());
        }
    }

    #[test]
    fn empty_policy_reports_version_and_statements() {
        let policy: S3Policy = serde_json::from_str("{}").unwrap();
        let errors = validate_policy(&policy);

        assert!(errors.contains(&"Policy version is required".to_string()));
        assert!(errors.contains(&"Policy must contain at least one statement".to_string()));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn validator_reports_every_statement_violation_independently() {
        let policy = policy_of(vec![
            statement("Never", &[], &[]),
            statement(S3Effect::ALLOW, &[S3Action::GET_OBJECT], &["*"]),
        ]);

        let errors = validate_policy(&policy);
        assert_eq!(
            errors,
            vec![
                "Statement 0: Effect must be 'Allow' or 'Deny'",
                "Statement 0: Must contain at least one action",
                "Statement 0: Must contain at least one resource",
            ]
        );
    }

    #[test]
    fn validator_accepts_unknown_action_names() {
        let policy = policy_of(vec![statement(
            S3Effect::ALLOW,
            &["s3:TotallyMadeUp"],
            &["*"],
        )]);

        assert!(validate_policy(&policy).is_empty());
    }

    #[test]
    fn well_formed_policy_passes() {
        let policy = policy_of(vec![statement(
            S3Effect::DENY,
            &[S3Action::PUT_OBJECT],
            &["bucket-a"],
        )]);

        assert!(validate_policy(&policy).is_empty());
    }

    #[test]
    fn condition_blocks_parse_but_do_not_affect_evaluation() {
        let json = r#"{
            "version": "2012-10-17",
            "statements": [{
                "effect": "Allow",
                "actions": ["s3:GetObject"],
                "resources": ["*"],
                "condition": {"IpAddress": {"aws:SourceIp": "10.0.0.0/8"}}
            }]
        }"#;

        let policy = S3Policy::from_json(json).unwrap();
        assert!(policy.statements[0].condition.is_some());
        // No condition evaluation in v1: the statement applies regardless.
        assert!(policy.authorizes(S3Action::GET_OBJECT, "anything"));
    }
}
