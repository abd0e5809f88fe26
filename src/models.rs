use crate::policy::S3Policy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operator role. Stored as a plain string so that records written by a
/// newer build with extra roles still load; anything outside the four known
/// roles carries no permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    User,
    ReadOnly,
    TenantAdmin,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Role::Admin,
            "user" => Role::User,
            "readonly" => Role::ReadOnly,
            "tenant_admin" => Role::TenantAdmin,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => "admin".to_string(),
            Role::User => "user".to_string(),
            Role::ReadOnly => "readonly".to_string(),
            Role::TenantAdmin => "tenant_admin".to_string(),
            Role::Other(value) => value,
        }
    }
}

/// Coarse administrative capability gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ReadBuckets,
    WriteBuckets,
    DeleteBuckets,
    ReadKeys,
    WriteKeys,
    DeleteKeys,
    ReadCluster,
    WriteCluster,
    ReadUsers,
    WriteUsers,
    DeleteUsers,
    ReadTenants,
    WriteTenants,
    DeleteTenants,
    SystemAdmin,
}

/// Permission set for a role. Total over every `Role` value; unknown roles
/// get the empty set.
pub fn permissions_for(role: &Role) -> &'static [Permission] {
    match role {
        Role::Admin => &[
            Permission::SystemAdmin,
            Permission::ReadBuckets,
            Permission::WriteBuckets,
            Permission::DeleteBuckets,
            Permission::ReadKeys,
            Permission::WriteKeys,
            Permission::DeleteKeys,
            Permission::ReadCluster,
            Permission::WriteCluster,
            Permission::ReadUsers,
            Permission::WriteUsers,
            Permission::DeleteUsers,
            Permission::ReadTenants,
            Permission::WriteTenants,
            Permission::DeleteTenants,
        ],
        Role::TenantAdmin => &[
            Permission::ReadBuckets,
            Permission::WriteBuckets,
            Permission::DeleteBuckets,
            Permission::ReadKeys,
            Permission::WriteKeys,
            Permission::DeleteKeys,
            Permission::ReadUsers,
            Permission::WriteUsers,
            Permission::DeleteUsers,
        ],
        Role::User => &[
            Permission::ReadBuckets,
            Permission::WriteBuckets,
            Permission::ReadKeys,
            Permission::WriteKeys,
        ],
        Role::ReadOnly => &[
            Permission::ReadBuckets,
            Permission::ReadKeys,
            Permission::ReadCluster,
        ],
        Role::Other(_) => &[],
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub tenant_id: Option<String>,
    pub enabled: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        permissions_for(&self.role).contains(&permission)
    }
}

/// User as exposed by the API; never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub tenant_id: Option<String>,
    pub enabled: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            tenant_id: user.tenant_id.clone(),
            enabled: user.enabled,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub max_buckets: i64,
    pub max_keys: i64,
    #[serde(default)]
    pub quota_bytes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub tenant_id: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTenantRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub max_buckets: i64,
    #[serde(default)]
    pub max_keys: i64,
    #[serde(default)]
    pub quota_bytes: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub max_buckets: Option<i64>,
    pub max_keys: Option<i64>,
    pub quota_bytes: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AuthStatusResponse {
    pub enabled: bool,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

/// Legacy per-key permission triple predating S3 policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub read: bool,
    pub write: bool,
    pub owner: bool,
}

// Wire types for bucket metadata returned by the coordinator admin API.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    #[serde(default)]
    pub global_aliases: Vec<String>,
    #[serde(default)]
    pub local_aliases: Vec<LocalAlias>,
    #[serde(default)]
    pub website_access: bool,
    #[serde(default)]
    pub keys: Vec<KeyElement>,
    #[serde(default)]
    pub objects: i64,
    #[serde(default)]
    pub bytes: i64,
    #[serde(default)]
    pub unfinished_uploads: i64,
    #[serde(default)]
    pub quotas: Quotas,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_lock_configuration: Option<ObjectLockConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_tenant_id: Option<String>,
    #[serde(default)]
    pub created: String,
}

impl Bucket {
    /// Best display name: first global alias, else first local alias, else id.
    pub fn display_name(&self) -> &str {
        if let Some(alias) = self.global_aliases.first() {
            return alias;
        }
        if let Some(alias) = self.local_aliases.first() {
            return &alias.alias;
        }
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAlias {
    pub access_key_id: String,
    pub alias: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyElement {
    pub access_key_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_policy: Option<S3Policy>,
    #[serde(default)]
    pub bucket_local_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotas {
    #[serde(default)]
    pub max_size: Option<i64>,
    #[serde(default)]
    pub max_objects: Option<i64>,
}

// Object locking configuration.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectLockConfiguration {
    pub object_lock_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<ObjectLockRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectLockRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_retention: Option<DefaultRetention>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultRetention {
    pub mode: RetentionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetentionMode {
    #[serde(rename = "COMPLIANCE")]
    Compliance,
    #[serde(rename = "GOVERNANCE")]
    Governance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRetention {
    pub mode: RetentionMode,
    pub retain_until_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectLegalHold {
    pub status: LegalHoldStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegalHoldStatus {
    #[serde(rename = "ON")]
    On,
    #[serde(rename = "OFF")]
    Off,
}
