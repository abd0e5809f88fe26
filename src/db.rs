//! Flat record store for operator identities, tenants and sessions.
//!
//! Everything lives in one JSON document on disk. Every operation takes the
//! single store lock for its whole read-modify-write-and-persist cycle, so
//! concurrent request handlers see a consistent file. The store is injected
//! as an `Arc<Database>` so tests can run against isolated instances.

use crate::error::{Error, Result};
use crate::models::{
    CreateTenantRequest, CreateUserRequest, Role, Session, Tenant, UpdateTenantRequest,
    UpdateUserRequest, User,
};
use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

const DATABASE_FILE: &str = "database.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Store {
    #[serde(default)]
    users: HashMap<String, User>,
    #[serde(default)]
    tenants: HashMap<String, Tenant>,
    #[serde(default)]
    sessions: HashMap<String, Session>,
}

pub struct Database {
    path: PathBuf,
    session_ttl: Duration,
    store: Mutex<Store>,
}

impl Database {
    /// Open (or create) the store under `data_dir`. Bootstraps a default
    /// admin account when no users exist yet.
    pub fn open(data_dir: &Path, session_ttl_hours: i64) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let path = data_dir.join(DATABASE_FILE);
        let store = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_json::from_str(&data)?
        } else {
            Store::default()
        };

        let db = Database {
            path,
            session_ttl: Duration::hours(session_ttl_hours),
            store: Mutex::new(store),
        };

        {
            let mut store = db.store.lock().unwrap();
            if store.users.is_empty() {
                db.create_default_admin(&mut store)?;
            }
        }

        Ok(db)
    }

    fn persist(&self, store: &Store) -> Result<()> {
        let data = serde_json::to_string_pretty(store)?;
        std::fs::write(&self.path, data)?;
        Ok(())
    }

    fn create_default_admin(&self, store: &mut Store) -> Result<()> {
        warn!("No users found, creating default admin account (admin/admin)");
        warn!("IMPORTANT: Change this password after first login!");

        let now = Utc::now();
        let admin = User {
            id: generate_id(),
            username: "admin".to_string(),
            email: "admin@localhost".to_string(),
            password_hash: hash_password("admin")?,
            role: Role::Admin,
            tenant_id: None,
            enabled: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        store.users.insert(admin.id.clone(), admin);
        self.persist(store)
    }

    // User operations

    pub fn create_user(&self, req: &CreateUserRequest) -> Result<User> {
        let mut store = self.store.lock().unwrap();

        for user in store.users.values() {
            if user.username == req.username {
                return Err(Error::BadRequest("username already exists".to_string()));
            }
            if user.email == req.email {
                return Err(Error::BadRequest("email already exists".to_string()));
            }
        }

        let now = Utc::now();
        let user = User {
            id: generate_id(),
            username: req.username.clone(),
            email: req.email.clone(),
            password_hash: hash_password(&req.password)?,
            role: req.role.clone(),
            tenant_id: req.tenant_id.clone(),
            enabled: req.enabled,
            last_login: None,
            created_at: now,
            updated_at: now,
        };

        store.users.insert(user.id.clone(), user.clone());
        self.persist(&store)?;

        Ok(user)
    }

    pub fn get_user(&self, id: &str) -> Result<User> {
        let store = self.store.lock().unwrap();
        store
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound("user".to_string()))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<User> {
        let store = self.store.lock().unwrap();
        store
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or_else(|| Error::NotFound("user".to_string()))
    }

    pub fn update_user(&self, id: &str, req: &UpdateUserRequest) -> Result<User> {
        let mut store = self.store.lock().unwrap();

        let user = store
            .users
            .get_mut(id)
            .ok_or_else(|| Error::NotFound("user".to_string()))?;

        if let Some(username) = &req.username {
            user.username = username.clone();
        }
        if let Some(email) = &req.email {
            user.email = email.clone();
        }
        if let Some(password) = &req.password {
            user.password_hash = hash_password(password)?;
        }
        if let Some(role) = &req.role {
            user.role = role.clone();
        }
        if let Some(tenant_id) = &req.tenant_id {
            user.tenant_id = Some(tenant_id.clone());
        }
        if let Some(enabled) = req.enabled {
            user.enabled = enabled;
        }
        user.updated_at = Utc::now();

        let user = user.clone();
        self.persist(&store)?;

        Ok(user)
    }

    pub fn delete_user(&self, id: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap();

        if store.users.remove(id).is_none() {
            return Err(Error::NotFound("user".to_string()));
        }

        self.persist(&store)
    }

    pub fn list_users(&self) -> Vec<User> {
        let store = self.store.lock().unwrap();
        store.users.values().cloned().collect()
    }

    /// Validate credentials and record the login time. Disabled accounts
    /// are rejected before the password check runs.
    pub fn authenticate_user(&self, username: &str, password: &str) -> Result<User> {
        let mut store = self.store.lock().unwrap();

        let user = store
            .users
            .values_mut()
            .find(|user| user.username == username)
            .ok_or(Error::InvalidCredentials)?;

        if !user.enabled {
            return Err(Error::InvalidCredentials);
        }

        if !verify_password(password, &user.password_hash) {
            return Err(Error::InvalidCredentials);
        }

        user.last_login = Some(Utc::now());
        let user = user.clone();
        self.persist(&store)?;

        Ok(user)
    }

    // Tenant operations

    pub fn create_tenant(&self, req: &CreateTenantRequest) -> Result<Tenant> {
        let mut store = self.store.lock().unwrap();

        for tenant in store.tenants.values() {
            if tenant.name == req.name {
                return Err(Error::BadRequest("tenant name already exists".to_string()));
            }
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: generate_id(),
            name: req.name.clone(),
            description: req.description.clone(),
            enabled: req.enabled,
            max_buckets: req.max_buckets,
            max_keys: req.max_keys,
            quota_bytes: req.quota_bytes,
            created_at: now,
            updated_at: now,
        };

        store.tenants.insert(tenant.id.clone(), tenant.clone());
        self.persist(&store)?;

        Ok(tenant)
    }

    pub fn get_tenant(&self, id: &str) -> Result<Tenant> {
        let store = self.store.lock().unwrap();
        store
            .tenants
            .get(id)
            .cloned()
            .ok_or_else(|| Error::NotFound("tenant".to_string()))
    }

    pub fn update_tenant(&self, id: &str, req: &UpdateTenantRequest) -> Result<Tenant> {
        let mut store = self.store.lock().unwrap();

        let tenant = store
            .tenants
            .get_mut(id)
            .ok_or_else(|| Error::NotFound("tenant".to_string()))?;

        if let Some(name) = &req.name {
            tenant.name = name.clone();
        }
        if let Some(description) = &req.description {
            tenant.description = description.clone();
        }
        if let Some(enabled) = req.enabled {
            tenant.enabled = enabled;
        }
        if let Some(max_buckets) = req.max_buckets {
            tenant.max_buckets = max_buckets;
        }
        if let Some(max_keys) = req.max_keys {
            tenant.max_keys = max_keys;
        }
        if let Some(quota_bytes) = req.quota_bytes {
            tenant.quota_bytes = Some(quota_bytes);
        }
        tenant.updated_at = Utc::now();

        let tenant = tenant.clone();
        self.persist(&store)?;

        Ok(tenant)
    }

    pub fn delete_tenant(&self, id: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap();

        if store.tenants.remove(id).is_none() {
            return Err(Error::NotFound("tenant".to_string()));
        }

        self.persist(&store)
    }

    pub fn list_tenants(&self) -> Vec<Tenant> {
        let store = self.store.lock().unwrap();
        store.tenants.values().cloned().collect()
    }

    pub fn user_count_for_tenant(&self, tenant_id: &str) -> usize {
        let store = self.store.lock().unwrap();
        store
            .users
            .values()
            .filter(|user| user.tenant_id.as_deref() == Some(tenant_id))
            .count()
    }

    /// (users, tenants, sessions) counts for the status endpoint.
    pub fn counts(&self) -> (usize, usize, usize) {
        let store = self.store.lock().unwrap();
        (
            store.users.len(),
            store.tenants.len(),
            store.sessions.len(),
        )
    }

    // Session operations

    pub fn create_session(&self, user_id: &str) -> Result<Session> {
        let mut store = self.store.lock().unwrap();

        // Opportunistic cleanup so dead sessions don't pile up in the file.
        let now = Utc::now();
        store.sessions.retain(|_, session| session.expires_at > now);

        let session = Session {
            id: generate_id(),
            user_id: user_id.to_string(),
            token: generate_token()?,
            expires_at: now + self.session_ttl,
            created_at: now,
        };

        store.sessions.insert(session.id.clone(), session.clone());
        self.persist(&store)?;

        info!("Created session for user {}", user_id);
        Ok(session)
    }

    pub fn get_session_by_token(&self, token: &str) -> Result<Session> {
        let store = self.store.lock().unwrap();

        let session = store
            .sessions
            .values()
            .find(|session| session.token == token)
            .ok_or(Error::Unauthorized)?;

        if Utc::now() > session.expires_at {
            return Err(Error::Unauthorized);
        }

        Ok(session.clone())
    }

    pub fn delete_session(&self, id: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        store.sessions.remove(id);
        self.persist(&store)
    }

    pub fn cleanup_expired_sessions(&self) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        let now = Utc::now();
        store.sessions.retain(|_, session| session.expires_at > now);
        self.persist(&store)
    }
}

fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect())
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), 24).unwrap();
        (db, dir)
    }

    fn user_request(username: &str, role: Role) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{}@localhost", username),
            password: "secret".to_string(),
            role,
            tenant_id: None,
            enabled: true,
        }
    }

    #[test]
    fn bootstrap_creates_default_admin() {
        let (db, _dir) = open_temp_db();

        let admin = db.get_user_by_username("admin").unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.enabled);

        let authed = db.authenticate_user("admin", "admin").unwrap();
        assert_eq!(authed.id, admin.id);
        assert!(authed.last_login.is_some());
    }

    #[test]
    fn wrong_password_is_rejected() {
        let (db, _dir) = open_temp_db();
        assert!(matches!(
            db.authenticate_user("admin", "nope"),
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            db.authenticate_user("ghost", "admin"),
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn disabled_account_cannot_authenticate() {
        let (db, _dir) = open_temp_db();
        let user = db.create_user(&user_request("carol", Role::User)).unwrap();
        db.update_user(
            &user.id,
            &UpdateUserRequest {
                enabled: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(matches!(
            db.authenticate_user("carol", "secret"),
            Err(Error::InvalidCredentials)
        ));
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let (db, _dir) = open_temp_db();
        db.create_user(&user_request("dave", Role::User)).unwrap();
        assert!(matches!(
            db.create_user(&user_request("dave", Role::ReadOnly)),
            Err(Error::BadRequest(_))
        ));
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let user_id = {
            let db = Database::open(dir.path(), 24).unwrap();
            db.create_user(&user_request("erin", Role::TenantAdmin))
                .unwrap()
                .id
        };

        let db = Database::open(dir.path(), 24).unwrap();
        let user = db.get_user(&user_id).unwrap();
        assert_eq!(user.username, "erin");
        assert_eq!(user.role, Role::TenantAdmin);
        // Password hashes survive the round trip through disk.
        assert!(db.authenticate_user("erin", "secret").is_ok());
    }

    #[test]
    fn sessions_expire() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path(), 0).unwrap();

        let admin = db.get_user_by_username("admin").unwrap();
        let session = db.create_session(&admin.id).unwrap();

        // A zero-hour TTL expires immediately.
        assert!(matches!(
            db.get_session_by_token(&session.token),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn session_lookup_and_delete() {
        let (db, _dir) = open_temp_db();
        let admin = db.get_user_by_username("admin").unwrap();

        let session = db.create_session(&admin.id).unwrap();
        let found = db.get_session_by_token(&session.token).unwrap();
        assert_eq!(found.user_id, admin.id);

        db.delete_session(&session.id).unwrap();
        assert!(db.get_session_by_token(&session.token).is_err());
    }

    #[test]
    fn tenant_crud_round_trip() {
        let (db, _dir) = open_temp_db();

        let tenant = db
            .create_tenant(&CreateTenantRequest {
                name: "acme".to_string(),
                description: "Acme Corp".to_string(),
                enabled: true,
                max_buckets: 10,
                max_keys: 100,
                quota_bytes: Some(1 << 30),
            })
            .unwrap();

        let updated = db
            .update_tenant(
                &tenant.id,
                &UpdateTenantRequest {
                    description: Some("Acme Corporation".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.description, "Acme Corporation");
        assert_eq!(updated.max_buckets, 10);

        db.delete_tenant(&tenant.id).unwrap();
        assert!(matches!(
            db.get_tenant(&tenant.id),
            Err(Error::NotFound(_))
        ));
    }
}
