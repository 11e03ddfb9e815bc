//! Persistent user store.
//!
//! Accounts live in one JSON file, loaded fully at startup and written
//! back whole on every change. All mutation goes through [`UserStore`],
//! which holds its mutex across mutate-serialize-rename so concurrent
//! admin edits cannot lose updates, and which refuses any change that
//! would leave the console without an owner.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::auth::password::hash_password;
use crate::config::{DEFAULT_OWNER_PASSWORD, DEFAULT_OWNER_USERNAME, DEFAULT_PBKDF2_ITERATIONS};
use crate::models::{Role, UserRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User '{0}' already exists.")]
    AlreadyExists(String),
    #[error("User '{0}' does not exist.")]
    NotFound(String),
    #[error("At least one owner account must remain.")]
    LastOwner,
    #[error("You cannot change or delete your own account here.")]
    SelfChange,
    #[error("Username and password must not be empty.")]
    InvalidInput,
    #[error("Could not persist the user store: {0}")]
    Io(#[from] io::Error),
    #[error("User store file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Usernames are trimmed and lower-cased before any lookup or write.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Clone)]
pub struct UserStore {
    users: Arc<Mutex<HashMap<String, UserRecord>>>,
    path: PathBuf,
}

impl UserStore {
    /// Load the store from `path`. A missing file bootstraps a default
    /// owner account so a fresh deployment is immediately usable.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let users: HashMap<String, UserRecord> = if path.exists() {
            let raw = fs::read_to_string(path)?;
            serde_json::from_str(&raw)?
        } else {
            tracing::warn!(
                path = %path.display(),
                "user store missing; creating default owner account '{}'",
                DEFAULT_OWNER_USERNAME
            );
            let mut map = HashMap::new();
            map.insert(
                DEFAULT_OWNER_USERNAME.to_string(),
                UserRecord {
                    password: hash_password(DEFAULT_OWNER_PASSWORD, DEFAULT_PBKDF2_ITERATIONS),
                    role: Role::Owner,
                    assigned_instances: Vec::new(),
                },
            );
            write_snapshot(path, &map)?;
            map
        };

        Ok(UserStore {
            users: Arc::new(Mutex::new(users)),
            path: path.to_path_buf(),
        })
    }

    pub fn get(&self, username: &str) -> Option<UserRecord> {
        let users = self.users.lock().unwrap();
        users.get(&normalize_username(username)).cloned()
    }

    pub fn contains(&self, username: &str) -> bool {
        let users = self.users.lock().unwrap();
        users.contains_key(&normalize_username(username))
    }

    /// All accounts, sorted by username for stable listings.
    pub fn all(&self) -> Vec<(String, UserRecord)> {
        let users = self.users.lock().unwrap();
        let mut out: Vec<_> = users.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    pub fn owner_count(&self) -> usize {
        let users = self.users.lock().unwrap();
        users.values().filter(|u| u.role.is_owner()).count()
    }

    pub fn create(
        &self,
        username: &str,
        password_hash: String,
        role: Role,
    ) -> Result<(), StoreError> {
        let name = normalize_username(username);
        if name.is_empty() || password_hash.is_empty() {
            return Err(StoreError::InvalidInput);
        }
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&name) {
            return Err(StoreError::AlreadyExists(name));
        }
        users.insert(
            name,
            UserRecord {
                password: password_hash,
                role,
                assigned_instances: Vec::new(),
            },
        );
        write_snapshot(&self.path, &users)?;
        Ok(())
    }

    /// Delete `target`. Refused for the acting account itself and for
    /// the last remaining owner.
    pub fn delete(&self, acting: &str, target: &str) -> Result<(), StoreError> {
        let target = normalize_username(target);
        if normalize_username(acting) == target {
            return Err(StoreError::SelfChange);
        }
        let mut users = self.users.lock().unwrap();
        let record = users
            .get(&target)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target.clone()))?;
        if record.role.is_owner() && count_owners(&users) <= 1 {
            return Err(StoreError::LastOwner);
        }
        users.remove(&target);
        write_snapshot(&self.path, &users)?;
        Ok(())
    }

    /// Change `target`'s role. Refused for the acting account and for a
    /// downgrade that would demote the last owner.
    pub fn set_role(&self, acting: &str, target: &str, role: Role) -> Result<(), StoreError> {
        let target = normalize_username(target);
        if normalize_username(acting) == target {
            return Err(StoreError::SelfChange);
        }
        let mut users = self.users.lock().unwrap();
        let record = users
            .get(&target)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(target.clone()))?;
        if record.role.is_owner() && !role.is_owner() && count_owners(&users) <= 1 {
            return Err(StoreError::LastOwner);
        }
        if let Some(entry) = users.get_mut(&target) {
            entry.role = role;
        }
        write_snapshot(&self.path, &users)?;
        Ok(())
    }

    pub fn set_password_hash(&self, target: &str, password_hash: String) -> Result<(), StoreError> {
        let target = normalize_username(target);
        if password_hash.is_empty() {
            return Err(StoreError::InvalidInput);
        }
        let mut users = self.users.lock().unwrap();
        let entry = users
            .get_mut(&target)
            .ok_or_else(|| StoreError::NotFound(target.clone()))?;
        entry.password = password_hash;
        write_snapshot(&self.path, &users)?;
        Ok(())
    }

    /// Replace `target`'s instance allow-list. Ids are trimmed,
    /// de-duplicated, order preserved.
    pub fn set_assigned_instances(
        &self,
        target: &str,
        instance_ids: Vec<String>,
    ) -> Result<(), StoreError> {
        let target = normalize_username(target);
        let mut seen = Vec::new();
        for id in instance_ids {
            let id = id.trim().to_string();
            if !id.is_empty() && !seen.contains(&id) {
                seen.push(id);
            }
        }
        let mut users = self.users.lock().unwrap();
        let entry = users
            .get_mut(&target)
            .ok_or_else(|| StoreError::NotFound(target.clone()))?;
        entry.assigned_instances = seen;
        write_snapshot(&self.path, &users)?;
        Ok(())
    }

    /// Scrub a deleted instance id from every account's allow-list.
    pub fn remove_instance_everywhere(&self, instance_id: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let mut touched = false;
        for record in users.values_mut() {
            let before = record.assigned_instances.len();
            record.assigned_instances.retain(|id| id != instance_id);
            touched |= record.assigned_instances.len() != before;
        }
        if touched {
            write_snapshot(&self.path, &users)?;
        }
        Ok(())
    }
}

fn count_owners(users: &HashMap<String, UserRecord>) -> usize {
    users.values().filter(|u| u.role.is_owner()).count()
}

/// Serialize and atomically replace the snapshot file: write to a temp
/// file in the same directory, then rename over the target.
fn write_snapshot(path: &Path, users: &HashMap<String, UserRecord>) -> Result<(), StoreError> {
    let serialized = serde_json::to_string_pretty(users)?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new_in(".")?,
    };
    io::Write::write_all(&mut tmp, serialized.as_bytes())?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}
