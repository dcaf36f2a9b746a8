//! Stack lock management: load, save (atomic), path derivation.

use super::error::{Error, Result};
use super::types::{StackConfig, StackLock};
use crate::provenance::eventlog::now_rfc3339;
use std::path::{Path, PathBuf};

pub const LOCK_SCHEMA: &str = "1.0";

/// Derive the lock file path for a stack within the state directory.
pub fn lock_file_path(state_dir: &Path, stack: &str) -> PathBuf {
    state_dir.join(stack).join("state.lock.yaml")
}

/// Load the lock for a stack. Returns None if the file doesn't exist.
pub fn load_lock(state_dir: &Path, stack: &str) -> Result<Option<StackLock>> {
    let path = lock_file_path(state_dir, stack);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)?;
    let lock: StackLock = serde_yaml_ng::from_str(&content)
        .map_err(|e| Error::State(format!("invalid lock file {}: {}", path.display(), e)))?;
    Ok(Some(lock))
}

/// Save a lock atomically (write to temp, then rename).
pub fn save_lock(state_dir: &Path, lock: &StackLock) -> Result<()> {
    let path = lock_file_path(state_dir, &lock.stack);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let yaml = serde_yaml_ng::to_string(lock)?;

    let tmp_path = path.with_extension("lock.yaml.tmp");
    std::fs::write(&tmp_path, &yaml)?;
    std::fs::rename(&tmp_path, &path).map_err(|e| {
        Error::State(format!(
            "cannot rename {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        ))
    })?;

    Ok(())
}

/// Create an empty lock for a stack.
pub fn new_lock(config: &StackConfig) -> StackLock {
    StackLock {
        schema: LOCK_SCHEMA.to_string(),
        stack: config.name.clone(),
        provider: config.provider.clone(),
        region: config.region.clone(),
        generated_at: now_rfc3339(),
        generator: format!("cloudplat {}", env!("CARGO_PKG_VERSION")),
        resources: indexmap::IndexMap::new(),
        declarations: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Declaration, ResourceLock, ResourceStatus};
    use serde_json::json;

    fn make_config() -> StackConfig {
        crate::core::parser::parse_config(
            "version: \"1.0\"\nname: web\nprovider: aws\nregion: eu-west-1\n",
        )
        .unwrap()
    }

    fn make_lock() -> StackLock {
        let mut lock = new_lock(&make_config());
        lock.resources.insert(
            "network".to_string(),
            ResourceLock {
                kind: "network".to_string(),
                status: ResourceStatus::Created,
                applied_at: Some("2026-02-16T14:00:00Z".to_string()),
                duration_seconds: Some(0.5),
                hash: "blake3:abc123".to_string(),
                outputs: json!({"vpcId": "vpc-1"}),
            },
        );
        lock.declarations.push(Declaration {
            type_token: "aws:ec2/vpc:Vpc".to_string(),
            name: "net".to_string(),
            properties: json!({"cidrBlock": "10.0.0.0/16"}),
        });
        lock
    }

    #[test]
    fn test_lock_file_path() {
        let p = lock_file_path(Path::new("/state"), "backend-dev");
        assert_eq!(p, PathBuf::from("/state/backend-dev/state.lock.yaml"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        save_lock(dir.path(), &make_lock()).unwrap();

        let loaded = load_lock(dir.path(), "web").unwrap().unwrap();
        assert_eq!(loaded.stack, "web");
        assert_eq!(loaded.region, "eu-west-1");
        assert_eq!(loaded.resources["network"].status, ResourceStatus::Created);
        assert_eq!(loaded.resources["network"].outputs["vpcId"], "vpc-1");
        assert_eq!(loaded.declarations.len(), 1);
        assert_eq!(loaded.declarations[0].type_token, "aws:ec2/vpc:Vpc");
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_lock(dir.path(), "ghost").unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_file_path(dir.path(), "web");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "resources: [not, a, map").unwrap();
        let err = load_lock(dir.path(), "web").unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn test_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        save_lock(dir.path(), &make_lock()).unwrap();

        let tmp = dir.path().join("web").join("state.lock.yaml.tmp");
        assert!(!tmp.exists());
        assert!(lock_file_path(dir.path(), "web").exists());
    }

    #[test]
    fn test_new_lock() {
        let lock = new_lock(&make_config());
        assert_eq!(lock.stack, "web");
        assert_eq!(lock.provider, "aws");
        assert!(lock.generated_at.contains('T'));
        assert!(lock.generator.starts_with("cloudplat "));
        assert!(lock.resources.is_empty());
    }

    #[test]
    fn test_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut lock = make_lock();
        lock.resources.insert(
            "aaa-last".to_string(),
            ResourceLock {
                kind: "secrets".to_string(),
                status: ResourceStatus::Failed,
                applied_at: None,
                duration_seconds: None,
                hash: "blake3:xxx".to_string(),
                outputs: serde_json::Value::Null,
            },
        );
        save_lock(dir.path(), &lock).unwrap();
        let loaded = load_lock(dir.path(), "web").unwrap().unwrap();
        let keys: Vec<_> = loaded.resources.keys().collect();
        assert_eq!(keys, vec!["network", "aaa-last"]);
    }
}
