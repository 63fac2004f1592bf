//! Client Directory collaborator

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::ClientProfile;

/// Errors raised by a client directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Client profile has an empty id")]
    EmptyId,

    #[error("Failed to read client file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse client file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// CRUD over client profiles
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Option<ClientProfile>;

    async fn list(&self) -> Vec<ClientProfile>;

    /// Insert or replace; returns the previous profile
    async fn upsert(&self, profile: ClientProfile) -> Result<Option<ClientProfile>, DirectoryError>;

    async fn remove(&self, id: &str) -> Option<ClientProfile>;
}

/// Directory held in memory, optionally seeded from YAML
#[derive(Default)]
pub struct InMemoryClientDirectory {
    clients: RwLock<BTreeMap<String, ClientProfile>>,
}

impl InMemoryClientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_profiles(profiles: impl IntoIterator<Item = ClientProfile>) -> Self {
        let clients = profiles.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            clients: RwLock::new(clients),
        }
    }

    /// Parse a YAML list of profiles
    pub fn from_yaml(yaml: &str) -> Result<Self, DirectoryError> {
        let profiles: Vec<ClientProfile> = serde_yaml::from_str(yaml)?;
        if profiles.iter().any(|p| p.id.trim().is_empty()) {
            return Err(DirectoryError::EmptyId);
        }
        debug!(count = profiles.len(), "InMemoryClientDirectory::from_yaml: parsed");
        Ok(Self::from_profiles(profiles))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "InMemoryClientDirectory::load: called");
        let content = std::fs::read_to_string(path)?;
        let directory = Self::from_yaml(&content)?;
        info!("Loaded client profiles from {}", path.display());
        Ok(directory)
    }
}

#[async_trait]
impl ClientDirectory for InMemoryClientDirectory {
    async fn get_by_id(&self, id: &str) -> Option<ClientProfile> {
        debug!(%id, "InMemoryClientDirectory::get_by_id: called");
        self.clients.read().await.get(id).cloned()
    }

    async fn list(&self) -> Vec<ClientProfile> {
        self.clients.read().await.values().cloned().collect()
    }

    async fn upsert(&self, profile: ClientProfile) -> Result<Option<ClientProfile>, DirectoryError> {
        debug!(id = %profile.id, "InMemoryClientDirectory::upsert: called");
        if profile.id.trim().is_empty() {
            return Err(DirectoryError::EmptyId);
        }
        Ok(self.clients.write().await.insert(profile.id.clone(), profile))
    }

    async fn remove(&self, id: &str) -> Option<ClientProfile> {
        debug!(%id, "InMemoryClientDirectory::remove: called");
        self.clients.write().await.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
- id: stride
  name: Stride
  description: Running gear shop
  industry: e-commerce
- id: ledger
  name: Ledger Co
  target-persona: small business owners
"#;

    #[tokio::test]
    async fn test_from_yaml() {
        let directory = InMemoryClientDirectory::from_yaml(YAML).unwrap();
        let stride = directory.get_by_id("stride").await.unwrap();
        assert_eq!(stride.industry.as_deref(), Some("e-commerce"));

        let ledger = directory.get_by_id("ledger").await.unwrap();
        assert_eq!(ledger.target_persona.as_deref(), Some("small business owners"));
        assert!(directory.get_by_id("missing").await.is_none());
        assert_eq!(directory.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_crud() {
        let directory = InMemoryClientDirectory::new();
        let profile = ClientProfile {
            id: "c1".to_string(),
            name: "First".to_string(),
            ..Default::default()
        };
        assert!(directory.upsert(profile.clone()).await.unwrap().is_none());

        let renamed = ClientProfile {
            name: "Second".to_string(),
            ..profile
        };
        let previous = directory.upsert(renamed).await.unwrap().unwrap();
        assert_eq!(previous.name, "First");

        assert_eq!(directory.remove("c1").await.unwrap().name, "Second");
        assert!(directory.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let directory = InMemoryClientDirectory::new();
        let err = directory.upsert(ClientProfile::default()).await.unwrap_err();
        assert!(matches!(err, DirectoryError::EmptyId));
        assert!(matches!(
            InMemoryClientDirectory::from_yaml("- name: nobody\n"),
            Err(DirectoryError::EmptyId)
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("clients.yml");
        std::fs::write(&path, YAML).unwrap();
        assert!(InMemoryClientDirectory::load(&path).is_ok());
        assert!(InMemoryClientDirectory::load(temp.path().join("none.yml")).is_err());
    }
}
