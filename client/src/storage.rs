use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    token: Option<String>,
    name: Option<String>,
    coins: Option<f64>,
    #[serde(default, rename = "gameIds")]
    game_ids: Vec<String>,
}

/// Simple key-value device storage backing the client across restarts:
/// bearer token, display name, running coin balance and the list of round
/// ids played. One JSON file, rewritten on every mutation; no transactional
/// guarantees.
pub struct DeviceStore {
    path: PathBuf,
    data: StoreData,
}

impl DeviceStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, data })
    }

    fn save(&self) -> Result<()> {
        let contents = serde_json::to_string(&self.data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, contents)?;
        debug!("Persisted device store to {}", self.path.display());
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.data.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        self.data.token = Some(token.into());
        self.save()
    }

    /// Logout: drop the token but keep the rest of the profile.
    pub fn clear_token(&mut self) -> Result<()> {
        self.data.token = None;
        self.save()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.data.name.as_deref()
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) -> Result<()> {
        self.data.name = Some(name.into());
        self.save()
    }

    pub fn coins(&self) -> Option<f64> {
        self.data.coins
    }

    pub fn set_coins(&mut self, coins: f64) -> Result<()> {
        self.data.coins = Some(coins);
        self.save()
    }

    pub fn game_ids(&self) -> &[String] {
        &self.data.game_ids
    }

    pub fn push_game_id(&mut self, game_id: impl Into<String>) -> Result<()> {
        self.data.game_ids.push(game_id.into());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_opens_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeviceStore::open(dir.path().join("store.json")).unwrap();

        assert!(store.token().is_none());
        assert!(store.coins().is_none());
        assert!(store.game_ids().is_empty());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = DeviceStore::open(&path).unwrap();
        store.set_token("jwt-abc").unwrap();
        store.set_display_name("alice").unwrap();
        store.set_coins(123.5).unwrap();
        store.push_game_id("g-1").unwrap();
        store.push_game_id("g-2").unwrap();

        let store = DeviceStore::open(&path).unwrap();
        assert_eq!(store.token(), Some("jwt-abc"));
        assert_eq!(store.display_name(), Some("alice"));
        assert_eq!(store.coins(), Some(123.5));
        assert_eq!(store.game_ids(), ["g-1", "g-2"]);
    }

    #[test]
    fn clear_token_keeps_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = DeviceStore::open(&path).unwrap();
        store.set_token("jwt-abc").unwrap();
        store.set_display_name("alice").unwrap();
        store.clear_token().unwrap();

        let store = DeviceStore::open(&path).unwrap();
        assert!(store.token().is_none());
        assert_eq!(store.display_name(), Some("alice"));
    }
}
