// src/app/settings_store.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use serde_json::Value;

use crate::app::layout::Viewport;
use crate::model::{Position, SettingsPatch, Theme, UserSettings};

/// Single key holding the serialized `UserSettings`.
pub const SETTINGS_KEY: &str = "goloc_settings";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Emitted to every subscriber after a successful write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
}

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn subscribe(&self) -> mpsc::Receiver<StorageChange>;
}

#[derive(Default)]
struct Listeners(Mutex<Vec<mpsc::Sender<StorageChange>>>);

impl Listeners {
    fn add(&self) -> mpsc::Receiver<StorageChange> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut l) = self.0.lock() {
            l.push(tx);
        }
        rx
    }

    fn notify(&self, key: &str) {
        if let Ok(mut l) = self.0.lock() {
            l.retain(|tx| {
                tx.send(StorageChange {
                    key: key.to_string(),
                })
                .is_ok()
            });
        }
    }
}

/// One JSON file per key under `dir`.
pub struct FileKvStore {
    dir: PathBuf,
    listeners: Listeners,
}

impl FileKvStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            listeners: Listeners::default(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

fn atomic_write(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, text).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        atomic_write(&self.path_for(key), value)?;
        self.listeners.notify(key);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<StorageChange> {
        self.listeners.add()
    }
}

/// Page-local fallback when no persistent storage is reachable.
#[derive(Default)]
pub struct MemoryKvStore {
    map: Mutex<HashMap<String, String>>,
    listeners: Listeners,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.map.lock().map_err(|_| anyhow!("settings map poisoned"))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        {
            let mut map = self.map.lock().map_err(|_| anyhow!("settings map poisoned"))?;
            map.insert(key.to_string(), value.to_string());
        }
        self.listeners.notify(key);
        Ok(())
    }

    fn subscribe(&self) -> mpsc::Receiver<StorageChange> {
        self.listeners.add()
    }
}

pub fn default_settings(viewport: Viewport, server_url: &str) -> UserSettings {
    UserSettings {
        theme: Theme::Auto,
        auto_analyze: false,
        panel_position: Position::new(20.0, 20.0),
        fab_position: Position::new((viewport.width - 80.0).max(0.0), 100.0),
        panel_expanded: false,
        panel_width: None,
        server_url: server_url.to_string(),
    }
}

/// Shallow merge: top-level keys of `overlay` replace those of `base`.
fn merge_over(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut b), Value::Object(o)) => {
            for (k, v) in o {
                b.insert(k, v);
            }
            Value::Object(b)
        }
        (b, _) => b,
    }
}

/// Reads and writes `UserSettings` under [`SETTINGS_KEY`].
///
/// Reads never fail (defaults fill the gaps); write failures are logged and
/// swallowed. Writes are read-modify-write without locking: last writer wins.
#[derive(Clone)]
pub struct SettingsStore {
    kv: Arc<dyn KvStore>,
    defaults: UserSettings,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KvStore>, defaults: UserSettings) -> Self {
        Self { kv, defaults }
    }

    pub fn defaults(&self) -> &UserSettings {
        &self.defaults
    }

    pub fn get_settings(&self) -> UserSettings {
        match self.try_get() {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to load settings: {:#}", e);
                self.defaults.clone()
            }
        }
    }

    fn try_get(&self) -> Result<UserSettings> {
        let Some(text) = self.kv.get(SETTINGS_KEY)? else {
            return Ok(self.defaults.clone());
        };
        let stored: Value = serde_json::from_str(&text).context("stored settings are not JSON")?;
        let merged = merge_over(serde_json::to_value(&self.defaults)?, stored);
        serde_json::from_value(merged).context("stored settings have an unexpected shape")
    }

    pub fn save_settings(&self, patch: &SettingsPatch) {
        if let Err(e) = self.try_save(patch) {
            tracing::warn!("Failed to save settings: {:#}", e);
        }
    }

    fn try_save(&self, patch: &SettingsPatch) -> Result<()> {
        let current = serde_json::to_value(self.get_settings())?;
        let updated = merge_over(current, serde_json::to_value(patch)?);
        let text = serde_json::to_string(&updated)?;
        self.kv.set(SETTINGS_KEY, &text)
    }

    pub fn subscribe(&self) -> mpsc::Receiver<StorageChange> {
        self.kv.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> UserSettings {
        default_settings(Viewport::default(), DEFAULT_SERVER_URL)
    }

    #[test]
    fn empty_store_yields_defaults() {
        let store = SettingsStore::new(Arc::new(MemoryKvStore::new()), defaults());
        let s = store.get_settings();
        assert_eq!(s, defaults());
        assert_eq!(s.fab_position, Position::new(1200.0, 100.0));
    }

    #[test]
    fn patches_merge_over_current_values() {
        let store = SettingsStore::new(Arc::new(MemoryKvStore::new()), defaults());
        store.save_settings(&SettingsPatch {
            theme: Some(Theme::Dark),
            ..Default::default()
        });
        store.save_settings(&SettingsPatch {
            server_url: Some("http://10.0.0.2:9000".into()),
            ..Default::default()
        });

        let s = store.get_settings();
        assert_eq!(s.theme, Theme::Dark);
        assert_eq!(s.server_url, "http://10.0.0.2:9000");
        assert!(!s.auto_analyze);
    }

    #[test]
    fn partial_stored_record_is_filled_from_defaults() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(SETTINGS_KEY, r#"{"autoAnalyze": true, "unknownField": 1}"#).unwrap();
        let s = SettingsStore::new(kv, defaults()).get_settings();
        assert!(s.auto_analyze);
        assert_eq!(s.server_url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn corrupt_record_falls_back_to_defaults() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(SettingsStore::new(kv, defaults()).get_settings(), defaults());
    }

    #[test]
    fn writes_notify_other_readers() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let writer = SettingsStore::new(kv.clone(), defaults());
        let reader = SettingsStore::new(kv, defaults());
        let changes = reader.subscribe();

        writer.save_settings(&SettingsPatch {
            auto_analyze: Some(true),
            ..Default::default()
        });

        assert_eq!(
            changes.try_recv().unwrap(),
            StorageChange {
                key: SETTINGS_KEY.to_string()
            }
        );
        assert!(reader.get_settings().auto_analyze);
    }

    #[test]
    fn file_store_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(Arc::new(FileKvStore::new(dir.path().join("data"))), defaults());
        store.save_settings(&SettingsPatch {
            panel_width: Some(520.0),
            ..Default::default()
        });

        let on_disk = std::fs::read_to_string(dir.path().join("data").join("goloc_settings.json")).unwrap();
        assert!(on_disk.contains("\"panelWidth\":520.0"), "{on_disk}");

        let again = SettingsStore::new(Arc::new(FileKvStore::new(dir.path().join("data"))), defaults());
        assert_eq!(again.get_settings().panel_width, Some(520.0));
    }

    #[test]
    fn unwritable_store_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // a regular file where the directory should be
        let store = SettingsStore::new(Arc::new(FileKvStore::new(blocker.join("sub"))), defaults());
        store.save_settings(&SettingsPatch {
            auto_analyze: Some(true),
            ..Default::default()
        });
        assert!(!store.get_settings().auto_analyze);
    }
}
