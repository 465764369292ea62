use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, SettingsError};
use crate::sanitize::sanitize_text_field;

/// Shared secret compared against the `arotp` request parameter.
pub const OTP_KEY: &str = "ar_otp_key";
/// Whether successful registrations redirect to [`REDIRECT_URL`].
pub const REDIRECT_ENABLED: &str = "ar_redirect_enabled";
/// Destination after a successful registration.
pub const REDIRECT_URL: &str = "ar_redirect_url";
/// Locale assigned to provisioned users.
pub const USER_LOCALE: &str = "ar_user_locale";
/// Role assigned to provisioned users.
pub const USER_ROLE: &str = "ar_user_role";

/// Every key the store accepts, in display order.
pub const REGISTERED_KEYS: [&str; 5] = [
    OTP_KEY,
    REDIRECT_ENABLED,
    REDIRECT_URL,
    USER_LOCALE,
    USER_ROLE,
];

pub fn is_registered(key: &str) -> bool {
    REGISTERED_KEYS.contains(&key)
}

/// Key/value settings provider.
///
/// Reads return `None` for keys that were never written. Writes are
/// restricted to [`REGISTERED_KEYS`] and pass through
/// [`sanitize_text_field`] before they are stored.
pub trait SettingsProvider: Send + Sync + Debug {
    /// Read a raw value.
    fn get(&self, key: &str) -> Option<String>;

    /// Sanitize and store a value, returning what was stored.
    fn set(&self, key: &str, value: &str) -> Result<String>;

    /// All stored values, sorted by key.
    fn all(&self) -> BTreeMap<String, String>;
}

fn check_key(key: &str) -> Result<()> {
    if is_registered(key) {
        Ok(())
    } else {
        Err(SettingsError::UnknownKey(key.to_string()))
    }
}

/// In-process settings, lost on drop.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<BTreeMap<String, String>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, value)` pairs, sanitizing each value.
    pub fn with_values<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let settings = Self::new();
        for (key, value) in pairs {
            settings.set(key, value)?;
        }
        Ok(settings)
    }
}

impl SettingsProvider for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<String> {
        check_key(key)?;
        let sanitized = sanitize_text_field(value);
        self.values
            .write()
            .map_err(|_| SettingsError::Lock)?
            .insert(key.to_string(), sanitized.clone());
        Ok(sanitized)
    }

    fn all(&self) -> BTreeMap<String, String> {
        self.values
            .read()
            .map(|values| values.clone())
            .unwrap_or_default()
    }
}

/// On-disk layout of the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDocument {
    /// Identifier of this settings group
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Description of what these settings control
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Component that owns the settings
    pub provider: String,
    /// Version of the settings layout
    pub version: String,
    /// The stored values
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl Default for SettingsDocument {
    fn default() -> Self {
        Self {
            id: "auto_register".to_string(),
            name: "Auto Register".to_string(),
            description: Some("Magic link auto registration".to_string()),
            provider: "auto-register".to_string(),
            version: "1.0.1".to_string(),
            values: BTreeMap::new(),
        }
    }
}

/// Settings persisted to a YAML file.
///
/// The file is read once on open and rewritten on every `set`, through a
/// temporary sibling file renamed over the original.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    document: RwLock<SettingsDocument>,
}

impl FileSettings {
    /// Open the settings file at `path`. A missing file yields empty settings;
    /// it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let document = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let mut document: SettingsDocument = serde_yaml::from_str(&content)
                .map_err(|e| SettingsError::Parse(format!("{}: {}", path.display(), e)))?;
            document.values.retain(|key, _| is_registered(key));
            debug!("Loaded {} settings from {}", document.values.len(), path.display());
            document
        } else {
            info!("Settings file {} does not exist yet", path.display());
            SettingsDocument::default()
        };

        Ok(Self {
            path,
            document: RwLock::new(document),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, document: &SettingsDocument) -> Result<()> {
        let yaml = serde_yaml::to_string(document)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsProvider for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.document.read().ok()?.values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<String> {
        check_key(key)?;
        let sanitized = sanitize_text_field(value);

        let mut document = self.document.write().map_err(|_| SettingsError::Lock)?;
        let mut updated = document.clone();
        updated.values.insert(key.to_string(), sanitized.clone());
        self.persist(&updated)?;
        *document = updated;

        debug!("Setting {} updated", key);
        Ok(sanitized)
    }

    fn all(&self) -> BTreeMap<String, String> {
        self.document
            .read()
            .map(|document| document.values.clone())
            .unwrap_or_default()
    }
}
