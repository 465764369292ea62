//! Operator settings for magic link registration.
//!
//! Values are plain strings held by a [`SettingsProvider`]. The typed views in
//! this module ([`shared_secret`], [`ProvisioningDefaults`], [`RedirectPolicy`])
//! are what the rest of the workspace reads.

pub mod error;
pub mod sanitize;
pub mod store;

pub use error::{Result, SettingsError};
pub use sanitize::sanitize_text_field;
pub use store::{
    FileSettings, MemorySettings, SettingsDocument, SettingsProvider, OTP_KEY, REDIRECT_ENABLED,
    REDIRECT_URL, REGISTERED_KEYS, USER_LOCALE, USER_ROLE,
};

pub const DEFAULT_ROLE: &str = "subscriber";
pub const DEFAULT_LOCALE: &str = "en_US";

/// Interpret a stored flag. Only the empty string and `0` are false.
pub fn is_truthy(value: &str) -> bool {
    !matches!(value, "" | "0")
}

/// The configured shared secret.
///
/// `None` when the secret was never set, which must never match a request
/// token. An explicitly stored empty string is returned as-is.
pub fn shared_secret(settings: &dyn SettingsProvider) -> Option<String> {
    settings.get(OTP_KEY)
}

/// Role and locale assigned to every provisioned user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningDefaults {
    pub role: String,
    pub locale: String,
}

impl Default for ProvisioningDefaults {
    fn default() -> Self {
        Self {
            role: DEFAULT_ROLE.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl ProvisioningDefaults {
    /// Read from settings; missing or blank values fall back to the defaults.
    pub fn load(settings: &dyn SettingsProvider) -> Self {
        let non_blank = |key: &str, fallback: &str| {
            settings
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string())
        };

        Self {
            role: non_blank(USER_ROLE, DEFAULT_ROLE),
            locale: non_blank(USER_LOCALE, DEFAULT_LOCALE),
        }
    }
}

/// Where to send a visitor after a successful registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectPolicy {
    pub enabled: bool,
    pub target_url: Option<String>,
}

impl RedirectPolicy {
    pub fn load(settings: &dyn SettingsProvider) -> Self {
        Self {
            enabled: settings
                .get(REDIRECT_ENABLED)
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            target_url: settings.get(REDIRECT_URL),
        }
    }

    /// The configured target, only when enabled and non-empty.
    ///
    /// Disabled and enabled-with-empty-target both return `None`; callers
    /// fall back to the stripped request URL.
    pub fn target(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.target_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        for value in ["1", "true", "yes", "on", "false", "off", "no", "00"] {
            assert!(is_truthy(value), "{value} should be truthy");
        }
        for value in ["", "0"] {
            assert!(!is_truthy(value), "{value} should be falsy");
        }
    }

    #[test]
    fn test_secret_unset_vs_empty() {
        let settings = MemorySettings::new();
        assert_eq!(shared_secret(&settings), None);

        settings.set(OTP_KEY, "").unwrap();
        assert_eq!(shared_secret(&settings).as_deref(), Some(""));
    }

    #[test]
    fn test_provisioning_defaults() {
        let settings = MemorySettings::new();
        assert_eq!(
            ProvisioningDefaults::load(&settings),
            ProvisioningDefaults::default()
        );

        settings.set(USER_ROLE, "   ").unwrap();
        settings.set(USER_LOCALE, "nl_NL").unwrap();
        let defaults = ProvisioningDefaults::load(&settings);
        assert_eq!(defaults.role, "subscriber");
        assert_eq!(defaults.locale, "nl_NL");
    }

    #[test]
    fn test_redirect_policy_target() {
        let settings = MemorySettings::with_values([
            (REDIRECT_URL, "https://example.com/welcome"),
        ])
        .unwrap();
        // Disabled: target ignored.
        assert_eq!(RedirectPolicy::load(&settings).target(), None);

        settings.set(REDIRECT_ENABLED, "1").unwrap();
        assert_eq!(
            RedirectPolicy::load(&settings).target(),
            Some("https://example.com/welcome")
        );

        // Enabled but empty behaves like disabled.
        settings.set(REDIRECT_URL, "").unwrap();
        assert_eq!(RedirectPolicy::load(&settings).target(), None);
    }
}
