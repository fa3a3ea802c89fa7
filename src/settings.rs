//! Runtime settings lookup.
//!
//! The agent runtime hands adapters a key/value view of its character settings.
//! Lookups consult the runtime first and fall back to the process environment,
//! so every config loader goes through a [`SettingsSource`] instead of reading
//! `std::env` directly.

use std::collections::HashMap;

/// A key/value view of agent settings.
pub trait SettingsSource: Send + Sync {
    /// Return the raw value for `key`, if set.
    fn get_setting(&self, key: &str) -> Option<String>;
}

/// Reads settings from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl SettingsSource for EnvSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory settings, as supplied by an embedding runtime.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: HashMap<String, String>,
}

impl MapSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSettings {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SettingsSource for MapSettings {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Runtime settings with a fallback source.
///
/// Empty strings count as unset, matching how the runtime treats blank
/// character settings.
pub struct Layered<P, F> {
    primary: P,
    fallback: F,
}

impl<P: SettingsSource, F: SettingsSource> Layered<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: SettingsSource, F: SettingsSource> SettingsSource for Layered<P, F> {
    fn get_setting(&self, key: &str) -> Option<String> {
        self.primary
            .get_setting(key)
            .filter(|v| !v.is_empty())
            .or_else(|| self.fallback.get_setting(key))
            .filter(|v| !v.is_empty())
    }
}

/// Runtime settings first, then the process environment.
pub fn with_env_fallback<P: SettingsSource>(runtime: P) -> Layered<P, EnvSettings> {
    Layered::new(runtime, EnvSettings)
}

/// Parse a boolean the way the agent runtime does for text settings.
///
/// Returns `None` for anything that is not a recognised affirmative or
/// negative word.
pub fn parse_boolean_from_text(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" | "enable" | "enabled" => Some(true),
        "false" | "no" | "n" | "0" | "off" | "disable" | "disabled" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_value_wins_over_fallback() {
        let runtime = MapSettings::new().with("AO_USERNAME", "runtime");
        let fallback = MapSettings::new().with("AO_USERNAME", "env");
        let layered = Layered::new(runtime, fallback);
        assert_eq!(layered.get_setting("AO_USERNAME").as_deref(), Some("runtime"));
    }

    #[test]
    fn blank_runtime_value_falls_through() {
        let runtime = MapSettings::new().with("AO_WALLET", "");
        let fallback = MapSettings::new().with("AO_WALLET", "from-env");
        let layered = Layered::new(runtime, fallback);
        assert_eq!(layered.get_setting("AO_WALLET").as_deref(), Some("from-env"));
        assert_eq!(layered.get_setting("AO_MISSING"), None);
    }

    #[test]
    fn boolean_words() {
        assert_eq!(parse_boolean_from_text("TRUE"), Some(true));
        assert_eq!(parse_boolean_from_text(" yes "), Some(true));
        assert_eq!(parse_boolean_from_text("0"), Some(false));
        assert_eq!(parse_boolean_from_text("disabled"), Some(false));
        assert_eq!(parse_boolean_from_text("maybe"), None);
    }
}
