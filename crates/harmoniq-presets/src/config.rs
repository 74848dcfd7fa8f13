use std::env;
use std::path::PathBuf;

/// Environment variable overriding [`PresetConfig::user_root`].
pub const USER_DIR_ENV: &str = "HARMONIQ_PRESET_USER_DIR";
/// Environment variable overriding [`PresetConfig::system_root`].
pub const SYSTEM_DIR_ENV: &str = "HARMONIQ_PRESET_SYSTEM_DIR";

pub const DEFAULT_EXTENSION: &str = "prs";

/// Where preset files live and which version stamp new saves carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetConfig {
    /// Root of the writable layer; files go to `<user_root>/presets/`.
    pub user_root: PathBuf,
    /// Root of the shipped layer; files go to `<system_root>/presets/`.
    pub system_root: PathBuf,
    /// File extension without the leading dot.
    pub extension: String,
    /// Version written into the header of every saved file.
    pub version: String,
}

impl Default for PresetConfig {
    fn default() -> Self {
        let user_root = dirs::config_dir()
            .map(|dir| dir.join("HarmoniqStudio"))
            .or_else(|| dirs::home_dir().map(|home| home.join(".harmoniq")))
            .unwrap_or_else(|| PathBuf::from(".harmoniq"));
        Self {
            user_root,
            system_root: PathBuf::from("/usr/share/harmoniq-studio"),
            extension: DEFAULT_EXTENSION.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl PresetConfig {
    /// Defaults with the roots taken from the environment when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = env::var_os(USER_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.user_root = PathBuf::from(dir);
        }
        if let Some(dir) = env::var_os(SYSTEM_DIR_ENV).filter(|dir| !dir.is_empty()) {
            config.system_root = PathBuf::from(dir);
        }
        config
    }

    pub fn with_user_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.user_root = root.into();
        self
    }

    pub fn with_system_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.system_root = root.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}
