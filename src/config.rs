use std::path::Path;

use crate::container::ResourceContainer;
use crate::error::Error;

/// Name of the configuration file at the container root.
pub const CONFIG_FILE: &str = ".rclink.toml";

/// Content file extensions scanned when the config names none.
const DEFAULT_EXTENSIONS: [&str; 4] = ["md", "txt", "usfm", "usx"];

/// Scan configuration loaded from `.rclink.toml`.
/// Include/exclude patterns are path prefixes relative to the container root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether implicit citations are reported alongside explicit links.
    autolink: bool,
    /// Prefixes that are never scanned.
    exclude: Vec<String>,
    /// File extensions considered content, without the leading dot.
    extensions: Vec<String>,
    /// Prefixes to scan; empty means everything.
    include: Vec<String>,
}

/// Raw TOML structure for `.rclink.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct RclinkTomlConfig {
    /// See [`Config::autolink`].
    autolink: Option<bool>,
    /// See [`Config::should_scan`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::has_content_extension`].
    extensions: Option<Vec<String>>,
    /// See [`Config::should_scan`].
    #[serde(default)]
    include: Vec<String>,
}

impl Config {
    /// Whether implicit citations should be reported.
    pub const fn autolink(&self) -> bool {
        return self.autolink;
    }

    /// Whether `path` carries one of the configured content extensions.
    pub fn has_content_extension(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| return e.to_str()) else {
            return false;
        };
        return self.extensions.iter().any(|allowed| return allowed.eq_ignore_ascii_case(ext));
    }

    /// Load config from `.rclink.toml` at the root of a container, which may
    /// be a directory or a zip archive.
    /// Returns a default that scans everything if the file doesn't exist.
    /// Returns an error if the file exists but is malformed, never silently
    /// falling back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io`/`Error::Zip` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(container: &ResourceContainer) -> Result<Self, Error> {
        let Some(content) = container.read_file(CONFIG_FILE)? else {
            tracing::debug!(container = %container.path().display(), "no config file, using defaults");
            return Ok(Self::scan_everything_by_default());
        };

        let raw: RclinkTomlConfig = toml::from_str(&content)?;
        let defaults = Self::scan_everything_by_default();
        return Ok(Self {
            autolink: raw.autolink.unwrap_or(defaults.autolink),
            exclude: raw.exclude,
            extensions: raw
                .extensions
                .map(|exts| return exts.into_iter().map(|e| return e.trim_start_matches('.').to_string()).collect())
                .unwrap_or(defaults.extensions),
            include: raw.include,
        });
    }

    /// Default config that includes everything and excludes nothing.
    pub fn scan_everything_by_default() -> Self {
        return Self {
            autolink: true,
            exclude: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| return (*e).to_string()).collect(),
            include: Vec::new(),
        };
    }

    /// Check whether a content file path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self
                .include
                .iter()
                .any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self
            .exclude
            .iter()
            .any(|p| return relative_path.starts_with(p.as_str()));
    }
}
