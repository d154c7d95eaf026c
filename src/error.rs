/// Crate-level error types for rclink diagnostics.
use std::path::PathBuf;

/// All errors in rclink carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the token, file, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-wide error type re-exported at the root")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A container directory already exists where `create` was asked to build one.
    #[error("resource container already exists: {}", path.display())]
    ContainerExists {
        /// Directory that was expected to be absent.
        path: PathBuf,
    },

    /// A container manifest is missing a required field or is otherwise unusable.
    #[error("invalid resource container: {reason}")]
    InvalidContainer {
        /// Description of what is missing or wrong.
        reason: String,
    },

    /// An explicit link token matches none of the recognized surface forms.
    #[error("invalid link syntax: `{token}` ({reason})")]
    InvalidLinkSyntax {
        /// Why the token was rejected.
        reason: String,
        /// The offending token as given by the caller.
        token: String,
    },

    /// A container entry name is not usable as a path inside the container.
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath {
        /// The offending path as given by the caller or the manifest.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// A passage argument violates the `chapter[:chunk[-lastChunk]]` grammar.
    #[error("malformed passage: `{argument}` ({reason})")]
    MalformedPassage {
        /// The raw argument string.
        argument: String,
        /// Why the argument was rejected.
        reason: String,
    },

    /// Strict loading found no `manifest.yaml` in the container directory.
    #[error("manifest not found: {}", path.display())]
    ManifestNotFound {
        /// Path where the manifest was expected.
        path: PathBuf,
    },

    /// The container holds several projects and no identifier was given.
    #[error("multiple projects found ({}), specify the project identifier", identifiers.join(", "))]
    MultipleProjects {
        /// Identifiers of every project in the manifest.
        identifiers: Vec<String>,
    },

    /// The container conforms to an older version of the format than supported.
    #[error("outdated resource container: found {found} but expected {expected}")]
    OutdatedContainer {
        /// Version this crate supports.
        expected: String,
        /// Version declared by the manifest.
        found: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// No project in the manifest matches the requested identifier.
    #[error("unknown project: `{identifier}`")]
    UnknownProject {
        /// Project identifier that was not found.
        identifier: String,
    },

    /// The container conforms to a newer version of the format than supported.
    #[error("unsupported resource container: found {found} but expected {expected}")]
    UnsupportedContainer {
        /// Version this crate supports.
        expected: String,
        /// Version declared by the manifest.
        found: String,
    },

    /// YAML (de)serialization failed.
    #[error("yaml: {0}")]
    Yaml(
        /// The wrapped YAML error.
        #[from]
        serde_yaml::Error,
    ),

    /// A zip container archive could not be read or written.
    #[error("zip: {0}")]
    Zip(
        /// The wrapped zip error.
        #[from]
        zip::result::ZipError,
    ),
}
