//! Resource-container manifest, table of contents and media manifest records.
//!
//! Every field defaults when absent and unknown keys are ignored, so partial
//! or hand-written manifests still load.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Prefix carried by the `conformsto` value, e.g. `rc0.2`.
const CONFORMS_TO_PREFIX: &str = "rc";

/// Name of the manifest file at a container root.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Quality-control information about the resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checking {
    /// People or organizations that checked the content.
    pub checking_entity: Vec<String>,
    /// Checking level reached, e.g. `3`.
    pub checking_level: String,
}

/// One entry of a table of contents, possibly with nested sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Content {
    /// Link to the content this entry opens.
    pub link: String,
    /// Nested entries.
    pub sections: Vec<Self>,
    /// Secondary label.
    #[serde(alias = "subtitle", rename = "sub-title")]
    pub subtitle: String,
    /// Display label.
    pub title: String,
}

/// Dublin Core metadata describing the resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DublinCore {
    /// Container format version, e.g. `rc0.2`.
    #[serde(rename = "conformsto")]
    pub conforms_to: String,
    /// Contributor names.
    pub contributor: Vec<String>,
    /// Creator name.
    pub creator: String,
    /// Free-text description.
    pub description: String,
    /// MIME type of the content files, e.g. `text/usfm`.
    pub format: String,
    /// Resource slug, e.g. `ulb`.
    pub identifier: String,
    /// Date the resource was issued.
    pub issued: String,
    /// Resource type, e.g. `book` or `bundle`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Language of the content.
    pub language: Language,
    /// Date of the last modification.
    pub modified: String,
    /// Publisher name.
    pub publisher: String,
    /// Related resources as links.
    pub relation: Vec<String>,
    /// License, e.g. `CC BY-SA 4.0`.
    pub rights: String,
    /// Resources this one was derived from.
    pub source: Vec<Source>,
    /// Subject, e.g. `Bible`.
    pub subject: String,
    /// Human-readable title.
    pub title: String,
    /// Resource version.
    pub version: String,
}

/// Language of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Language {
    /// Script direction, `ltr` or `rtl`.
    pub direction: String,
    /// Language slug, e.g. `en`.
    pub identifier: String,
    /// Language name.
    pub title: String,
}

/// Contents of `manifest.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Quality-control information.
    pub checking: Checking,
    /// Resource metadata.
    pub dublin_core: DublinCore,
    /// Projects contained in the resource.
    pub projects: Vec<Project>,
}

/// One downloadable media rendition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    /// URL template for per-chapter files.
    pub chapter_url: String,
    /// Media slug, e.g. `mp3`.
    pub identifier: String,
    /// Available qualities, e.g. `64kbps`.
    pub quality: Vec<String>,
    /// URL of the full rendition.
    pub url: String,
    /// Media version.
    pub version: String,
}

/// Contents of `media.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaManifest {
    /// Per-project media.
    pub projects: Vec<MediaProject>,
    /// Media covering the whole resource.
    pub resource: Option<MediaResource>,
}

/// Media available for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaProject {
    /// Project slug the media belongs to.
    pub identifier: String,
    /// Available renditions.
    pub media: Vec<Media>,
    /// Media version.
    pub version: String,
}

/// Media available for the whole resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaResource {
    /// Available renditions.
    pub media: Vec<Media>,
    /// Media version.
    pub version: String,
}

/// One project of a resource, e.g. a single book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    /// Categories such as `bible-ot`.
    pub categories: Vec<String>,
    /// Project slug, e.g. `gen`.
    pub identifier: String,
    /// Content directory relative to the container root.
    pub path: String,
    /// Sort position among the projects.
    pub sort: u32,
    /// Human-readable title.
    pub title: String,
    /// Versification scheme, e.g. `kjv`.
    pub versification: String,
}

/// A resource this one was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    /// Source resource slug.
    pub identifier: String,
    /// Source language slug.
    pub language: String,
    /// Source version.
    pub version: String,
}

/// Contents of a project's `toc.yaml`: a top-level list of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableOfContents {
    /// Top-level entries.
    pub contents: Vec<Content>,
}

impl Manifest {
    /// Container format version with the `rc` prefix stripped, e.g. `0.2`.
    pub fn conforms_to(&self) -> &str {
        let value = self.dublin_core.conforms_to.as_str();
        return value.strip_prefix(CONFORMS_TO_PREFIX).unwrap_or(value);
    }

    /// Load a manifest from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, or `Error::Yaml` if it is not a valid manifest.
    pub fn read(path: &Path) -> Result<Self, Error> {
        return read_yaml(path);
    }

    /// Write the manifest as YAML, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Yaml` if serialization fails, or `Error::Io` if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        return write_yaml(path, self);
    }
}

/// Deserialize a YAML file.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Yaml`.
fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, Error> {
    let text = fs::read_to_string(path)?;
    return Ok(serde_yaml::from_str(&text)?);
}

/// Serialize a value to a YAML file.
///
/// # Errors
///
/// Returns `Error::Yaml` or `Error::Io`.
fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), Error> {
    let text = serde_yaml::to_string(value)?;
    fs::write(path, text)?;
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = "\
dublin_core:
  type: book
  conformsto: rc0.2
  format: text/usfm
  identifier: ulb
  title: Unlocked Literal Bible
  language:
    identifier: en
    title: English
    direction: ltr
  rights: CC BY-SA 4.0
  source:
    - identifier: ulb
      language: en
      version: '1'
  extra_key: ignored
checking:
  checking_entity:
    - Wycliffe Associates
  checking_level: '3'
projects:
  - identifier: gen
    title: Genesis
    sort: 1
    path: ./gen
    categories:
      - bible-ot
";

    #[test]
    fn parses_full_manifest() {
        let manifest: Manifest = serde_yaml::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.dublin_core.kind, "book");
        assert_eq!(manifest.dublin_core.language.identifier, "en");
        assert_eq!(manifest.dublin_core.source.len(), 1);
        assert_eq!(manifest.checking.checking_level, "3");
        assert_eq!(manifest.projects[0].identifier, "gen");
        assert_eq!(manifest.projects[0].sort, 1);
        assert_eq!(manifest.conforms_to(), "0.2");
    }

    #[test]
    fn missing_fields_default() {
        let manifest: Manifest = serde_yaml::from_str("projects: []\n").unwrap();
        assert_eq!(manifest.dublin_core, DublinCore::default());
        assert_eq!(manifest.conforms_to(), "");
    }

    #[test]
    fn conforms_to_without_prefix_is_kept() {
        let mut manifest = Manifest::default();
        manifest.dublin_core.conforms_to = "0.1".to_string();
        assert_eq!(manifest.conforms_to(), "0.1");
    }

    #[test]
    fn writes_type_and_conformsto_keys() {
        let mut manifest = Manifest::default();
        manifest.dublin_core.kind = "book".to_string();
        manifest.dublin_core.conforms_to = "rc0.2".to_string();
        let yaml = serde_yaml::to_string(&manifest).unwrap();
        assert!(yaml.contains("type: book"));
        assert!(yaml.contains("conformsto: rc0.2"));
    }

    #[test]
    fn toc_is_a_top_level_list() {
        let toc: TableOfContents = serde_yaml::from_str(
            "- title: Chapter 1\n  sub-title: Creation\n  link: '01'\n  sections:\n    - title: Verse 1\n      link: '01/01'\n",
        )
        .unwrap();
        assert_eq!(toc.contents.len(), 1);
        assert_eq!(toc.contents[0].subtitle, "Creation");
        assert_eq!(toc.contents[0].sections[0].link, "01/01");
    }

    #[test]
    fn media_manifest_reads_chapter_urls() {
        let media: MediaManifest = serde_yaml::from_str(
            "projects:\n  - identifier: gen\n    version: '1'\n    media:\n      - identifier: mp3\n        quality: [64kbps]\n        chapter_url: https://cdn.example.org/gen/{chapter}.mp3\n",
        )
        .unwrap();
        assert!(media.resource.is_none());
        assert_eq!(media.projects[0].media[0].quality, vec!["64kbps"]);
        assert!(media.projects[0].media[0].chapter_url.ends_with("{chapter}.mp3"));
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.yaml");
        let manifest: Manifest = serde_yaml::from_str(MANIFEST).unwrap();
        manifest.write(&path).unwrap();
        assert_eq!(Manifest::read(&path).unwrap(), manifest);
    }
}
