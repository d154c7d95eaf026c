//! Resource containers: load, create, and project content access.
//!
//! A container holds a `manifest.yaml` at its root and one content directory
//! per project. Each project directory holds one directory per chapter with
//! one file per chunk, plus optional `toc.yaml` and `config.yaml` files.
//! Containers live in a plain directory or in a zip archive; both go through
//! the same [`Accessor`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::accessor::{self, Accessor, DirAccessor, ZipAccessor};
use crate::error::Error;
use crate::manifest::{MANIFEST_FILE, Manifest, MediaManifest, Project, TableOfContents};
use crate::semver;

/// Container format version this crate reads and writes.
pub const CONFORMS_TO: &str = "0.2";

/// Name of the project configuration file.
const CONFIG_FILE: &str = "config.yaml";

/// Name of the media manifest at the container root.
const MEDIA_FILE: &str = "media.yaml";

/// Name of the project table of contents file.
const TOC_FILE: &str = "toc.yaml";

/// A resource container rooted at a directory or a zip archive.
#[derive(Debug, Clone)]
pub struct ResourceContainer {
    /// Parsed `manifest.yaml`; empty when loaded leniently without one.
    manifest: Manifest,
    /// Container directory or archive file.
    path: PathBuf,
    /// Storage backend the container's files are read from and written to.
    store: Arc<dyn Accessor>,
}

impl ResourceContainer {
    /// Chapter directory names of a project, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::MultipleProjects` if `project` is `None` and the
    /// container is ambiguous, or `Error::Io`/`Error::Zip` if the storage
    /// cannot be read.
    pub fn chapters(&self, project: Option<&str>) -> Result<Vec<String>, Error> {
        let Some(dir) = self.project_dir(project)? else {
            return Ok(Vec::new());
        };
        return Ok(self
            .store
            .list(&dir)?
            .into_iter()
            .filter(|entry| return entry.is_dir)
            .map(|entry| return entry.name)
            .collect());
    }

    /// Entry name of a chunk file, if the project exists.
    fn chunk_entry(&self, project: Option<&str>, chapter: &str, chunk: &str) -> Result<Option<String>, Error> {
        let chapter = single_segment(chapter)?;
        let chunk = single_segment(chunk)?;
        let ext = self.chunk_ext();
        return Ok(self.project_dir(project)?.map(|dir| {
            return accessor::join_entry(&accessor::join_entry(&dir, chapter), &format!("{chunk}.{ext}"));
        }));
    }

    /// File extension used for chunk files, derived from `dublin_core.format`.
    pub fn chunk_ext(&self) -> &'static str {
        return match self.manifest.dublin_core.format.as_str() {
            "audio/mp3" => "mp3",
            "text/markdown" => "md",
            "text/usfm" => "usfm",
            "text/usx" => "usx",
            "video/mp4" => "mp4",
            _ => "txt",
        };
    }

    /// Chunk slugs of a chapter, sorted. A slug is a file name up to its first `.`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `chapter` is not a single path segment,
    /// `Error::MultipleProjects` if `project` is `None` and the container is
    /// ambiguous, or `Error::Io`/`Error::Zip` if the storage cannot be read.
    pub fn chunks(&self, project: Option<&str>, chapter: &str) -> Result<Vec<String>, Error> {
        let chapter = single_segment(chapter)?;
        let Some(dir) = self.project_dir(project)? else {
            return Ok(Vec::new());
        };
        let mut slugs: Vec<String> = self
            .store
            .list(&accessor::join_entry(&dir, chapter))?
            .into_iter()
            .filter(|entry| return !entry.is_dir)
            .filter_map(|entry| return entry.name.split('.').next().map(str::to_string))
            .collect();
        slugs.sort();
        slugs.dedup();
        return Ok(slugs);
    }

    /// The project `config.yaml`, or `None` when absent or there is no such project.
    ///
    /// # Errors
    ///
    /// Returns `Error::MultipleProjects`, or `Error::Yaml` if the file is malformed.
    pub fn config(&self, project: Option<&str>) -> Result<Option<serde_yaml::Value>, Error> {
        return self.read_project_yaml(project, CONFIG_FILE);
    }

    /// Container format version with the `rc` prefix stripped.
    pub fn conforms_to(&self) -> &str {
        return self.manifest.conforms_to();
    }

    /// Create a new container at `path` and write its manifest.
    ///
    /// A path ending in `.zip` creates a zip archive, anything else a
    /// directory. `conformsto` is stamped with the version this crate supports.
    ///
    /// # Errors
    ///
    /// Returns `Error::ContainerExists` if `path` already exists,
    /// `Error::InvalidContainer` naming the first missing required field,
    /// or `Error::Io`/`Error::Yaml`/`Error::Zip` if writing fails.
    pub fn create(path: &Path, mut manifest: Manifest) -> Result<Self, Error> {
        if path.exists() {
            return Err(Error::ContainerExists {
                path: path.to_path_buf(),
            });
        }

        let dc = &manifest.dublin_core;
        let required = [
            ("dublin_core.type", dc.kind.as_str()),
            ("dublin_core.format", dc.format.as_str()),
            ("dublin_core.identifier", dc.identifier.as_str()),
            ("dublin_core.language", dc.language.identifier.as_str()),
            ("dublin_core.rights", dc.rights.as_str()),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| return value.is_empty()) {
            return Err(Error::InvalidContainer {
                reason: format!("missing {key}"),
            });
        }

        manifest.dublin_core.conforms_to = format!("rc{CONFORMS_TO}");
        let store: Arc<dyn Accessor> = if is_zip_path(path) {
            Arc::new(ZipAccessor::new(path))
        } else {
            Arc::new(DirAccessor::new(path))
        };
        write_entry(store.as_ref(), MANIFEST_FILE, &manifest)?;
        tracing::info!(path = %path.display(), identifier = %manifest.dublin_core.identifier, "created resource container");

        return Ok(Self {
            manifest,
            path: path.to_path_buf(),
            store,
        });
    }

    /// Every file in the container as a `/`-separated name relative to its root, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io`/`Error::Zip` if the storage cannot be read.
    pub fn files(&self) -> Result<Vec<String>, Error> {
        return self.store.files();
    }

    /// Whether the container is stored in a zip archive.
    pub fn is_archive(&self) -> bool {
        return is_zip_path(&self.path) || self.path.is_file();
    }

    /// Resource type from `dublin_core.type`, e.g. `book`.
    pub fn kind(&self) -> &str {
        return &self.manifest.dublin_core.kind;
    }

    /// Load the container at `path`, a directory or a zip archive.
    ///
    /// Strict loading validates the manifest and its format version.
    /// Lenient loading accepts a missing manifest as an empty one.
    ///
    /// # Errors
    ///
    /// In strict mode returns `Error::ManifestNotFound`, `Error::InvalidContainer`
    /// when `conformsto` is empty, `Error::UnsupportedContainer` when it is newer
    /// than [`CONFORMS_TO`], or `Error::OutdatedContainer` when older. In both modes
    /// returns `Error::Io`/`Error::Yaml`/`Error::Zip` if the storage or an
    /// existing manifest cannot be read.
    pub fn load(path: &Path, strict: bool) -> Result<Self, Error> {
        let store: Arc<dyn Accessor> = if path.is_file() || is_zip_path(path) {
            Arc::new(ZipAccessor::open(path)?)
        } else {
            Arc::new(DirAccessor::new(path))
        };

        let manifest = match read_entry::<Manifest>(store.as_ref(), MANIFEST_FILE)? {
            Some(manifest) => manifest,
            None if strict => {
                return Err(Error::ManifestNotFound {
                    path: path.join(MANIFEST_FILE),
                });
            },
            None => {
                tracing::debug!(path = %path.display(), "no manifest, loading empty container");
                Manifest::default()
            },
        };

        let container = Self {
            manifest,
            path: path.to_path_buf(),
            store,
        };
        if strict {
            container.validate()?;
        }
        tracing::debug!(
            path = %path.display(),
            conforms_to = container.conforms_to(),
            projects = container.project_count(),
            "loaded resource container"
        );
        return Ok(container);
    }

    /// The parsed manifest.
    pub const fn manifest(&self) -> &Manifest {
        return &self.manifest;
    }

    /// The container's `media.yaml`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io`, `Error::Zip` or `Error::Yaml` if the file exists but cannot be read.
    pub fn media(&self) -> Result<Option<MediaManifest>, Error> {
        return read_entry(self.store.as_ref(), MEDIA_FILE);
    }

    /// Container directory or archive file.
    pub fn path(&self) -> &Path {
        return &self.path;
    }

    /// Look up a project.
    ///
    /// With an identifier, returns the matching project. Without one, returns
    /// the only project. Returns `None` when the container has no projects or
    /// nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `Error::MultipleProjects` if no identifier is given and the
    /// container holds more than one project.
    pub fn project(&self, identifier: Option<&str>) -> Result<Option<&Project>, Error> {
        let projects = &self.manifest.projects;
        if let Some(identifier) = identifier.filter(|id| return !id.is_empty()) {
            return Ok(projects.iter().find(|p| return p.identifier == identifier));
        }
        match projects.as_slice() {
            [] => return Ok(None),
            [only] => return Ok(Some(only)),
            _ => {
                return Err(Error::MultipleProjects {
                    identifiers: self.project_ids(),
                });
            },
        }
    }

    /// Number of projects in the manifest.
    pub fn project_count(&self) -> usize {
        return self.manifest.projects.len();
    }

    /// Entry name of a project's content directory, if the project exists.
    fn project_dir(&self, project: Option<&str>) -> Result<Option<String>, Error> {
        return self
            .project(project)?
            .map(|p| return accessor::normalize(&p.path))
            .transpose();
    }

    /// Identifiers of every project, in manifest order.
    pub fn project_ids(&self) -> Vec<String> {
        return self
            .manifest
            .projects
            .iter()
            .map(|p| return p.identifier.clone())
            .collect();
    }

    /// Contents of a chunk, or an empty string when it or the project does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `chapter` or `chunk` is not a single path
    /// segment, `Error::MultipleProjects`, or `Error::Io`/`Error::Zip` if the
    /// file exists but cannot be read.
    pub fn read_chunk(&self, project: Option<&str>, chapter: &str, chunk: &str) -> Result<String, Error> {
        let Some(name) = self.chunk_entry(project, chapter, chunk)? else {
            return Ok(String::new());
        };
        return Ok(self.store.read(&name)?.unwrap_or_default());
    }

    /// Contents of any file in the container, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `name` leaves the container, or
    /// `Error::Io`/`Error::Zip` if the file exists but cannot be read.
    pub fn read_file(&self, name: &str) -> Result<Option<String>, Error> {
        return self.store.read(name);
    }

    /// Read a YAML file from a project directory.
    fn read_project_yaml<T: for<'de> serde::Deserialize<'de>>(
        &self,
        project: Option<&str>,
        file_name: &str,
    ) -> Result<Option<T>, Error> {
        let Some(dir) = self.project_dir(project)? else {
            return Ok(None);
        };
        return read_entry(self.store.as_ref(), &accessor::join_entry(&dir, file_name));
    }

    /// The project `toc.yaml`, or `None` when absent or there is no such project.
    ///
    /// # Errors
    ///
    /// Returns `Error::MultipleProjects`, or `Error::Yaml` if the file is malformed.
    pub fn toc(&self, project: Option<&str>) -> Result<Option<TableOfContents>, Error> {
        return self.read_project_yaml(project, TOC_FILE);
    }

    /// Check the manifest against the supported format version.
    fn validate(&self) -> Result<(), Error> {
        let found = self.conforms_to();
        if found.is_empty() {
            return Err(Error::InvalidContainer {
                reason: "missing dublin_core.conformsto".to_string(),
            });
        }
        if semver::gt(found, CONFORMS_TO) {
            tracing::debug!(found, expected = CONFORMS_TO, "container is newer than supported");
            return Err(Error::UnsupportedContainer {
                expected: CONFORMS_TO.to_string(),
                found: found.to_string(),
            });
        }
        if semver::lt(found, CONFORMS_TO) {
            tracing::debug!(found, expected = CONFORMS_TO, "container is older than supported");
            return Err(Error::OutdatedContainer {
                expected: CONFORMS_TO.to_string(),
                found: found.to_string(),
            });
        }
        return Ok(());
    }

    /// Write a chunk, creating its chapter directory. Empty content deletes the chunk.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `chapter` or `chunk` is not a single path
    /// segment, `Error::UnknownProject` if the project does not exist,
    /// `Error::MultipleProjects` if it is ambiguous, or `Error::Io`/`Error::Zip`.
    pub fn write_chunk(&self, project: Option<&str>, chapter: &str, chunk: &str, content: &str) -> Result<(), Error> {
        let name = self
            .chunk_entry(project, chapter, chunk)?
            .ok_or_else(|| return unknown_project(project))?;
        if content.is_empty() {
            return self.store.remove(&name);
        }
        return self.store.write(&name, content);
    }

    /// Write the project `config.yaml`. `None` deletes it.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownProject`, `Error::MultipleProjects`, `Error::Yaml`,
    /// `Error::Io` or `Error::Zip`.
    pub fn write_config(&self, project: Option<&str>, config: Option<&serde_yaml::Value>) -> Result<(), Error> {
        return self.write_project_yaml(project, CONFIG_FILE, config);
    }

    /// Write the container's `media.yaml`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Yaml`, `Error::Io` or `Error::Zip`.
    pub fn write_media(&self, media: &MediaManifest) -> Result<(), Error> {
        return write_entry(self.store.as_ref(), MEDIA_FILE, media);
    }

    /// Write or delete a YAML file in a project directory.
    fn write_project_yaml<T: serde::Serialize>(
        &self,
        project: Option<&str>,
        file_name: &str,
        value: Option<&T>,
    ) -> Result<(), Error> {
        let dir = self
            .project_dir(project)?
            .ok_or_else(|| return unknown_project(project))?;
        let name = accessor::join_entry(&dir, file_name);
        let Some(value) = value else {
            return self.store.remove(&name);
        };
        return write_entry(self.store.as_ref(), &name, value);
    }

    /// Write the project `toc.yaml`. `None` or an empty table deletes it.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownProject`, `Error::MultipleProjects`, `Error::Yaml`,
    /// `Error::Io` or `Error::Zip`.
    pub fn write_toc(&self, project: Option<&str>, toc: Option<&TableOfContents>) -> Result<(), Error> {
        let toc = toc.filter(|t| return !t.contents.is_empty());
        return self.write_project_yaml(project, TOC_FILE, toc);
    }
}

/// Whether `path` names a zip archive by its extension.
fn is_zip_path(path: &Path) -> bool {
    return path
        .extension()
        .is_some_and(|ext| return ext.eq_ignore_ascii_case("zip"));
}

/// Read and deserialize a YAML entry that may not exist.
fn read_entry<T: for<'de> serde::Deserialize<'de>>(store: &dyn Accessor, name: &str) -> Result<Option<T>, Error> {
    let Some(text) = store.read(name)? else {
        return Ok(None);
    };
    return Ok(Some(serde_yaml::from_str(&text)?));
}

/// Check that a chapter or chunk names exactly one entry inside its parent.
fn single_segment(value: &str) -> Result<&str, Error> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => return Ok(value),
        _ => {
            return Err(Error::InvalidPath {
                path: value.to_string(),
                reason: "is not a single path segment".to_string(),
            });
        },
    }
}

/// Error for a write addressed to a project that does not exist.
fn unknown_project(identifier: Option<&str>) -> Error {
    return Error::UnknownProject {
        identifier: identifier.unwrap_or_default().to_string(),
    };
}

/// Serialize a value as YAML into a container entry.
fn write_entry<T: serde::Serialize>(store: &dyn Accessor, name: &str, value: &T) -> Result<(), Error> {
    let text = serde_yaml::to_string(value)?;
    return store.write(name, &text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{Content, Language, MediaProject};

    fn book_manifest(projects: &[&str]) -> Manifest {
        let mut manifest = Manifest::default();
        let dc = &mut manifest.dublin_core;
        dc.kind = "book".to_string();
        dc.format = "text/usfm".to_string();
        dc.identifier = "ulb".to_string();
        dc.language = Language {
            direction: "ltr".to_string(),
            identifier: "en".to_string(),
            title: "English".to_string(),
        };
        dc.rights = "CC BY-SA 4.0".to_string();
        manifest.projects = projects
            .iter()
            .map(|id| {
                return Project {
                    identifier: (*id).to_string(),
                    path: format!("./{id}"),
                    ..Project::default()
                };
            })
            .collect();
        return manifest;
    }

    fn write_manifest(dir: &Path, conforms_to: &str) {
        let mut manifest = book_manifest(&["gen"]);
        manifest.dublin_core.conforms_to = conforms_to.to_string();
        manifest.write(&dir.join(MANIFEST_FILE)).unwrap();
    }

    #[test]
    fn create_stamps_version_and_loads_strictly() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("en_ulb");
        let rc = ResourceContainer::create(&dir, book_manifest(&["gen"])).unwrap();
        assert_eq!(rc.conforms_to(), CONFORMS_TO);
        assert_eq!(rc.manifest().dublin_core.conforms_to, "rc0.2");

        let loaded = ResourceContainer::load(&dir, true).unwrap();
        assert_eq!(loaded.kind(), "book");
        assert_eq!(loaded.project_ids(), vec!["gen"]);
    }

    #[test]
    fn create_refuses_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ResourceContainer::create(tmp.path(), book_manifest(&["gen"])).unwrap_err();
        assert!(matches!(err, Error::ContainerExists { .. }));
    }

    #[test]
    fn create_names_the_missing_field() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manifest = book_manifest(&["gen"]);
        manifest.dublin_core.rights.clear();
        let err = ResourceContainer::create(&tmp.path().join("rc"), manifest).unwrap_err();
        match err {
            Error::InvalidContainer { reason } => assert_eq!(reason, "missing dublin_core.rights"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn strict_load_requires_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ResourceContainer::load(tmp.path(), true).unwrap_err();
        assert!(matches!(err, Error::ManifestNotFound { .. }));

        let lenient = ResourceContainer::load(tmp.path(), false).unwrap();
        assert_eq!(lenient.project_count(), 0);
        assert_eq!(lenient.project(None).unwrap(), None);
    }

    #[test]
    fn strict_load_checks_version() {
        let tmp = tempfile::tempdir().unwrap();

        write_manifest(tmp.path(), "");
        assert!(matches!(
            ResourceContainer::load(tmp.path(), true).unwrap_err(),
            Error::InvalidContainer { .. }
        ));

        write_manifest(tmp.path(), "rc0.1");
        assert!(matches!(
            ResourceContainer::load(tmp.path(), true).unwrap_err(),
            Error::OutdatedContainer { .. }
        ));

        write_manifest(tmp.path(), "rc0.3");
        assert!(matches!(
            ResourceContainer::load(tmp.path(), true).unwrap_err(),
            Error::UnsupportedContainer { .. }
        ));

        write_manifest(tmp.path(), "rc0.*");
        assert!(ResourceContainer::load(tmp.path(), true).is_ok());

        write_manifest(tmp.path(), "rc0.1");
        assert!(ResourceContainer::load(tmp.path(), false).is_ok());
    }

    #[test]
    fn project_lookup() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), book_manifest(&["gen", "exo"])).unwrap();

        assert_eq!(rc.project_count(), 2);
        assert_eq!(rc.project(Some("exo")).unwrap().map(|p| return p.identifier.as_str()), Some("exo"));
        assert_eq!(rc.project(Some("lev")).unwrap(), None);
        assert!(matches!(rc.project(None).unwrap_err(), Error::MultipleProjects { .. }));
    }

    #[test]
    fn chunk_ext_follows_format() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manifest = book_manifest(&["gen"]);
        manifest.dublin_core.format = "text/markdown".to_string();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), manifest).unwrap();
        assert_eq!(rc.chunk_ext(), "md");

        let other = ResourceContainer::create(&tmp.path().join("other"), {
            let mut m = book_manifest(&["gen"]);
            m.dublin_core.format = "application/pdf".to_string();
            m
        })
        .unwrap();
        assert_eq!(other.chunk_ext(), "txt");
    }

    #[test]
    fn chunks_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), book_manifest(&["gen"])).unwrap();

        rc.write_chunk(None, "02", "01", "\\v 1 Thus the heavens").unwrap();
        rc.write_chunk(None, "01", "03", "\\v 3 And God said").unwrap();
        rc.write_chunk(None, "01", "01", "\\v 1 In the beginning").unwrap();

        assert_eq!(rc.chapters(None).unwrap(), vec!["01", "02"]);
        assert_eq!(rc.chunks(None, "01").unwrap(), vec!["01", "03"]);
        assert_eq!(rc.read_chunk(None, "01", "03").unwrap(), "\\v 3 And God said");
        assert_eq!(rc.read_chunk(None, "01", "99").unwrap(), "");

        rc.write_chunk(None, "01", "03", "").unwrap();
        assert_eq!(rc.chunks(None, "01").unwrap(), vec!["01"]);
        assert!(tmp.path().join("rc/gen/01/01.usfm").is_file());
    }

    #[test]
    fn writing_to_unknown_project_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), book_manifest(&["gen"])).unwrap();
        let err = rc.write_chunk(Some("lev"), "01", "01", "text").unwrap_err();
        assert!(matches!(err, Error::UnknownProject { identifier } if identifier == "lev"));
        assert_eq!(rc.read_chunk(Some("lev"), "01", "01").unwrap(), "");
        assert!(rc.chapters(Some("lev")).unwrap().is_empty());
    }

    #[test]
    fn toc_and_config_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), book_manifest(&["gen"])).unwrap();
        assert_eq!(rc.toc(None).unwrap(), None);

        let toc = TableOfContents {
            contents: vec![Content {
                link: "01".to_string(),
                title: "Chapter 1".to_string(),
                ..Content::default()
            }],
        };
        rc.write_toc(None, Some(&toc)).unwrap();
        assert_eq!(rc.toc(None).unwrap(), Some(toc));

        rc.write_toc(None, Some(&TableOfContents::default())).unwrap();
        assert_eq!(rc.toc(None).unwrap(), None);

        let config: serde_yaml::Value = serde_yaml::from_str("content:\n  '01':\n    '01':\n      words: [god]\n").unwrap();
        rc.write_config(None, Some(&config)).unwrap();
        assert_eq!(rc.config(None).unwrap(), Some(config));
        rc.write_config(None, None).unwrap();
        assert_eq!(rc.config(None).unwrap(), None);
    }

    #[test]
    fn media_manifest_is_optional() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), book_manifest(&["gen"])).unwrap();
        assert_eq!(rc.media().unwrap(), None);

        let media = MediaManifest {
            projects: vec![MediaProject {
                identifier: "gen".to_string(),
                ..MediaProject::default()
            }],
            resource: None,
        };
        rc.write_media(&media).unwrap();
        assert_eq!(rc.media().unwrap(), Some(media));
    }

    #[test]
    fn chunk_names_cannot_leave_the_container() {
        let tmp = tempfile::tempdir().unwrap();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), book_manifest(&["gen"])).unwrap();
        let outside = tmp.path().join("outside");
        let outside_str = outside.to_str().unwrap();

        for (chapter, chunk) in [(outside_str, "01"), ("..", "01"), ("01/02", "03"), ("01", "../../x"), ("", "01"), (".", "01")] {
            let err = rc.write_chunk(None, chapter, chunk, "escaped").unwrap_err();
            assert!(matches!(err, Error::InvalidPath { .. }), "{chapter}/{chunk}: {err}");
        }
        assert!(!outside.exists());
        assert!(!tmp.path().join("x.usfm").exists());

        assert!(matches!(rc.read_chunk(None, "..", "01"), Err(Error::InvalidPath { .. })));
        assert!(matches!(rc.chunks(None, outside_str), Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn project_path_cannot_leave_the_container() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manifest = book_manifest(&["gen"]);
        manifest.projects[0].path = "../elsewhere".to_string();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), manifest).unwrap();
        assert!(matches!(rc.write_chunk(None, "01", "01", "x"), Err(Error::InvalidPath { .. })));
        assert!(!tmp.path().join("elsewhere").exists());
    }

    #[test]
    fn nested_project_paths_are_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let mut manifest = book_manifest(&["gen"]);
        manifest.projects[0].path = "./content/gen".to_string();
        let rc = ResourceContainer::create(&tmp.path().join("rc"), manifest).unwrap();
        rc.write_chunk(None, "01", "01", "\\v 1").unwrap();
        assert!(tmp.path().join("rc/content/gen/01/01.usfm").is_file());
        assert_eq!(rc.chapters(None).unwrap(), vec!["01"]);
    }

    #[test]
    fn zip_container_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("en_ulb.zip");
        let rc = ResourceContainer::create(&path, book_manifest(&["gen"])).unwrap();
        assert!(rc.is_archive());
        assert!(path.is_file());

        rc.write_chunk(None, "01", "01", "\\v 1 In the beginning").unwrap();
        rc.write_chunk(None, "01", "02", "\\v 2 And the earth").unwrap();
        rc.write_chunk(None, "02", "01", "\\v 1 Thus the heavens").unwrap();
        let toc = TableOfContents {
            contents: vec![Content {
                link: "01".to_string(),
                title: "Chapter 1".to_string(),
                ..Content::default()
            }],
        };
        rc.write_toc(None, Some(&toc)).unwrap();
        let config: serde_yaml::Value = serde_yaml::from_str("content: {}\n").unwrap();
        rc.write_config(None, Some(&config)).unwrap();

        let loaded = ResourceContainer::load(&path, true).unwrap();
        assert!(loaded.is_archive());
        assert_eq!(loaded.conforms_to(), CONFORMS_TO);
        assert_eq!(loaded.project_ids(), vec!["gen"]);
        assert_eq!(loaded.chapters(None).unwrap(), vec!["01", "02"]);
        assert_eq!(loaded.chunks(None, "01").unwrap(), vec!["01", "02"]);
        assert_eq!(loaded.read_chunk(None, "02", "01").unwrap(), "\\v 1 Thus the heavens");
        assert_eq!(loaded.toc(None).unwrap(), Some(toc));
        assert_eq!(loaded.config(None).unwrap(), Some(config));

        loaded.write_chunk(None, "01", "02", "").unwrap();
        loaded.write_config(None, None).unwrap();
        let reloaded = ResourceContainer::load(&path, true).unwrap();
        assert_eq!(reloaded.chunks(None, "01").unwrap(), vec!["01"]);
        assert_eq!(reloaded.config(None).unwrap(), None);
        assert_eq!(
            reloaded.files().unwrap(),
            vec!["gen/01/01.usfm", "gen/02/01.usfm", "gen/toc.yaml", "manifest.yaml"]
        );
    }

    #[test]
    fn zip_container_refuses_existing_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("rc.zip");
        ResourceContainer::create(&path, book_manifest(&["gen"])).unwrap();
        let err = ResourceContainer::create(&path, book_manifest(&["gen"])).unwrap_err();
        assert!(matches!(err, Error::ContainerExists { .. }));
    }

    #[test]
    fn strict_load_of_archive_without_manifest_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.zip");
        assert!(matches!(
            ResourceContainer::load(&path, true).unwrap_err(),
            Error::ManifestNotFound { .. }
        ));
        let lenient = ResourceContainer::load(&path, false).unwrap();
        assert!(lenient.files().unwrap().is_empty());
    }

    #[test]
    fn non_archive_file_is_a_zip_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "not a zip").unwrap();
        assert!(matches!(ResourceContainer::load(&path, true).unwrap_err(), Error::Zip(_)));
    }
}
