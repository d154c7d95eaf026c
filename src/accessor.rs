//! Container storage: plain directories and zip archives.
//!
//! Entry names are relative to the container root and use `/` separators.
//! Every name is normalized before it reaches the backend, so `./gen/01`
//! and `gen/01` address the same entry and nothing can name a path outside
//! the container.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::Debug;
use std::fs;
use std::io::{self, Read as _, Write as _};
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::Error;
use crate::manifest::MANIFEST_FILE;

/// A container stored as a directory tree.
#[derive(Debug, Clone)]
pub struct DirAccessor {
    /// Container root directory.
    root: PathBuf,
}

/// One direct child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Whether the child is a directory.
    pub is_dir: bool,
    /// Name of the child, without its parent path.
    pub name: String,
}

/// A container stored as a zip archive.
///
/// The container root is either the archive root or a single top-level
/// directory holding `manifest.yaml`. Writes rebuild the archive in a
/// sibling temporary file and rename it into place.
#[derive(Debug, Clone)]
pub struct ZipAccessor {
    /// Archive file on disk; may not exist until the first write.
    path: PathBuf,
    /// Directory inside the archive that holds the container, empty for the root.
    prefix: String,
}

/// Read and write access to the files of one container.
pub trait Accessor: Debug + Send + Sync {
    /// Every file in the container as a `/`-separated name, sorted.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io`/`Error::Zip` if the storage cannot be read.
    fn files(&self) -> Result<Vec<String>, Error>;

    /// Direct children of `dir`, sorted by name. A missing directory, or a
    /// name that is a file, lists nothing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `dir` leaves the container, or
    /// `Error::Io`/`Error::Zip` if the storage cannot be read.
    fn list(&self, dir: &str) -> Result<Vec<Entry>, Error>;

    /// Contents of a file, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `name` leaves the container, or
    /// `Error::Io`/`Error::Zip` if the file exists but cannot be read.
    fn read(&self, name: &str) -> Result<Option<String>, Error>;

    /// Delete a file. Deleting a missing file succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath`, `Error::Io` or `Error::Zip`.
    fn remove(&self, name: &str) -> Result<(), Error>;

    /// Create or replace a file, creating its parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath`, `Error::Io` or `Error::Zip`.
    fn write(&self, name: &str, contents: &str) -> Result<(), Error>;
}

impl DirAccessor {
    /// Access the container rooted at `root`.
    pub fn new(root: &Path) -> Self {
        return Self {
            root: root.to_path_buf(),
        };
    }

    /// Filesystem path of a container entry.
    fn resolve(&self, name: &str) -> Result<PathBuf, Error> {
        return Ok(self.root.join(normalize(name)?));
    }
}

impl Accessor for DirAccessor {
    fn files(&self) -> Result<Vec<String>, Error> {
        let mut files: Vec<String> = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| return e.file_type().is_file())
            .filter_map(|e| {
                let relative = e.path().strip_prefix(&self.root).ok()?;
                return Some(relative.to_string_lossy().replace('\\', "/"));
            })
            .collect();
        files.sort();
        return Ok(files);
    }

    fn list(&self, dir: &str) -> Result<Vec<Entry>, Error> {
        let entries = match fs::read_dir(self.resolve(dir)?) {
            Ok(entries) => entries,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                return Ok(Vec::new());
            },
            Err(e) => return Err(e.into()),
        };
        let mut children = Vec::new();
        for entry in entries {
            let entry = entry?;
            children.push(Entry {
                is_dir: entry.file_type()?.is_dir(),
                name: entry.file_name().to_string_lossy().into_owned(),
            });
        }
        children.sort_by(|a, b| return a.name.cmp(&b.name));
        return Ok(children);
    }

    fn read(&self, name: &str) -> Result<Option<String>, Error> {
        match fs::read_to_string(self.resolve(name)?) {
            Ok(text) => return Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }

    fn remove(&self, name: &str) -> Result<(), Error> {
        match fs::remove_file(self.resolve(name)?) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
            _ => return Ok(()),
        }
    }

    fn write(&self, name: &str, contents: &str) -> Result<(), Error> {
        let file = self.resolve(name)?;
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file, contents)?;
        return Ok(());
    }
}

impl ZipAccessor {
    /// The archive, or `None` when the file does not exist yet.
    fn archive(&self) -> Result<Option<ZipArchive<fs::File>>, Error> {
        match fs::File::open(&self.path) {
            Ok(file) => return Ok(Some(ZipArchive::new(file)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }

    /// Archive entry name of a container entry.
    fn entry_name(&self, name: &str) -> Result<String, Error> {
        return Ok(join_entry(&self.prefix, &normalize(name)?));
    }

    /// Access a new archive at `path`, with the container at its root.
    pub fn new(path: &Path) -> Self {
        return Self {
            path: path.to_path_buf(),
            prefix: String::new(),
        };
    }

    /// Open the archive at `path` and locate the container inside it.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be opened, or `Error::Zip` if it
    /// is not a zip archive.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let mut accessor = Self::new(path);
        let Some(archive) = accessor.archive()? else {
            return Ok(accessor);
        };
        if archive.index_for_name(MANIFEST_FILE).is_some() {
            return Ok(accessor);
        }
        let nested = archive.file_names().find_map(|name| {
            let (dir, file) = name.split_once('/')?;
            return (file == MANIFEST_FILE && !dir.is_empty()).then(|| return dir.to_string());
        });
        if let Some(dir) = nested {
            tracing::debug!(path = %path.display(), prefix = %dir, "container is nested in the archive");
            accessor.prefix = dir;
        }
        return Ok(accessor);
    }

    /// Every file in the archive with its bytes, in archive order.
    fn read_all(&self) -> Result<Vec<(String, Vec<u8>)>, Error> {
        let Some(mut archive) = self.archive()? else {
            return Ok(Vec::new());
        };
        let mut files = Vec::new();
        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            files.push((file.name().to_string(), data));
        }
        return Ok(files);
    }

    /// Replace the archive with `files`.
    fn write_all(&self, files: &[(String, Vec<u8>)]) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut writer = ZipWriter::new(fs::File::create(&tmp)?);
        let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
        for (name, data) in files {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }
        writer.finish()?;

        fs::rename(&tmp, &self.path)?;
        tracing::trace!(path = %self.path.display(), files = files.len(), "rewrote archive");
        return Ok(());
    }
}

impl Accessor for ZipAccessor {
    fn files(&self) -> Result<Vec<String>, Error> {
        let Some(archive) = self.archive()? else {
            return Ok(Vec::new());
        };
        let mut files: Vec<String> = archive
            .file_names()
            .filter(|name| return !name.ends_with('/'))
            .filter_map(|name| {
                if self.prefix.is_empty() {
                    return Some(name.to_string());
                }
                let rest = name.strip_prefix(self.prefix.as_str())?.strip_prefix('/')?;
                return Some(rest.to_string());
            })
            .collect();
        files.sort();
        return Ok(files);
    }

    fn list(&self, dir: &str) -> Result<Vec<Entry>, Error> {
        let Some(archive) = self.archive()? else {
            return Ok(Vec::new());
        };
        let dir = self.entry_name(dir)?;
        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        for name in archive.file_names() {
            let rest = if dir.is_empty() {
                Some(name)
            } else {
                name.strip_prefix(dir.as_str()).and_then(|r| return r.strip_prefix('/'))
            };
            let Some(rest) = rest.filter(|r| return !r.is_empty()) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    children.insert(child.to_string(), true);
                },
                None => {
                    children.entry(rest.to_string()).or_insert(false);
                },
            }
        }
        return Ok(children
            .into_iter()
            .map(|(name, is_dir)| return Entry { is_dir, name })
            .collect());
    }

    fn read(&self, name: &str) -> Result<Option<String>, Error> {
        let entry = self.entry_name(name)?;
        let Some(mut archive) = self.archive()? else {
            return Ok(None);
        };
        let mut file = match archive.by_name(&entry) {
            Ok(file) => file,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut text = String::new();
        file.read_to_string(&mut text)?;
        return Ok(Some(text));
    }

    fn remove(&self, name: &str) -> Result<(), Error> {
        let entry = self.entry_name(name)?;
        let mut files = self.read_all()?;
        let before = files.len();
        files.retain(|(n, _)| return *n != entry);
        if files.len() == before {
            return Ok(());
        }
        return self.write_all(&files);
    }

    fn write(&self, name: &str, contents: &str) -> Result<(), Error> {
        let entry = self.entry_name(name)?;
        let mut files = self.read_all()?;
        let data = contents.as_bytes().to_vec();
        match files.iter_mut().find(|(n, _)| return *n == entry) {
            Some(slot) => slot.1 = data,
            None => files.push((entry, data)),
        }
        return self.write_all(&files);
    }
}

/// Join a directory entry name and a child name.
pub(crate) fn join_entry(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        return name.to_string();
    }
    if name.is_empty() {
        return dir.to_string();
    }
    return format!("{dir}/{name}");
}

/// Normalize a container-relative path to `/`-separated form.
///
/// `.` segments are dropped. `..`, roots and drive prefixes are rejected.
///
/// # Errors
///
/// Returns `Error::InvalidPath` if the path could leave the container.
pub(crate) fn normalize(path: &str) -> Result<String, Error> {
    let mut segments: Vec<Cow<'_, str>> = Vec::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {},
            Component::Normal(segment) => segments.push(segment.to_string_lossy()),
            Component::ParentDir | Component::Prefix(_) | Component::RootDir => {
                return Err(Error::InvalidPath {
                    path: path.to_string(),
                    reason: "leaves the container".to_string(),
                });
            },
        }
    }
    return Ok(segments.join("/"));
}
