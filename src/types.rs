/// Core domain types for rclink references.
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::Error;
use crate::passage;

/// Schemes that make a link external rather than a media link.
const WEB_SCHEMES: [&str; 2] = ["http", "https"];

/// Structured decomposition of one explicit link or implicit citation.
///
/// Built once by the parser or the scanner and never mutated afterwards.
/// `external`, `media` and `passage` are derived from the stored fields on
/// every call, so they cannot drift from the data they describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Raw trailing argument, e.g. `01:02-06` or an abbreviated slug.
    arguments: Option<String>,
    /// Chapter decomposed from `arguments`.
    chapter: Option<String>,
    /// First chunk (verse) decomposed from `arguments`.
    chunk: Option<String>,
    /// Source-language slug; absent for the any-language form.
    language: Option<String>,
    /// Last chunk of a chunk range.
    last_chunk: Option<String>,
    /// Project or book slug. Implicit citations keep the book name as typed.
    project: Option<String>,
    /// Media scheme such as `image` or `audio`.
    protocol: Option<String>,
    /// Resource slug; defaults to the project for the shorthand forms.
    resource: Option<String>,
    /// Display label of a titled link.
    title: Option<String>,
    /// Verbatim address of an external link.
    url: Option<String>,
}

/// Field values for a container-style reference before the passage is decomposed.
#[derive(Debug, Default)]
pub(crate) struct ReferenceParts {
    /// Raw trailing argument handed to the decomposer.
    pub arguments: Option<String>,
    /// Source-language slug.
    pub language: Option<String>,
    /// Project or book slug.
    pub project: Option<String>,
    /// Media scheme.
    pub protocol: Option<String>,
    /// Resource slug.
    pub resource: Option<String>,
    /// Display label.
    pub title: Option<String>,
}

/// Serialized shape of a reference, derived flags included.
#[derive(Serialize)]
struct ReferenceRecord<'a> {
    /// See [`Reference::arguments`].
    arguments: Option<&'a str>,
    /// See [`Reference::chapter`].
    chapter: Option<&'a str>,
    /// See [`Reference::chunk`].
    chunk: Option<&'a str>,
    /// See [`Reference::is_external`].
    external: bool,
    /// See [`Reference::language`].
    language: Option<&'a str>,
    /// See [`Reference::last_chunk`].
    last_chunk: Option<&'a str>,
    /// See [`Reference::is_media`].
    media: bool,
    /// See [`Reference::is_passage`].
    passage: bool,
    /// See [`Reference::project`].
    project: Option<&'a str>,
    /// See [`Reference::protocol`].
    protocol: Option<&'a str>,
    /// See [`Reference::resource`].
    resource: Option<&'a str>,
    /// See [`Reference::title`].
    title: Option<&'a str>,
    /// See [`Reference::url`].
    url: Option<&'a str>,
}

impl Reference {
    /// Raw trailing argument string.
    pub fn arguments(&self) -> Option<&str> {
        return self.arguments.as_deref();
    }

    /// Chapter component of the passage argument.
    pub fn chapter(&self) -> Option<&str> {
        return self.chapter.as_deref();
    }

    /// First chunk of the passage argument.
    pub fn chunk(&self) -> Option<&str> {
        return self.chunk.as_deref();
    }

    /// Build an external link to an absolute http(s) address.
    pub(crate) const fn external(title: Option<String>, url: String) -> Self {
        return Self {
            arguments: None,
            chapter: None,
            chunk: None,
            language: None,
            last_chunk: None,
            project: None,
            protocol: None,
            resource: None,
            title,
            url: Some(url),
        };
    }

    /// Build a container-style reference, decomposing the passage argument.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPassage` if the argument violates the passage grammar.
    pub(crate) fn from_parts(parts: ReferenceParts) -> Result<Self, Error> {
        let decomposed = parts
            .arguments
            .as_deref()
            .map(passage::decompose)
            .transpose()?;
        let (chapter, chunk, last_chunk) = match decomposed {
            None => (None, None, None),
            Some(p) => (Some(p.chapter), p.chunk, p.last_chunk),
        };

        return Ok(Self {
            arguments: parts.arguments,
            chapter,
            chunk,
            language: parts.language,
            last_chunk,
            project: parts.project,
            protocol: parts.protocol,
            resource: parts.resource,
            title: parts.title,
            url: None,
        });
    }

    /// True iff the reference points at an absolute http(s) address.
    pub fn is_external(&self) -> bool {
        return self.url.as_deref().is_some_and(is_web_url);
    }

    /// True iff the reference carries a non-web media scheme.
    pub fn is_media(&self) -> bool {
        return self
            .protocol
            .as_deref()
            .is_some_and(|p| return !WEB_SCHEMES.contains(&p));
    }

    /// True iff the argument named a chunk, i.e. it contained a `:`.
    /// A bare chapter cannot be told apart from an abbreviated slug, so it is not a passage.
    pub const fn is_passage(&self) -> bool {
        return self.chapter.is_some() && self.chunk.is_some();
    }

    /// Source-language slug.
    pub fn language(&self) -> Option<&str> {
        return self.language.as_deref();
    }

    /// Last chunk of a chunk range.
    pub fn last_chunk(&self) -> Option<&str> {
        return self.last_chunk.as_deref();
    }

    /// The formatted passage, e.g. `1:2-3`, with leading zeros removed.
    /// Returns `None` when the reference is not a passage.
    pub fn passage_title(&self) -> Option<String> {
        let (Some(chapter), Some(chunk)) = (self.chapter.as_deref(), self.chunk.as_deref()) else {
            return None;
        };
        let tail = self
            .last_chunk
            .as_deref()
            .map(|last| return format!("-{}", format_number(last)))
            .unwrap_or_default();
        return Some(format!("{}:{}{tail}", format_number(chapter), format_number(chunk)));
    }

    /// Project or book slug.
    pub fn project(&self) -> Option<&str> {
        return self.project.as_deref();
    }

    /// Media scheme.
    pub fn protocol(&self) -> Option<&str> {
        return self.protocol.as_deref();
    }

    /// Resource slug.
    pub fn resource(&self) -> Option<&str> {
        return self.resource.as_deref();
    }

    /// Display label of a titled link.
    pub fn title(&self) -> Option<&str> {
        return self.title.as_deref();
    }

    /// Render the link body without the surrounding brackets.
    fn to_body(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let mut segments: Vec<&str> = Vec::new();
        if let Some(project) = self.project.as_deref() {
            segments.push(self.language.as_deref().unwrap_or(""));
            segments.push(project);
            if let Some(resource) = self.resource.as_deref() {
                segments.push(resource);
            }
        }
        if let Some(arguments) = self.arguments.as_deref() {
            segments.push(arguments);
        }

        let mut path = segments.join("/");
        if self.project.is_some() && self.language.is_none() {
            path.insert(0, '/');
        }

        return match (self.protocol.as_deref(), self.language.is_some()) {
            (None, _) => path,
            (Some(protocol), false) => format!("{protocol}:{path}"),
            (Some(protocol), true) => format!("{protocol}:/{path}"),
        };
    }

    /// Verbatim address of an external link.
    pub fn url(&self) -> Option<&str> {
        return self.url.as_deref();
    }
}

impl fmt::Display for Reference {
    /// Render as a link token: `[title](body)` when titled, `[[body]]` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body = self.to_body();
        return match self.title.as_deref() {
            None => write!(f, "[[{body}]]"),
            Some(title) => write!(f, "[{title}]({body})"),
        };
    }
}

impl Serialize for Reference {
    /// Serialize stored fields plus the derived flags.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = ReferenceRecord {
            arguments: self.arguments(),
            chapter: self.chapter(),
            chunk: self.chunk(),
            external: self.is_external(),
            language: self.language(),
            last_chunk: self.last_chunk(),
            media: self.is_media(),
            passage: self.is_passage(),
            project: self.project(),
            protocol: self.protocol(),
            resource: self.resource(),
            title: self.title(),
            url: self.url(),
        };
        return record.serialize(serializer);
    }
}

/// Format a passage component as a number without leading zeros,
/// or trimmed and lowercased when it is not numeric.
fn format_number(value: &str) -> String {
    return value
        .trim()
        .parse::<u64>()
        .map_or_else(|_err| return value.trim().to_lowercase(), |n| return n.to_string());
}

/// Whether `value` begins with an http or https scheme.
pub(crate) fn is_web_url(value: &str) -> bool {
    return value.starts_with("http://") || value.starts_with("https://");
}
