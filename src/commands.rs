//! CLI commands for rclink: parse, scan, links, verify.

use std::io::Read as _;
use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use crate::autolink;
use crate::config::Config;
use crate::container::ResourceContainer;
use crate::diagnostics;
use crate::error::Error;
use crate::link;
use crate::types::Reference;

/// Exit code when a container fails strict validation.
const EXIT_INVALID_CONTAINER: u8 = 2;

/// Exit code when a link or passage fails to parse.
const EXIT_PARSE_FAILURE: u8 = 1;

/// One explicit link or implicit citation found in a content file.
#[derive(Debug, Serialize)]
struct Finding {
    /// Why a malformed link was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    /// Path relative to the container root.
    file: String,
    /// What was found.
    kind: FindingKind,
    /// 1-based line number.
    line: usize,
    /// The parsed reference; absent when malformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<Reference>,
    /// Source text of an explicit link token.
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Kind of a [`Finding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum FindingKind {
    /// Implicit scripture citation in prose.
    Citation,
    /// Well-formed explicit link.
    Link,
    /// Explicit link token that failed to parse.
    Malformed,
}

/// Per-project line of a verification report.
#[derive(Debug, Serialize)]
struct ProjectSummary {
    /// Number of chapter directories.
    chapters: usize,
    /// Project slug.
    identifier: String,
    /// Human-readable title.
    title: String,
}

/// Result of a successful strict load.
#[derive(Debug, Serialize)]
struct VerifyReport {
    /// Format version without the `rc` prefix.
    conforms_to: String,
    /// Resource slug.
    identifier: String,
    /// Resource type.
    kind: String,
    /// Language slug.
    language: String,
    /// Projects in manifest order.
    projects: Vec<ProjectSummary>,
}

impl FindingKind {
    /// Fixed-width label for text output.
    const fn label(self) -> &'static str {
        return match self {
            Self::Citation => "CITE     ",
            Self::Link => "LINK     ",
            Self::Malformed => "MALFORMED",
        };
    }
}

/// Walk a container's content files and collect their links and citations.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Zip` if the container cannot be listed or a
/// content file cannot be read.
fn collect_findings(container: &ResourceContainer, config: &Config) -> Result<Vec<Finding>, Error> {
    let mut findings = Vec::new();

    for relative in container.files()? {
        if !config.has_content_extension(Path::new(&relative)) {
            continue;
        }
        if !config.should_scan(&relative) {
            tracing::trace!(file = %relative, "excluded by config");
            continue;
        }

        tracing::debug!(file = %relative, "scanning content file");
        let content = container.read_file(&relative)?.unwrap_or_default();
        findings_in_content(&relative, &content, config.autolink(), &mut findings);
    }

    return Ok(findings);
}

/// Collect findings from one file, line by line.
///
/// Explicit link tokens are blanked out before the citation scan so a
/// titled link's label is not reported a second time as prose.
fn findings_in_content(file: &str, content: &str, autolink: bool, findings: &mut Vec<Finding>) {
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx.saturating_add(1);
        let mut prose = line.to_string();

        for token in link::link_tokens(line) {
            let finding = match link::parse(token.token) {
                Ok(reference) => Finding {
                    error: None,
                    file: file.to_string(),
                    kind: FindingKind::Link,
                    line: line_no,
                    reference: Some(reference),
                    token: Some(token.token.to_string()),
                },
                Err(e) => Finding {
                    error: Some(e.to_string()),
                    file: file.to_string(),
                    kind: FindingKind::Malformed,
                    line: line_no,
                    reference: None,
                    token: Some(token.token.to_string()),
                },
            };
            findings.push(finding);
            let blank = " ".repeat(token.span.len());
            prose.replace_range(token.span, &blank);
        }

        if autolink {
            findings.extend(autolink::scan(&prose).into_iter().map(|reference| {
                return Finding {
                    error: None,
                    file: file.to_string(),
                    kind: FindingKind::Citation,
                    line: line_no,
                    reference: Some(reference),
                    token: None,
                };
            }));
        }
    }
    return;
}

/// Whether an error means the container itself is invalid rather than unreadable.
const fn is_container_error(e: &Error) -> bool {
    return matches!(
        e,
        Error::InvalidContainer { .. }
            | Error::ManifestNotFound { .. }
            | Error::OutdatedContainer { .. }
            | Error::UnsupportedContainer { .. }
            | Error::Yaml(_)
            | Error::Zip(_)
    );
}

/// Report every explicit link and, if enabled, every implicit citation in a
/// container's content files. `root` is a container directory or zip archive.
/// Malformed links are reported without stopping the walk, and make the
/// command exit 1.
///
/// # Errors
///
/// Returns errors from config loading, manifest reading, or file I/O.
pub fn links(root: &Path, json: bool) -> Result<ExitCode, Error> {
    let container = ResourceContainer::load(root, false)?;
    let config = Config::load(&container)?;
    tracing::info!(
        container = %container.path().display(),
        archive = container.is_archive(),
        identifier = %container.manifest().dublin_core.identifier,
        "collecting links"
    );

    let findings = collect_findings(&container, &config)?;
    let malformed = findings.iter().filter(|f| return f.kind == FindingKind::Malformed).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        for finding in &findings {
            print_finding(finding);
        }
        let citations = findings.iter().filter(|f| return f.kind == FindingKind::Citation).count();
        let explicit = findings
            .len()
            .saturating_sub(citations)
            .saturating_sub(malformed);
        eprintln!();
        eprintln!("{explicit} links, {citations} citations, {malformed} malformed");
    }

    if malformed > 0 {
        return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
    }
    return Ok(ExitCode::SUCCESS);
}

/// Parse one explicit link token and print its fields.
///
/// # Errors
///
/// Returns `Error::Json` if JSON output fails. Parse failures are rendered
/// as diagnostics and reported through the exit code instead.
pub fn parse(token: &str, json: bool) -> Result<ExitCode, Error> {
    let reference = match link::parse(token) {
        Ok(reference) => reference,
        Err(e @ (Error::InvalidLinkSyntax { .. } | Error::MalformedPassage { .. })) => {
            diagnostics::print_error(&e);
            return Ok(ExitCode::from(EXIT_PARSE_FAILURE));
        },
        Err(e) => return Err(e),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reference)?);
    } else {
        print_reference(&reference);
    }
    return Ok(ExitCode::SUCCESS);
}

/// Print one finding as a text line.
fn print_finding(finding: &Finding) {
    let location = format!("{}:{}", finding.file, finding.line);
    let label = finding.kind.label();
    match (&finding.reference, &finding.token, &finding.error) {
        (Some(reference), Some(token), _) => println!("{label}  {location}  {token} -> {reference}"),
        (Some(reference), None, _) => println!("{label}  {location}  {reference}"),
        (None, token, error) => println!(
            "{label}  {location}  {} ({})",
            token.as_deref().unwrap_or_default(),
            error.as_deref().unwrap_or_default()
        ),
    }
    return;
}

/// Print the present fields of a reference, one `name: value` per line.
fn print_reference(reference: &Reference) {
    let passage_title = reference.passage_title();
    let fields = [
        ("title", reference.title()),
        ("url", reference.url()),
        ("protocol", reference.protocol()),
        ("language", reference.language()),
        ("project", reference.project()),
        ("resource", reference.resource()),
        ("arguments", reference.arguments()),
        ("chapter", reference.chapter()),
        ("chunk", reference.chunk()),
        ("last_chunk", reference.last_chunk()),
        ("passage_title", passage_title.as_deref()),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            println!("{name}: {value}");
        }
    }
    println!("external: {}", reference.is_external());
    println!("media: {}", reference.is_media());
    println!("passage: {}", reference.is_passage());
    return;
}

/// Scan prose for implicit citations. Reads stdin when no file is given.
///
/// # Errors
///
/// Returns `Error::Io` if the input cannot be read, or `Error::Json` if JSON output fails.
pub fn scan(file: Option<&Path>, json: bool) -> Result<(), Error> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        },
    };

    let references = autolink::scan(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&references)?);
        return Ok(());
    }

    for reference in &references {
        println!(
            "{} {}",
            reference.project().unwrap_or_default(),
            reference.arguments().unwrap_or_default()
        );
    }
    return Ok(());
}

/// Strictly load a container and summarize it. Exits 2 if the container is
/// missing its manifest or conforms to an unsupported format version.
///
/// # Errors
///
/// Returns `Error::Io` if a project directory cannot be read, or `Error::Json`
/// if JSON output fails.
pub fn verify(root: &Path, json: bool) -> Result<ExitCode, Error> {
    let container = match ResourceContainer::load(root, true) {
        Ok(container) => container,
        Err(e) if is_container_error(&e) => {
            tracing::info!(error = %e, "container failed validation");
            diagnostics::print_error(&e);
            return Ok(ExitCode::from(EXIT_INVALID_CONTAINER));
        },
        Err(e) => return Err(e),
    };

    let dc = &container.manifest().dublin_core;
    let mut projects = Vec::new();
    for project in &container.manifest().projects {
        projects.push(ProjectSummary {
            chapters: container.chapters(Some(project.identifier.as_str()))?.len(),
            identifier: project.identifier.clone(),
            title: project.title.clone(),
        });
    }
    let report = VerifyReport {
        conforms_to: container.conforms_to().to_string(),
        identifier: dc.identifier.clone(),
        kind: container.kind().to_string(),
        language: dc.language.identifier.clone(),
        projects,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!(
        "VALID  {}_{} ({}, rc{})",
        report.language, report.identifier, report.kind, report.conforms_to
    );
    for project in &report.projects {
        println!("  {}  {}  {} chapters", project.identifier, project.title, project.chapters);
    }
    return Ok(ExitCode::SUCCESS);
}
