use std::fmt::Write as _;

use crate::container::CONFORMS_TO;
use crate::error::Error;

/// ANSI bold, applied to headings on stderr.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Markdown for a container whose format version is not the supported one.
fn render_container_version(title: &str, found: &str, fix: &str) -> String {
    return format!(
        "\
# Error: {title}

The container conforms to `rc{found}` but rclink reads `rc{CONFORMS_TO}`.

## Fix

{fix}
"
    );
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::InvalidLinkSyntax { reason, token } => render_invalid_link(token, reason),
        Error::MalformedPassage { argument, reason } => render_malformed_passage(argument, reason),
        Error::MultipleProjects { identifiers } => render_multiple_projects(identifiers),
        Error::OutdatedContainer { found, .. } => render_container_version(
            "Outdated Container",
            found,
            "Migrate the container to the current format and update `dublin_core.conformsto`.",
        ),
        Error::UnsupportedContainer { found, .. } => render_container_version(
            "Unsupported Container",
            found,
            "Upgrade rclink, or check `dublin_core.conformsto` in `manifest.yaml`.",
        ),
        _ => render_generic(e),
    };
}

/// Markdown for variants that need no dedicated layout.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::ContainerExists { path } => format!(
            "\
# Error: Container Exists

`{}` already exists.

## Fix

Choose a new directory, or load the existing container instead.
",
            path.display()
        ),

        Error::InvalidContainer { reason } => format!(
            "\
# Error: Invalid Container

The manifest is unusable: {reason}.

## Fix

Add the missing field to `manifest.yaml`.
"
        ),

        Error::ManifestNotFound { path } => format!(
            "\
# Error: Manifest Not Found

`{}` does not exist.

## Fix

Run rclink from the container root, or pass the container directory:

    rclink verify path/to/container
",
            path.display()
        ),

        Error::InvalidPath { path, reason } => format!(
            "\
# Error: Invalid Path

`{path}` {reason}.

## Fix

Chapters and chunks are single names such as `01`, and project paths stay
inside the container, e.g. `./gen`.
"
        ),

        Error::UnknownProject { identifier } => format!(
            "\
# Error: Unknown Project

No project `{identifier}` in the manifest.
"
        ),

        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::Json(e) => format!(
            "\
# Error: JSON

{e}
"
        ),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}

## Fix

Check `.rclink.toml`. Recognized keys: `include`, `exclude`, `extensions`, `autolink`.
"
        ),
        Error::Yaml(e) => format!(
            "\
# Error: Invalid YAML

{e}
"
        ),
        Error::Zip(e) => format!(
            "\
# Error: Invalid Archive

{e}

## Fix

Zip containers hold `manifest.yaml` at the archive root or in one top-level directory.
"
        ),
        // Already handled in render_error, but need exhaustive match.
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// Markdown for a link token that matches no surface form.
fn render_invalid_link(token: &str, reason: &str) -> String {
    return format!(
        "\
# Error: Invalid Link

`{token}` is not a link: {reason}.

## Accepted forms

- `[[language/project/resource/chapter:chunk]]`
- `[[language/project/chapter:chunk]]`
- `[[//project/resource]]`
- `[[chapter:chunk]]` or `[[slug]]`
- `[title](protocol:/language/project/resource)`
- `[title](https://example.org)`
"
    );
}

/// Markdown for a passage argument that breaks the passage grammar.
fn render_malformed_passage(argument: &str, reason: &str) -> String {
    let mut out = format!(
        "\
# Error: Malformed Passage

`{argument}` is not a single passage: {reason}.

## Fix

Write one passage per link as `chapter[:chunk[-lastChunk]]`, e.g. `01:02-06`.
"
    );
    if argument.contains(',') || argument.contains(';') {
        out.push_str("\nSplit lists into separate links:\n\n");
        for part in argument.split([',', ';']).map(str::trim).filter(|p| return !p.is_empty()) {
            let _ = writeln!(out, "    [[{part}]]");
        }
    }
    return out;
}

/// Markdown for a project lookup that needs an identifier.
fn render_multiple_projects(identifiers: &[String]) -> String {
    let mut out = "\
# Error: Multiple Projects

The container holds several projects and none was named.

## Projects

"
    .to_string();
    for id in identifiers {
        let _ = writeln!(out, "- `{id}`");
    }
    return out;
}
