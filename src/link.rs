//! Explicit link parsing: `[[body]]` and `[title](body)` tokens.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;
use crate::types::{Reference, ReferenceParts, is_web_url};

/// A whole token of the anonymous form `[[body]]`.
#[allow(clippy::expect_used, reason = "regex literals are compile-time invariants")]
static ANONYMOUS: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"(?s)^\[\[([^\]]*)\]\]$").expect("valid regex"));

/// Any link token embedded in a text body, anonymous form first.
#[allow(clippy::expect_used, reason = "regex literals are compile-time invariants")]
static LINK_TOKEN: Lazy<Regex> = Lazy::new(|| {
    return Regex::new(r"\[\[[^\]]*\]\]|\[[^\]\[]*\]\([^\)]*\)").expect("valid regex");
});

/// A media scheme prefix. Must start with a letter so `01:02` stays a passage.
/// Pulls off one leading `/` so the language lands in the first segment.
#[allow(clippy::expect_used, reason = "regex literals are compile-time invariants")]
static SCHEME: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"(?s)^([a-z][a-z0-9+.\-]*):/?(.*)$").expect("valid regex"));

/// A whole token of the titled form `[title](body)`.
#[allow(clippy::expect_used, reason = "regex literals are compile-time invariants")]
static TITLED: Lazy<Regex> =
    Lazy::new(|| return Regex::new(r"(?s)^\[([^\]]*)\]\(([^\)]*)\)$").expect("valid regex"));

/// A link token located inside a larger text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkToken<'a> {
    /// Byte range of the token within the searched text.
    pub span: Range<usize>,
    /// The token text including its brackets.
    pub token: &'a str,
}

/// Path segments of a container link once the scheme is stripped.
#[derive(Debug, Default)]
struct Segments {
    /// Trailing passage or slug argument.
    arguments: Option<String>,
    /// Language slug; `None` for the any-language form.
    language: Option<String>,
    /// Project slug.
    project: Option<String>,
    /// Resource slug.
    resource: Option<String>,
}

/// Parse every link token in `text`, in textual order.
///
/// # Errors
///
/// Returns the first `Error::InvalidLinkSyntax` or `Error::MalformedPassage`
/// raised by a token.
pub fn find_links(text: &str) -> Result<Vec<Reference>, Error> {
    return link_tokens(text).map(|t| return parse(t.token)).collect();
}

/// Invalid-syntax error for `token`.
fn invalid(token: &str, reason: &str) -> Error {
    return Error::InvalidLinkSyntax {
        reason: reason.to_string(),
        token: token.to_string(),
    };
}

/// Locate the link tokens in `text` without parsing them.
pub fn link_tokens(text: &str) -> impl Iterator<Item = LinkToken<'_>> {
    return LINK_TOKEN.find_iter(text).map(|m| {
        return LinkToken {
            span: m.range(),
            token: m.as_str(),
        };
    });
}

/// Map an empty string to `None`.
fn non_empty(value: &str) -> Option<String> {
    return (!value.is_empty()).then(|| return value.to_string());
}

/// Parse one link token into a reference.
///
/// Recognizes `[[body]]` and `[title](body)`. The body is lowercased and then
/// read as an absolute URL, a `scheme:` media path, or a plain container path.
///
/// # Errors
///
/// Returns `Error::InvalidLinkSyntax` if the token matches neither form or its
/// path cannot be segmented, and `Error::MalformedPassage` if its passage
/// argument is malformed.
pub fn parse(token: &str) -> Result<Reference, Error> {
    let trimmed = token.trim();

    if let Some(caps) = ANONYMOUS.captures(trimmed) {
        let body = caps.get(1).map_or("", |m| return m.as_str());
        return parse_body(None, body);
    }

    if let Some(caps) = TITLED.captures(trimmed) {
        let title = caps.get(1).map_or("", |m| return m.as_str());
        let body = caps.get(2).map_or("", |m| return m.as_str());
        return parse_body(Some(title), body);
    }

    return Err(invalid(token, "expected `[[body]]` or `[title](body)`"));
}

/// Parse the inside of a link token, with an optional title.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_body(title: Option<&str>, body: &str) -> Result<Reference, Error> {
    let title = title.map(str::trim).and_then(non_empty);
    let body = body.trim().to_lowercase();

    if body.is_empty() {
        return Err(invalid(&body, "empty link body"));
    }

    if is_web_url(&body) {
        return Ok(Reference::external(title, body));
    }

    let (protocol, path) = match SCHEME.captures(&body) {
        None => (None, body.strip_prefix('/').unwrap_or(&body)),
        Some(caps) => (
            caps.get(1).map(|m| return m.as_str().to_string()),
            caps.get(2).map_or("", |m| return m.as_str()),
        ),
    };

    let mut segments: Vec<&str> = path.split('/').collect();
    while segments.last().is_some_and(|s| return s.is_empty()) {
        segments.pop();
    }

    let parts = segment_path(&segments).map_err(|reason| return invalid(&body, reason))?;
    tracing::trace!(body = %body, segments = segments.len(), "parsed link path");

    return Reference::from_parts(ReferenceParts {
        arguments: parts.arguments,
        language: parts.language,
        project: parts.project,
        protocol,
        resource: parts.resource,
        title,
    });
}

/// Assign path segments to language, project, resource and arguments.
///
/// # Errors
///
/// Returns a reason string when the segment count or an empty segment makes
/// the path unreadable.
fn segment_path(segments: &[&str]) -> Result<Segments, &'static str> {
    let segmented = match *segments {
        [] => return Err("empty link path"),
        [arguments] => {
            return Ok(Segments {
                arguments: non_empty(arguments),
                ..Segments::default()
            });
        },
        [language, project] => (language, project, project, None),
        [language, project, arguments] if arguments.contains(':') => {
            (language, project, project, Some(arguments))
        },
        [language, project, resource] => (language, project, resource, None),
        [language, project, resource, arguments] => (language, project, resource, Some(arguments)),
        _ => return Err("more than four path segments"),
    };

    let (language, project, resource, arguments) = segmented;
    if project.is_empty() {
        return Err("missing project segment");
    }
    if resource.is_empty() {
        return Err("missing resource segment");
    }

    return Ok(Segments {
        arguments: arguments.and_then(non_empty),
        language: non_empty(language),
        project: Some(project.to_string()),
        resource: Some(resource.to_string()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_container_link() {
        let l = parse("[[language/project/resource]]").unwrap();
        assert_eq!(l.title(), None);
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), None);
        assert!(!l.is_external());
        assert!(!l.is_media());
        assert!(!l.is_passage());
    }

    #[test]
    fn anonymous_https_link() {
        let l = parse("[[https://www.google.com]]").unwrap();
        assert_eq!(l.title(), None);
        assert_eq!(l.url(), Some("https://www.google.com"));
        assert!(l.is_external());
        assert!(!l.is_media());
        assert!(!l.is_passage());
    }

    #[test]
    fn anonymous_http_link() {
        let l = parse("[[http://www.google.com]]").unwrap();
        assert_eq!(l.title(), None);
        assert_eq!(l.url(), Some("http://www.google.com"));
        assert_eq!(l.language(), None);
        assert!(l.is_external());
        assert!(!l.is_media());
        assert!(!l.is_passage());
    }

    #[test]
    fn anonymous_shorthand_resource_link() {
        let l = parse("[[language/project]]").unwrap();
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("project"));
        assert_eq!(l.arguments(), None);
    }

    #[test]
    fn anonymous_abbreviated_link() {
        let l = parse("[[slug]]").unwrap();
        assert_eq!(l.language(), None);
        assert_eq!(l.project(), None);
        assert_eq!(l.resource(), None);
        assert_eq!(l.arguments(), Some("slug"));
        assert!(!l.is_passage());
    }

    #[test]
    fn anonymous_any_language_link() {
        let l = parse("[[//project/resource/args]]").unwrap();
        assert_eq!(l.language(), None);
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), Some("args"));
        assert!(!l.is_passage());
    }

    #[test]
    fn anonymous_any_language_no_args_link() {
        let l = parse("[[//project/resource]]").unwrap();
        assert_eq!(l.language(), None);
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), None);
    }

    #[test]
    fn titled_container_link() {
        let l = parse("[Link Title](language/project/resource)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), None);
        assert!(!l.is_external());
        assert!(!l.is_media());
        assert!(!l.is_passage());
    }

    #[test]
    fn titled_https_and_http_links() {
        for url in ["https://www.google.com", "http://www.google.com"] {
            let l = parse(&format!("[Link Title]({url})")).unwrap();
            assert_eq!(l.title(), Some("Link Title"));
            assert_eq!(l.url(), Some(url));
            assert!(l.is_external());
            assert!(!l.is_media());
            assert!(!l.is_passage());
        }
    }

    #[test]
    fn titled_shorthand_resource_link() {
        let l = parse("[Link Title](language/project)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("project"));
        assert_eq!(l.arguments(), None);
        assert!(!l.is_external());
        assert!(!l.is_passage());
    }

    #[test]
    fn titled_abbreviated_link() {
        let l = parse("[Link Title](slug)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.language(), None);
        assert_eq!(l.project(), None);
        assert_eq!(l.resource(), None);
        assert_eq!(l.arguments(), Some("slug"));
        assert!(!l.is_external());
        assert!(!l.is_media());
        assert!(!l.is_passage());
    }

    #[test]
    fn titled_any_language_link() {
        let l = parse("[Link Title](//project/resource/args)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.language(), None);
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), Some("args"));
        assert!(!l.is_media());
        assert!(!l.is_passage());
    }

    #[test]
    fn titled_media_link() {
        let l = parse("[Link Title](image:/language/project/resource)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.protocol(), Some("image"));
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), None);
        assert!(!l.is_external());
        assert!(l.is_media());
        assert!(!l.is_passage());
    }

    #[test]
    fn titled_media_passage_link() {
        let l = parse("[Link Title](image:/language/project/resource/01:02)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.protocol(), Some("image"));
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), Some("01:02"));
        assert_eq!(l.chapter(), Some("01"));
        assert_eq!(l.chunk(), Some("02"));
        assert_eq!(l.last_chunk(), None);
        assert!(l.is_media());
        assert!(!l.is_external());
        assert!(l.is_passage());
    }

    #[test]
    fn titled_media_passage_link_without_resource() {
        let l = parse("[Link Title](image:/language/project/01:02)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.protocol(), Some("image"));
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("project"));
        assert_eq!(l.chapter(), Some("01"));
        assert_eq!(l.chunk(), Some("02"));
        assert!(l.is_media());
        assert!(l.is_passage());
    }

    #[test]
    fn chapter_link_is_not_a_passage() {
        let l = parse("[[language/project/resource/01]]").unwrap();
        assert_eq!(l.arguments(), Some("01"));
        assert_eq!(l.chapter(), Some("01"));
        assert_eq!(l.chunk(), None);
        assert!(!l.is_passage());
    }

    #[test]
    fn chapter_verse_range_link() {
        let l = parse("[[language/project/resource/01:02-06]]").unwrap();
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert_eq!(l.arguments(), Some("01:02-06"));
        assert_eq!(l.chapter(), Some("01"));
        assert_eq!(l.chunk(), Some("02"));
        assert_eq!(l.last_chunk(), Some("06"));
        assert!(!l.is_external());
        assert!(!l.is_media());
        assert!(l.is_passage());
    }

    #[test]
    fn titled_media_link_without_slash() {
        let l = parse("[Link Title](image:language/project/resource)").unwrap();
        assert_eq!(l.title(), Some("Link Title"));
        assert_eq!(l.protocol(), Some("image"));
        assert_eq!(l.language(), Some("language"));
        assert_eq!(l.resource(), Some("resource"));
        assert!(l.is_media());
        assert!(!l.is_external());
    }

    #[test]
    fn titled_media_any_language_link() {
        let l = parse("[Link Title](image://project/resource)").unwrap();
        assert_eq!(l.protocol(), Some("image"));
        assert_eq!(l.language(), None);
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("resource"));
        assert!(l.is_media());
    }

    #[test]
    fn shorthand_passage_link() {
        let l = parse("[[language/project/01:02]]").unwrap();
        assert_eq!(l.project(), Some("project"));
        assert_eq!(l.resource(), Some("project"));
        assert_eq!(l.arguments(), Some("01:02"));
        assert_eq!(l.chapter(), Some("01"));
        assert_eq!(l.chunk(), Some("02"));
        assert!(l.is_passage());
    }

    #[test]
    fn body_is_lowercased_but_title_is_not() {
        let l = parse("[Genesis One](EN/Gen/ULB/01)").unwrap();
        assert_eq!(l.title(), Some("Genesis One"));
        assert_eq!(l.language(), Some("en"));
        assert_eq!(l.project(), Some("gen"));
    }

    #[test]
    fn digit_prefix_is_not_a_scheme() {
        let l = parse("[[01:02]]").unwrap();
        assert_eq!(l.protocol(), None);
        assert_eq!(l.arguments(), Some("01:02"));
        assert!(l.is_passage());
        assert!(!l.is_media());
    }

    #[test]
    fn rejects_unbracketed_token() {
        let err = parse("language/project").unwrap_err();
        assert!(matches!(err, Error::InvalidLinkSyntax { .. }));
    }

    #[test]
    fn rejects_empty_body() {
        assert!(matches!(parse("[[]]"), Err(Error::InvalidLinkSyntax { .. })));
        assert!(matches!(parse("[[ / ]]"), Err(Error::InvalidLinkSyntax { .. })));
    }

    #[test]
    fn rejects_too_many_segments() {
        let err = parse("[[a/b/c/d/e]]").unwrap_err();
        assert!(matches!(err, Error::InvalidLinkSyntax { .. }));
    }

    #[test]
    fn rejects_empty_resource_segment() {
        let err = parse("[[en/gen//01:02]]").unwrap_err();
        assert!(matches!(err, Error::InvalidLinkSyntax { .. }));
    }

    #[test]
    fn rejects_comma_in_passage() {
        let err = parse("[[language/project/resource/01:02,06]]").unwrap_err();
        assert!(matches!(err, Error::MalformedPassage { .. }));
    }

    #[test]
    fn finds_links_in_text_in_order() {
        let text = "See [[en/gen/ulb/01:01]] and [the map](image:/en/gen/maps/01) or [[https://example.org]].";
        let links = find_links(text).unwrap();
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].chapter(), Some("01"));
        assert!(links[1].is_media());
        assert!(links[2].is_external());
    }

    #[test]
    fn link_tokens_report_spans() {
        let text = "x [[slug]] y";
        let tokens: Vec<LinkToken<'_>> = link_tokens(text).collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].span, 2..10);
        assert_eq!(tokens[0].token, "[[slug]]");
    }

    #[test]
    fn display_round_trips() {
        for token in [
            "[[en/gen/ulb/01:02-06]]",
            "[[//gen/ulb]]",
            "[Map](image:/en/gen/maps/01)",
            "[Map](image://gen/maps)",
            "[[slug]]",
            "[[https://example.org]]",
        ] {
            let first = parse(token).unwrap();
            let second = parse(&first.to_string()).unwrap();
            assert_eq!(first, second, "round trip of {token}");
        }
    }
}
