//! Implicit scripture-citation detection in prose.
//!
//! Finds a book name followed by a citation chain such as
//! `John 1–3; 3:16; 6:14, 44, 46-47; 7:1-5` and emits one reference per
//! citation. Book and chapter carry forward along the chain: `;` and `,`
//! may drop the book, and a bare number after a verse-level citation is
//! another verse of the same chapter.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Reference, ReferenceParts};

/// Book anchor anywhere at or after a position.
#[allow(clippy::expect_used, reason = "regex literals are compile-time invariants")]
static BOOK_ANCHOR: Lazy<Regex> = Lazy::new(|| return Regex::new(BOOK_PATTERN).expect("valid regex"));

/// Book anchor starting exactly at the beginning of the searched slice.
#[allow(clippy::expect_used, reason = "regex literals are compile-time invariants")]
static BOOK_ANCHOR_HERE: Lazy<Regex> =
    Lazy::new(|| return Regex::new(&format!("^(?:{BOOK_PATTERN})")).expect("valid regex"));

/// A book name directly followed by a citation.
///
/// A capitalized name is a run of capitalized words (`Second Kings`) that
/// may open with an ordinal (`1 John`) and join words with `of [the]`
/// (`Song of Solomon`). A lowercase name is only trusted when a
/// `chapter:verse` pair follows it.
const BOOK_PATTERN: &str = r"\b(?:(?P<proper>(?:[1-3]\s?)?\p{Lu}\p{L}*(?:\s+(?:of(?:\s+the)?\s+)?\p{Lu}\p{L}*)*)\s+(?P<proper_at>\d)|(?P<plain>\p{Ll}\p{L}*)\s+(?P<plain_at>\d+:\d))";

/// What the citation being read follows in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum After {
    /// Directly after a book name: a bare number is a chapter.
    Book,
    /// After `;` or `,`: a bare number may be a verse of the current chapter.
    Separator,
}

/// A book name located in the text.
#[derive(Debug, Clone, Copy)]
struct BookAnchor<'a> {
    /// The book name as typed.
    book: &'a str,
    /// Byte offset where the first citation starts.
    citation_start: usize,
}

/// One recognized citation group, borrowed from the scanned text.
#[derive(Debug, Clone, Copy)]
struct Citation<'a> {
    /// Chapter number.
    chapter: &'a str,
    /// Verse number, absent for chapter-level citations.
    chunk: Option<&'a str>,
    /// End of a verse range.
    last_chunk: Option<&'a str>,
}

/// Book and chapter context carried from one citation to the next.
#[derive(Debug, Clone, Copy)]
struct Context<'a> {
    /// Chapter of the previous citation.
    chapter: Option<&'a str>,
    /// Book of the current chain.
    project: &'a str,
    /// Whether the previous citation named a verse.
    verse_level: bool,
}

/// Byte cursor over the scanned text.
#[derive(Debug)]
struct Cursor<'a> {
    /// Current byte offset, always on a char boundary.
    pos: usize,
    /// The whole text being scanned.
    text: &'a str,
}

impl Citation<'_> {
    /// The canonical passage argument, `C`, `C:V` or `C:V-W`.
    fn argument(&self) -> String {
        return match (self.chunk, self.last_chunk) {
            (None, _) => self.chapter.to_string(),
            (Some(chunk), None) => format!("{}:{chunk}", self.chapter),
            (Some(chunk), Some(last)) => format!("{}:{chunk}-{last}", self.chapter),
        };
    }
}

impl<'a> Context<'a> {
    /// Context after a chapter-level citation.
    const fn at_chapter(self, chapter: &'a str) -> Self {
        return Self {
            chapter: Some(chapter),
            project: self.project,
            verse_level: false,
        };
    }

    /// Context after a verse-level citation.
    const fn at_verse(self, chapter: &'a str) -> Self {
        return Self {
            chapter: Some(chapter),
            project: self.project,
            verse_level: true,
        };
    }

    /// Fresh context for a newly named book.
    const fn for_book(project: &'a str) -> Self {
        return Self {
            chapter: None,
            project,
            verse_level: false,
        };
    }
}

impl<'a> Cursor<'a> {
    /// Consume `expected` if it is the next char.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() != Some(expected) {
            return false;
        }
        self.pos = self.pos.saturating_add(expected.len_utf8());
        return true;
    }

    /// Consume a hyphen or an en dash.
    fn eat_dash(&mut self) -> bool {
        return self.eat('-') || self.eat('\u{2013}');
    }

    /// Consume a run of ASCII digits that is not glued to a following letter.
    fn number(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let digits = rest.get(..len).filter(|d| return !d.is_empty())?;
        let glued = rest
            .get(len..)
            .and_then(|after| return after.chars().next())
            .is_some_and(char::is_alphanumeric);
        if glued {
            return None;
        }
        self.pos = self.pos.saturating_add(len);
        return Some(digits);
    }

    /// The next char, if any.
    fn peek(&self) -> Option<char> {
        return self.rest().chars().next();
    }

    /// Unconsumed text.
    fn rest(&self) -> &'a str {
        return self.text.get(self.pos..).unwrap_or("");
    }

    /// Consume `;` or `,` with the whitespace around it.
    fn separator(&mut self) -> Option<char> {
        self.skip_whitespace();
        let separator = [';', ','].into_iter().find(|s| return self.eat(*s))?;
        self.skip_whitespace();
        return Some(separator);
    }

    /// Consume any whitespace.
    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos = self.pos.saturating_add(rest.len().saturating_sub(trimmed.len()));
    }

    /// Consume a verse number. A single lowercase letter naming part of the
    /// verse, as in `16a`, is consumed and dropped.
    fn verse(&mut self) -> Option<&'a str> {
        if let Some(digits) = self.number() {
            return Some(digits);
        }
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let digits = rest.get(..len).filter(|d| return !d.is_empty())?;
        let mut after = rest.get(len..)?.chars();
        let part = after.next().filter(char::is_ascii_lowercase)?;
        if after.next().is_some_and(char::is_alphanumeric) {
            return None;
        }
        self.pos = self.pos.saturating_add(len).saturating_add(part.len_utf8());
        return Some(digits);
    }
}

/// Turn a book anchor match into positions within `text`.
fn anchor_from_captures<'a>(caps: &regex::Captures<'a>, offset: usize) -> Option<BookAnchor<'a>> {
    let (book, at) = match (caps.name("proper"), caps.name("proper_at")) {
        (Some(book), Some(at)) => (book, at),
        _ => (caps.name("plain")?, caps.name("plain_at")?),
    };
    return Some(BookAnchor {
        book: book.as_str(),
        citation_start: offset.saturating_add(at.start()),
    });
}

/// Match a book anchor starting exactly at `pos`.
fn book_anchor_at(text: &str, pos: usize) -> Option<BookAnchor<'_>> {
    let rest = text.get(pos..)?;
    let caps = BOOK_ANCHOR_HERE.captures(rest)?;
    return anchor_from_captures(&caps, pos);
}

/// Build the reference for one citation, skipping it if the passage is unreadable.
fn emit(citation: &Citation<'_>, context: &Context<'_>, references: &mut Vec<Reference>) {
    let argument = citation.argument();
    let parts = ReferenceParts {
        arguments: Some(argument),
        project: Some(context.project.to_string()),
        ..ReferenceParts::default()
    };
    match Reference::from_parts(parts) {
        Err(e) => tracing::trace!(error = %e, "skipping citation"),
        Ok(reference) => references.push(reference),
    }
}

/// Find the next book anchor at or after `from`.
fn find_book_anchor(text: &str, from: usize) -> Option<BookAnchor<'_>> {
    let caps = BOOK_ANCHOR.captures_at(text, from)?;
    return anchor_from_captures(&caps, 0);
}

/// Read one citation group and return it with the context it leaves behind.
///
/// Restores the cursor and returns `None` when no citation starts here.
fn read_citation<'a>(
    cursor: &mut Cursor<'a>,
    context: Context<'a>,
    after: After,
) -> Option<(Citation<'a>, Context<'a>)> {
    let start = cursor.pos;
    let first = cursor.number()?;

    if cursor.eat(':') {
        let Some(verse) = cursor.verse() else {
            cursor.pos = start;
            return None;
        };
        let citation = Citation {
            chapter: first,
            chunk: Some(verse),
            last_chunk: read_range_end(cursor),
        };
        return Some((citation, context.at_verse(first)));
    }

    let verse_of_chapter = match (after, context.chapter) {
        (After::Separator, Some(chapter)) if context.verse_level => Some(chapter),
        _ => None,
    };
    if let Some(chapter) = verse_of_chapter {
        let citation = Citation {
            chapter,
            chunk: Some(first),
            last_chunk: read_range_end(cursor),
        };
        return Some((citation, context));
    }

    // Chapter ranges are recorded by their first chapter only.
    if let Some(end) = read_range_end(cursor) {
        tracing::trace!(chapter = first, end, "dropping chapter range end");
    }
    let citation = Citation {
        chapter: first,
        chunk: None,
        last_chunk: None,
    };
    return Some((citation, context.at_chapter(first)));
}

/// Read `-N` or `–N`, unless `N` opens a cross-chapter `N:V`.
fn read_range_end<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    let start = cursor.pos;
    if !cursor.eat_dash() {
        return None;
    }
    match cursor.number() {
        Some(end) if cursor.peek() != Some(':') => return Some(end),
        _ => {
            cursor.pos = start;
            return None;
        },
    }
}

/// Scan `text` for implicit citations, in textual order.
///
/// Never fails: spans that do not form a citation are skipped.
pub fn scan(text: &str) -> Vec<Reference> {
    let mut references = Vec::new();
    let mut pos = 0_usize;

    while let Some(anchor) = find_book_anchor(text, pos) {
        pos = scan_citation_chain(text, anchor, &mut references);
    }

    tracing::debug!(count = references.len(), "scanned implicit citations");
    return references;
}

/// Follow the citation chain that starts at `anchor`.
/// Returns the offset where searching for the next book should resume,
/// always past the start of the anchor.
fn scan_citation_chain<'a>(text: &'a str, anchor: BookAnchor<'a>, references: &mut Vec<Reference>) -> usize {
    // `Compare 1 John`: the number opens an ordinal book, not a chapter.
    if book_anchor_at(text, anchor.citation_start).is_some() {
        return anchor.citation_start;
    }

    let mut cursor = Cursor {
        pos: anchor.citation_start,
        text,
    };
    let mut context = Context::for_book(anchor.book);
    let mut after = After::Book;
    let mut resume = anchor.citation_start.saturating_add(1);

    while let Some((citation, next)) = read_citation(&mut cursor, context, after) {
        emit(&citation, &next, references);
        context = next;
        resume = cursor.pos;

        let Some(separator) = cursor.separator() else {
            break;
        };
        tracing::trace!(%separator, pos = cursor.pos, "citation chain continues");

        if let Some(book) = book_anchor_at(text, cursor.pos) {
            context = Context::for_book(book.book);
            cursor.pos = book.citation_start;
            after = After::Book;
        } else {
            after = After::Separator;
        }
    }

    return resume;
}
