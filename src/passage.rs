//! Decomposition of `chapter[:chunk[-lastChunk]]` passage arguments.

use crate::error::Error;

/// Separators that belong to citation lists, never to a single passage.
const LIST_SEPARATORS: [char; 3] = [',', ';', ':'];

/// A passage argument split into its components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Passage {
    /// Chapter, or the whole argument when it contains no `:`.
    pub chapter: String,
    /// First chunk, present only when the argument contained a `:`.
    pub chunk: Option<String>,
    /// Last chunk of a `chunk-lastChunk` range.
    pub last_chunk: Option<String>,
}

/// Split a passage argument on its first `:` and then on the first `-`.
///
/// An argument without `:` is returned whole as the chapter, so abbreviated
/// slugs pass through untouched.
///
/// # Errors
///
/// Returns `Error::MalformedPassage` if the chunk part holds a list separator
/// (`,` `;` or a second `:`), or if a component around `:` or `-` is empty.
pub fn decompose(argument: &str) -> Result<Passage, Error> {
    let Some((chapter, remainder)) = argument.split_once(':') else {
        return Ok(Passage {
            chapter: argument.to_string(),
            chunk: None,
            last_chunk: None,
        });
    };

    if let Some(separator) = remainder.chars().find(|c| return LIST_SEPARATORS.contains(c)) {
        return Err(malformed(argument, &format!("`{separator}` cannot appear inside one passage")));
    }

    let (chunk, last_chunk) = match remainder.split_once('-') {
        None => (remainder, None),
        Some((first, last)) => (first, Some(last)),
    };

    if chapter.is_empty() {
        return Err(malformed(argument, "missing chapter before `:`"));
    }
    if chunk.is_empty() {
        return Err(malformed(argument, "missing chunk after `:`"));
    }
    if last_chunk.is_some_and(str::is_empty) {
        return Err(malformed(argument, "missing last chunk after `-`"));
    }

    return Ok(Passage {
        chapter: chapter.to_string(),
        chunk: Some(chunk.to_string()),
        last_chunk: last_chunk.map(str::to_string),
    });
}

/// Build a `MalformedPassage` error for `argument`.
fn malformed(argument: &str, reason: &str) -> Error {
    return Error::MalformedPassage {
        argument: argument.to_string(),
        reason: reason.to_string(),
    };
}
