//! Loose comparison of dotted version strings such as `0.2`, `v1.0` or `1.*`.
//!
//! Every character other than a digit or `*` is dropped from each slice, so
//! `1.0-alpha.1` compares as `1.0.1`. A `*` slice matches anything, and a
//! trailing `*` keeps matching past the end of the shorter version.

use std::cmp::Ordering;

/// A version split into its dot-separated slices.
#[derive(Debug)]
struct Version {
    /// Cleaned slices; empty slices read as `0`.
    slices: Vec<String>,
}

impl Version {
    /// Split on `.` and clean each slice, dropping trailing empty slices.
    fn new(raw: &str) -> Self {
        let mut raw_slices: Vec<&str> = raw.split('.').collect();
        while raw_slices.last().is_some_and(|s| return s.is_empty()) {
            raw_slices.pop();
        }
        return Self {
            slices: raw_slices.into_iter().map(clean).collect(),
        };
    }

    /// Numeric value at `index`; missing or unreadable slices are `0`.
    fn value(&self, index: usize) -> u64 {
        return self
            .slices
            .get(index)
            .and_then(|s| return s.parse().ok())
            .unwrap_or(0);
    }

    /// Whether the slice at `index`, or the last slice past the end, is `*`.
    fn wild(&self, index: usize) -> bool {
        return self
            .slices
            .get(index)
            .or_else(|| return self.slices.last())
            .is_some_and(|s| return s == "*");
    }
}

/// Keep only digits and `*`; an empty result reads as `0`.
fn clean(slice: &str) -> String {
    let cleaned: String = slice
        .chars()
        .filter(|c| return c.is_ascii_digit() || *c == '*')
        .collect();
    if cleaned.is_empty() {
        return "0".to_string();
    }
    return cleaned;
}

/// Compare two versions slice by slice, skipping wildcard positions.
pub fn compare(left: &str, right: &str) -> Ordering {
    let left = Version::new(left);
    let right = Version::new(right);
    let len = left.slices.len().max(right.slices.len());

    return (0..len)
        .filter(|&i| return !left.wild(i) && !right.wild(i))
        .map(|i| return left.value(i).cmp(&right.value(i)))
        .find(|ordering| return ordering.is_ne())
        .unwrap_or(Ordering::Equal);
}

/// True iff `left` and `right` compare equal.
pub fn eq(left: &str, right: &str) -> bool {
    return compare(left, right).is_eq();
}

/// True iff `left` is newer than `right`.
pub fn gt(left: &str, right: &str) -> bool {
    return compare(left, right).is_gt();
}

/// True iff `left` is older than `right`.
pub fn lt(left: &str, right: &str) -> bool {
    return compare(left, right).is_lt();
}
