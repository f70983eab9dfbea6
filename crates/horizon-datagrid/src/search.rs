//! Incremental search and find.
//!
//! Incremental search scans one column once per keystroke batch. String-like
//! fields match by prefix; other fields compare against the search text
//! coerced to the field type. With nearest matching on, a miss falls back to
//! the last row holding the largest value not above the search value.

use std::borrow::Cow;
use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};

use crate::value::{DataType, Value};

/// Result of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(usize),
    NotFound,
}

impl SearchOutcome {
    pub fn row(self) -> Option<usize> {
        match self {
            SearchOutcome::Found(row) => Some(row),
            SearchOutcome::NotFound => None,
        }
    }
}

/// Characters typed since the last search ran.
#[derive(Debug, Clone, Default)]
pub struct IncrementalSearch {
    buffer: String,
}

impl IncrementalSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ch: char) {
        self.buffer.push(ch);
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Take the buffered text, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Whether a field of `dtype` is searched as text.
fn searched_as_text(dtype: DataType) -> bool {
    matches!(
        dtype,
        DataType::Str | DataType::List | DataType::Date | DataType::DateTime | DataType::Time
    )
}

/// Search `values`, the column of one field, for `text`.
pub fn search_values(
    values: &[Value],
    text: &str,
    dtype: DataType,
    nearest: bool,
    case_sensitive: bool,
) -> SearchOutcome {
    if text.is_empty() {
        return SearchOutcome::NotFound;
    }

    let outcome = if searched_as_text(dtype) {
        search_text(values, text, nearest, case_sensitive)
    } else {
        search_typed(values, &Value::coerce_search_text(text, dtype), nearest)
    };
    tracing::debug!(target: "horizon_datagrid::search", text, %dtype, ?outcome, "search finished");
    outcome
}

fn search_text(values: &[Value], text: &str, nearest: bool, case_sensitive: bool) -> SearchOutcome {
    let fold = |s: String| if case_sensitive { s } else { s.to_lowercase() };
    let needle = fold(text.to_string());

    let keys: Vec<Option<String>> = values
        .iter()
        .map(|v| (!v.is_null()).then(|| fold(v.plain_text())))
        .collect();

    if let Some(row) = keys
        .iter()
        .position(|key| key.as_deref().is_some_and(|k| k.starts_with(&needle)))
    {
        return SearchOutcome::Found(row);
    }
    if !nearest {
        return SearchOutcome::NotFound;
    }
    nearest_below(keys.iter().map(|k| k.as_ref()), &needle, |a, b| a.cmp(b))
}

fn search_typed(values: &[Value], target: &Value, nearest: bool) -> SearchOutcome {
    if let Some(row) = values
        .iter()
        .position(|v| v.sort_cmp(target, true) == Ordering::Equal)
    {
        return SearchOutcome::Found(row);
    }
    if !nearest {
        return SearchOutcome::NotFound;
    }
    nearest_below(
        values.iter().map(|v| (!v.is_null()).then_some(v)),
        target,
        |a, b| a.sort_cmp(b, true),
    )
}

/// The last row holding the largest key not above `target`.
fn nearest_below<'a, K: 'a>(
    keys: impl Iterator<Item = Option<&'a K>>,
    target: &K,
    cmp: impl Fn(&K, &K) -> Ordering,
) -> SearchOutcome {
    let mut best: Option<(usize, &K)> = None;
    for (row, key) in keys.enumerate() {
        let Some(key) = key else { continue };
        if cmp(key, target) == Ordering::Greater {
            continue;
        }
        if best.is_none_or(|(_, current)| cmp(key, current) != Ordering::Less) {
            best = Some((row, key));
        }
    }
    best.map_or(SearchOutcome::NotFound, |(row, _)| SearchOutcome::Found(row))
}

/// Options for find and replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindOptions {
    pub match_case: bool,
    pub whole_word: bool,
    /// Scan forward through rows and columns; backward otherwise.
    pub search_down: bool,
    /// Continue from the other end after reaching the last cell.
    pub wrap: bool,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            match_case: false,
            whole_word: false,
            search_down: true,
            wrap: true,
        }
    }
}

/// Literal text matching under [`FindOptions`].
#[derive(Debug, Clone)]
pub struct TextMatcher {
    regex: Regex,
}

impl TextMatcher {
    /// Build a matcher for `text`. Returns `None` for empty text.
    pub fn new(text: &str, options: &FindOptions) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        let escaped = regex::escape(text);
        let pattern = if options.whole_word {
            format!(r"\b{escaped}\b")
        } else {
            escaped
        };
        match RegexBuilder::new(&pattern)
            .case_insensitive(!options.match_case)
            .build()
        {
            Ok(regex) => Some(Self { regex }),
            Err(err) => {
                tracing::warn!(target: "horizon_datagrid::search", text, error = %err, "cannot build find pattern");
                None
            }
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    /// Replace every match in `haystack` with the literal `replacement`.
    pub fn replace_all<'h>(&self, haystack: &'h str, replacement: &str) -> Cow<'h, str> {
        self.regex
            .replace_all(haystack, regex::NoExpand(replacement))
    }
}
