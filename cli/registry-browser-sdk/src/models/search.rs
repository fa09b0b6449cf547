//! Prefix search over the catalog and highlighting of matched labels.
//!
//! Queries are folded before comparison: surrounding whitespace is trimmed,
//! diacritics are stripped and the result is lower-cased.
//! Candidate fields are only lower-cased, so a query never matches
//! an accented field through its folded form.

use std::ops::Range;

use unicode_normalization::char::{decompose_canonical, is_combining_mark};

use super::package::PackageRecord;

/// Maximum number of matches returned by [filter].
pub const MAX_SUGGESTIONS: usize = 5;

/// A contiguous byte range of a label, tagged as matched or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightRange {
    pub start: usize,
    pub end: usize,
    pub highlighted: bool,
}

impl HighlightRange {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The slice of `label` covered by this range.
    ///
    /// `label` must be the string the range was computed for.
    pub fn text<'a>(&self, label: &'a str) -> &'a str {
        &label[self.range()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightPart<'a> {
    pub text: &'a str,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub record: PackageRecord,
    pub highlight_ranges: Vec<HighlightRange>,
}

impl MatchResult {
    pub fn label(&self) -> &str {
        self.record.label()
    }

    pub fn parts(&self) -> Vec<HighlightPart<'_>> {
        to_parts(self.record.label(), &self.highlight_ranges)
    }
}

/// Letters that have no canonical decomposition but a conventional
/// Latin transliteration.
fn transliterate(c: char) -> Option<&'static str> {
    let folded = match c {
        'ß' => "ss",
        'Æ' => "Ae",
        'æ' => "ae",
        'Ø' => "O",
        'ø' => "o",
        'Đ' | 'Ð' => "D",
        'đ' | 'ð' => "d",
        'Ħ' => "H",
        'ħ' => "h",
        'ı' => "i",
        'Ĳ' => "IJ",
        'ĳ' => "ij",
        'ĸ' => "k",
        'Ŀ' | 'Ł' => "L",
        'ŀ' | 'ł' => "l",
        'ŉ' => "'n",
        'Ŋ' => "N",
        'ŋ' => "n",
        'Œ' => "Oe",
        'œ' => "oe",
        'ſ' => "s",
        'Þ' => "Th",
        'þ' => "th",
        'Ŧ' => "T",
        'ŧ' => "t",
        _ => return None,
    };
    Some(folded)
}

fn deburr_char(c: char, out: &mut String) {
    if let Some(folded) = transliterate(c) {
        out.push_str(folded);
        return;
    }
    decompose_canonical(c, |d| {
        if !is_combining_mark(d) {
            out.push(d);
        }
    });
}

/// Strip diacritics and lower-case a single character.
///
/// Combining marks fold to the empty string.
fn fold_char(c: char) -> String {
    let mut deburred = String::new();
    deburr_char(c, &mut deburred);
    deburred.chars().flat_map(char::to_lowercase).collect()
}

fn fold(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Trim, strip diacritics and lower-case a query.
pub fn normalize_query(query: &str) -> String {
    fold(query.trim())
}

fn starts_with_query(field: &str, query: &str) -> bool {
    field.to_lowercase().starts_with(query)
}

fn is_match(record: &PackageRecord, query: &str) -> bool {
    let label = starts_with_query(record.label(), query);
    let version = record
        .version()
        .is_some_and(|version| starts_with_query(version, query));
    let keyword = record
        .keywords()
        .any(|keyword| starts_with_query(keyword, query));

    label | version | keyword
}

/// Select the first [MAX_SUGGESTIONS] records, in catalog order, whose label,
/// version or any keyword starts with the normalized `query`.
///
/// An empty normalized query yields no results.
pub fn filter(catalog: &[PackageRecord], query: &str) -> Vec<MatchResult> {
    let normalized = normalize_query(query);
    if normalized.is_empty() {
        return Vec::new();
    }

    catalog
        .iter()
        .filter(|record| is_match(record, &normalized))
        .take(MAX_SUGGESTIONS)
        .map(|record| MatchResult {
            highlight_ranges: highlight(record.label(), query.trim()),
            record: record.clone(),
        })
        .collect()
}

struct FoldedChar {
    start: usize,
    end: usize,
    folded: String,
}

/// Length in chars of the match of `query` at the start of `chars`.
fn match_at(chars: &[FoldedChar], query: &str) -> Option<usize> {
    let first = chars.first()?;
    if first.folded.is_empty() {
        return None;
    }

    // combining marks trailing the last matched char belong to the match
    let mut rest = query;
    let mut consumed = 0;
    for c in chars {
        if rest.is_empty() && !c.folded.is_empty() {
            break;
        }
        rest = rest.strip_prefix(c.folded.as_str())?;
        consumed += 1;
    }
    rest.is_empty().then_some(consumed)
}

/// Non-overlapping occurrences of the folded `query` in `label`,
/// as byte ranges aligned to the chars of `label`.
fn occurrences(label: &str, query: &str) -> Vec<Range<usize>> {
    let chars: Vec<FoldedChar> = label
        .char_indices()
        .map(|(start, c)| FoldedChar {
            start,
            end: start + c.len_utf8(),
            folded: fold_char(c),
        })
        .collect();

    let mut found = Vec::new();
    let mut index = 0;
    while index < chars.len() {
        match match_at(&chars[index..], query) {
            Some(len) => {
                found.push(chars[index].start..chars[index + len - 1].end);
                index += len;
            },
            None => index += 1,
        }
    }
    found
}

fn partition(len: usize, occurrences: &[Range<usize>]) -> Vec<HighlightRange> {
    let mut ranges = Vec::with_capacity(occurrences.len() * 2 + 1);
    let mut cursor = 0;
    for occurrence in occurrences {
        if occurrence.start > cursor {
            ranges.push(HighlightRange {
                start: cursor,
                end: occurrence.start,
                highlighted: false,
            });
        }
        ranges.push(HighlightRange {
            start: occurrence.start,
            end: occurrence.end,
            highlighted: true,
        });
        cursor = occurrence.end;
    }
    if cursor < len {
        ranges.push(HighlightRange {
            start: cursor,
            end: len,
            highlighted: false,
        });
    }
    ranges
}

/// Split `label` into runs, highlighting every occurrence of `query`.
///
/// Comparison ignores case and diacritics.
/// The runs cover `label` exactly, in order, without overlap.
pub fn highlight(label: &str, query: &str) -> Vec<HighlightRange> {
    if label.is_empty() {
        return Vec::new();
    }
    let query = fold(query);
    if query.is_empty() {
        return partition(label.len(), &[]);
    }
    partition(label.len(), &occurrences(label, &query))
}

pub fn highlight_parts<'a>(label: &'a str, query: &str) -> Vec<HighlightPart<'a>> {
    to_parts(label, &highlight(label, query))
}

fn to_parts<'a>(label: &'a str, ranges: &[HighlightRange]) -> Vec<HighlightPart<'a>> {
    ranges
        .iter()
        .map(|range| HighlightPart {
            text: range.text(label),
            highlighted: range.highlighted,
        })
        .collect()
}
