//! Child name rules and ordering.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

use crate::types::{DISALLOWED_NAMES, PATH_SEPARATOR};
use crate::{FsError, FsResult, NodeKind};

/// Reject reserved names and names containing the separator.
pub(crate) fn validate_name(name: &str) -> FsResult<()> {
    if DISALLOWED_NAMES.contains(&name) || name.contains(PATH_SEPARATOR) {
        return Err(FsError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Folder ordering: folders first, then by [`compare_names`].
pub(crate) fn compare_entries(a: (NodeKind, &str), b: (NodeKind, &str)) -> Ordering {
    let rank = |kind| match kind {
        NodeKind::Folder => 0,
        NodeKind::File => 1,
    };
    rank(a.0)
        .cmp(&rank(b.0))
        .then_with(|| compare_names(a.1, b.1))
}

/// Numeric-aware, case-insensitive name comparison.
///
/// Digit runs compare by value (`file2` < `file10`), everything else compares
/// by lowercase character. Ties fall back to byte order so the ordering is
/// total and distinct names never compare equal.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natural_cmp(a, b).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();
    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ordering = compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}
