//! Line-level diff summaries for tracked documents
//!
//! When a document changes and the caller still holds the previous text,
//! the change detector records how many lines were added and removed along
//! with a short preview of each. This module computes those numbers.
//!
//! ## Algorithm
//!
//! 1. Split both texts into lines
//! 2. Strip the common prefix and suffix (the usual case for scraped docs is
//!    a small edit inside a large page)
//! 3. Run a longest-common-subsequence pass over the remaining window
//! 4. Every old line outside the LCS is a removal, every new line outside it
//!    an addition
//!
//! Windows too large for the O(mn) table fall back to a multiset comparison,
//! which gives the same counts whenever lines were only added or removed
//! and an upper bound when lines were reordered.
//!
//! ## Examples
//!
//! ```rust
//! use scrapetrack::diff::compute_content_diff;
//!
//! let diff = compute_content_diff("line1\nline2\nline3", "line1\nline2 modified\nline3\nline4");
//! assert_eq!(diff.added, 2);
//! assert_eq!(diff.removed, 1);
//! assert_eq!(diff.summary, "+2 lines, -1 lines");
//! ```

use crate::types::MAX_PREVIEW_LINES;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Largest LCS table (in cells) computed before falling back
const MAX_LCS_CELLS: usize = 4_000_000;

/// Human-readable summary of a line diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDiff {
    /// `"+A lines, -R lines"`
    pub summary: String,
    /// Number of added lines
    pub added: usize,
    /// Number of removed lines
    pub removed: usize,
    /// First added lines, trimmed
    pub added_preview: Vec<String>,
    /// First removed lines, trimmed
    pub removed_preview: Vec<String>,
}

impl ContentDiff {
    /// Whether any line was added or removed
    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

/// Represents a change operation in the diff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChangeOp {
    Keep,
    Delete(usize), // old line index
    Insert(usize), // new line index
}

/// Compute the line diff summary between two versions of a document
pub fn compute_content_diff(old_content: &str, new_content: &str) -> ContentDiff {
    let old_lines: Vec<&str> = old_content.lines().collect();
    let new_lines: Vec<&str> = new_content.lines().collect();

    let changes = compute_changes(&old_lines, &new_lines);

    let mut added = 0;
    let mut removed = 0;
    let mut added_preview = Vec::new();
    let mut removed_preview = Vec::new();

    for change in changes {
        match change {
            ChangeOp::Insert(idx) => {
                added += 1;
                if added_preview.len() < MAX_PREVIEW_LINES {
                    added_preview.push(new_lines[idx].trim().to_string());
                }
            }
            ChangeOp::Delete(idx) => {
                removed += 1;
                if removed_preview.len() < MAX_PREVIEW_LINES {
                    removed_preview.push(old_lines[idx].trim().to_string());
                }
            }
            ChangeOp::Keep => {}
        }
    }

    ContentDiff {
        summary: format_summary(added, removed),
        added,
        removed,
        added_preview,
        removed_preview,
    }
}

/// Render the one-line summary stored on version entries
pub fn format_summary(added: usize, removed: usize) -> String {
    format!("+{} lines, -{} lines", added, removed)
}

/// Compute the sequence of change operations
fn compute_changes(old_lines: &[&str], new_lines: &[&str]) -> Vec<ChangeOp> {
    let prefix = old_lines
        .iter()
        .zip(new_lines)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_lines[prefix..]
        .iter()
        .rev()
        .zip(new_lines[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old_lines[prefix..old_lines.len() - suffix];
    let new_mid = &new_lines[prefix..new_lines.len() - suffix];

    let mut changes = vec![ChangeOp::Keep; prefix];

    if old_mid.is_empty() {
        changes.extend((0..new_mid.len()).map(|i| ChangeOp::Insert(prefix + i)));
    } else if new_mid.is_empty() {
        changes.extend((0..old_mid.len()).map(|i| ChangeOp::Delete(prefix + i)));
    } else if old_mid.len().saturating_mul(new_mid.len()) <= MAX_LCS_CELLS {
        let lcs = compute_lcs(old_mid, new_mid);
        changes.extend(lcs_to_changes(&lcs, old_mid.len(), new_mid.len(), prefix));
    } else {
        changes.extend(multiset_changes(old_mid, new_mid, prefix));
    }

    changes.extend(std::iter::repeat(ChangeOp::Keep).take(suffix));
    changes
}

/// Compute longest common subsequence using dynamic programming
fn compute_lcs(old_lines: &[&str], new_lines: &[&str]) -> Vec<(usize, usize)> {
    let m = old_lines.len();
    let n = new_lines.len();

    let mut dp = vec![vec![0u32; n + 1]; m + 1];

    for i in 1..=m {
        for j in 1..=n {
            if old_lines[i - 1] == new_lines[j - 1] {
                dp[i][j] = dp[i - 1][j - 1] + 1;
            } else {
                dp[i][j] = dp[i - 1][j].max(dp[i][j - 1]);
            }
        }
    }

    let mut lcs = Vec::new();
    let mut i = m;
    let mut j = n;

    while i > 0 && j > 0 {
        if old_lines[i - 1] == new_lines[j - 1] {
            lcs.push((i - 1, j - 1));
            i -= 1;
            j -= 1;
        } else if dp[i - 1][j] > dp[i][j - 1] {
            i -= 1;
        } else {
            j -= 1;
        }
    }

    lcs.reverse();
    lcs
}

/// Convert LCS to a sequence of change operations, offsetting indices
fn lcs_to_changes(
    lcs: &[(usize, usize)],
    old_len: usize,
    new_len: usize,
    offset: usize,
) -> Vec<ChangeOp> {
    let mut changes = Vec::with_capacity(old_len + new_len);
    let mut old_idx = 0;
    let mut new_idx = 0;

    for &(lcs_old, lcs_new) in lcs {
        while old_idx < lcs_old {
            changes.push(ChangeOp::Delete(offset + old_idx));
            old_idx += 1;
        }
        while new_idx < lcs_new {
            changes.push(ChangeOp::Insert(offset + new_idx));
            new_idx += 1;
        }
        changes.push(ChangeOp::Keep);
        old_idx += 1;
        new_idx += 1;
    }

    while old_idx < old_len {
        changes.push(ChangeOp::Delete(offset + old_idx));
        old_idx += 1;
    }
    while new_idx < new_len {
        changes.push(ChangeOp::Insert(offset + new_idx));
        new_idx += 1;
    }

    changes
}

/// Order-insensitive fallback for very large windows
fn multiset_changes(old_lines: &[&str], new_lines: &[&str], offset: usize) -> Vec<ChangeOp> {
    let mut available: HashMap<&str, usize> = HashMap::new();
    for line in new_lines {
        *available.entry(line).or_insert(0) += 1;
    }

    let mut changes = Vec::new();
    for (i, line) in old_lines.iter().enumerate() {
        match available.get_mut(line) {
            Some(count) if *count > 0 => *count -= 1,
            _ => changes.push(ChangeOp::Delete(offset + i)),
        }
    }

    let mut remaining: HashMap<&str, usize> = HashMap::new();
    for line in old_lines {
        *remaining.entry(line).or_insert(0) += 1;
    }
    for (i, line) in new_lines.iter().enumerate() {
        match remaining.get_mut(line) {
            Some(count) if *count > 0 => *count -= 1,
            _ => changes.push(ChangeOp::Insert(offset + i)),
        }
    }

    changes
}
