//! Word-level diff between two versions of a text field
//!
//! Text is split into alternating runs of whitespace and non-whitespace, so
//! joining every token of one side reproduces that side exactly. The diff is
//! a longest-common-subsequence walk over those tokens.

use claimchart_domain::ProposedChange;
use serde::Serialize;

/// Which side of the diff a token belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Present in both texts
    Same,
    /// Present only in the new text
    Added,
    /// Present only in the old text
    Removed,
}

/// One token of a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffOp<'a> {
    /// Which side the token belongs to
    pub kind: DiffKind,
    /// Token text (a whitespace run or a word)
    pub text: &'a str,
}

impl<'a> DiffOp<'a> {
    fn new(kind: DiffKind, text: &'a str) -> Self {
        Self { kind, text }
    }
}

/// Ordered diff operations
pub type WordDiff<'a> = Vec<DiffOp<'a>>;

/// Split text into alternating whitespace and non-whitespace runs
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current_ws: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let is_ws = ch.is_whitespace();
        match current_ws {
            Some(prev) if prev != is_ws => {
                tokens.push(&text[start..idx]);
                start = idx;
            }
            _ => {}
        }
        current_ws = Some(is_ws);
    }

    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// Word diff of `old` against `new`
///
/// When an added and a removed token are equally good at the same point,
/// the added token is emitted first.
pub fn word_diff<'a>(old: &'a str, new: &'a str) -> WordDiff<'a> {
    let a = tokenize(old);
    let b = tokenize(new);
    lcs_walk(&a, &b)
}

/// Like [`word_diff`], but degrades to a whole-text replacement when either
/// side has more than `max_tokens` tokens
pub fn word_diff_bounded<'a>(old: &'a str, new: &'a str, max_tokens: usize) -> WordDiff<'a> {
    let a = tokenize(old);
    let b = tokenize(new);

    if a.len() <= max_tokens && b.len() <= max_tokens {
        return lcs_walk(&a, &b);
    }

    if old == new {
        return vec![DiffOp::new(DiffKind::Same, old)];
    }

    let mut ops = Vec::with_capacity(2);
    if !old.is_empty() {
        ops.push(DiffOp::new(DiffKind::Removed, old));
    }
    if !new.is_empty() {
        ops.push(DiffOp::new(DiffKind::Added, new));
    }
    ops
}

fn lcs_walk<'a>(a: &[&'a str], b: &[&'a str]) -> WordDiff<'a> {
    let m = a.len();
    let n = b.len();
    let width = n + 1;

    // dp[i * width + j] = LCS length of a[i..] and b[j..]
    let mut dp = vec![0usize; (m + 1) * width];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[i * width + j] = if a[i] == b[j] {
                dp[(i + 1) * width + j + 1] + 1
            } else {
                dp[(i + 1) * width + j].max(dp[i * width + j + 1])
            };
        }
    }

    let mut ops = Vec::with_capacity(m.max(n));
    let (mut i, mut j) = (0, 0);
    while i < m || j < n {
        if i < m && j < n && a[i] == b[j] {
            ops.push(DiffOp::new(DiffKind::Same, a[i]));
            i += 1;
            j += 1;
        } else if j < n && (i >= m || dp[i * width + j + 1] >= dp[(i + 1) * width + j]) {
            ops.push(DiffOp::new(DiffKind::Added, b[j]));
            j += 1;
        } else {
            ops.push(DiffOp::new(DiffKind::Removed, a[i]));
            i += 1;
        }
    }
    ops
}

/// True when the diff contains any added or removed token
pub fn has_changes(diff: &[DiffOp<'_>]) -> bool {
    diff.iter().any(|op| op.kind != DiffKind::Same)
}

/// Rebuild the old text from a diff
pub fn old_text(diff: &[DiffOp<'_>]) -> String {
    diff.iter()
        .filter(|op| op.kind != DiffKind::Added)
        .map(|op| op.text)
        .collect()
}

/// Rebuild the new text from a diff
pub fn new_text(diff: &[DiffOp<'_>]) -> String {
    diff.iter()
        .filter(|op| op.kind != DiffKind::Removed)
        .map(|op| op.text)
        .collect()
}

/// Reasoning and evidence diffs of one proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalDiff<'a> {
    /// Reasoning diff
    pub reasoning: WordDiff<'a>,
    /// Evidence diff
    pub evidence: WordDiff<'a>,
}

/// Diff a proposal for display
///
/// An absent proposed field is unchanged, so it is diffed as the old value
/// against itself.
pub fn proposal_diff(change: &ProposedChange, max_tokens: usize) -> ProposalDiff<'_> {
    ProposalDiff {
        reasoning: field_diff(&change.old_reasoning, change.new_reasoning.as_deref(), max_tokens),
        evidence: field_diff(&change.old_evidence, change.new_evidence.as_deref(), max_tokens),
    }
}

fn field_diff<'a>(old: &'a str, new: Option<&'a str>, max_tokens: usize) -> WordDiff<'a> {
    word_diff_bounded(old, new.unwrap_or(old), max_tokens)
}
