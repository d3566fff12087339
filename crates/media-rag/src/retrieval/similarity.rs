//! Normalized sequence similarity (Ratcliff/Obershelp)
//!
//! `ratio(a, b) = 2 * M / (len(a) + len(b))` where `M` is the number of
//! characters covered by the recursively found longest common blocks. The
//! result is in `[0, 1]`; identical strings score `1.0`.

/// Similarity ratio between two strings, computed over chars
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Sum of the sizes of all matching blocks
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block inside `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let col = j - blo + 1;
            cur[col] = if a[i] == b[j] { prev[col - 1] + 1 } else { 0 };
            if cur[col] > best_size {
                best_size = cur[col];
                best_i = i + 1 - best_size;
                best_j = j + 1 - best_size;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (best_i, best_j, best_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_and_disjoint() {
        assert!(approx(sequence_ratio("revenue", "revenue"), 1.0));
        assert!(approx(sequence_ratio("abc", "xyz"), 0.0));
        assert!(approx(sequence_ratio("", ""), 1.0));
        assert!(approx(sequence_ratio("abc", ""), 0.0));
    }

    #[test]
    fn test_partial_overlap() {
        // "bcd" is the only common block
        assert!(approx(sequence_ratio("abcd", "bcde"), 0.75));
        // blocks "a" + "c": 2 * 2 / 6
        assert!(approx(sequence_ratio("abc", "acb"), 4.0 / 6.0));
        // single block "ello"
        assert!(approx(sequence_ratio("hello", "yellow"), 8.0 / 11.0));
    }

    #[test]
    fn test_typo_still_scores_high() {
        let ratio = sequence_ratio("revenue", "revenu");
        assert!(ratio > 0.9);
        assert!(ratio < 1.0);
    }
}
