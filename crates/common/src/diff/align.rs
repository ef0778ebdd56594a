// Longest-common-subsequence alignment over comparable tokens.
//
// Shared by block-level and line-level diffing so both present a
// divergence the same way: unmatched left-side tokens first.

/// Compute a longest common subsequence between `left` and `right` as an
/// ordered list of index pairs, both strictly increasing.
///
/// Recovery prefers advancing the left index on ties, so a divergence is
/// consistently presented as "delete first" at every granularity.
pub fn lcs_pairs<T: PartialEq>(left: &[T], right: &[T]) -> Vec<(usize, usize)> {
    let m = left.len();
    let n = right.len();
    if m == 0 || n == 0 {
        return Vec::new();
    }

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[i][j] = if left[i] == right[j] {
                dp[i + 1][j + 1] + 1
            } else {
                dp[i + 1][j].max(dp[i][j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(dp[0][0]);
    let mut i = 0;
    let mut j = 0;
    while i < m && j < n {
        if left[i] == right[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if dp[i + 1][j] >= dp[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}
