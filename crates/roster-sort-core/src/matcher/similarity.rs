/// Insert/delete edit-distance similarity in `[0, 1]`:
/// `2 * LCS(a, b) / (|a| + |b|)`.
///
/// Symmetric. Two empty strings score 0 so that an empty filename never
/// matches anything.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Longest common subsequence length with a single rolling row.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_disjoint() {
        assert_eq!(indel_ratio("smith john", "smith john"), 1.0);
        assert_eq!(indel_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(indel_ratio("", ""), 0.0);
        assert_eq!(indel_ratio("", "smith john"), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("smtih jonh pdf", "smith john"),
            ("7 obrien maeve report docx", "o brien maeve"),
            ("randomfile123 png", "nguyen thi lan"),
        ];
        for (a, b) in pairs {
            assert_eq!(indel_ratio(a, b), indel_ratio(b, a));
        }
    }

    #[test]
    fn test_transposed_letters() {
        // LCS of 8 over 24 chars
        let ratio = indel_ratio("smtih jonh pdf", "smith john");
        assert!((ratio - 16.0 / 24.0).abs() < 1e-9, "ratio was {ratio}");
    }
}
