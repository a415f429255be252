//! Line normalizer.
//!
//! Turns a raw line of student work into the canonical source string the
//! [`parser`](crate::parser) expects: trimmed, `^` rewritten to `**`, and
//! every whitespace run collapsed to a single space.

/// Normalize a raw equation line.
///
/// Total over all strings; the empty string maps to itself and applying it
/// twice gives the same result as applying it once.
///
/// ```rust
/// use stepcheck_core::normalize::normalize;
///
/// assert_eq!(normalize("  2x^2 \t+  3 = 7 "), "2x**2 + 3 = 7");
/// ```
pub fn normalize(raw: &str) -> String {
    let replaced = raw.trim().replace('^', "**");
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn test_caret_becomes_double_star() {
        assert_eq!(normalize("x^2 = 4"), "x**2 = 4");
        assert_eq!(normalize("x^-1"), "x**-1");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize("2x   +\t3\n=  7"), "2x + 3 = 7");
    }

    #[test]
    fn test_idempotent() {
        for s in ["  a ^ b  ", "x**2", "", " = ", "2x^^2"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", s);
        }
    }
}
