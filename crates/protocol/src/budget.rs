/// Appended when output had to be cut mid-stream.
pub const TRUNCATION_MARKER: &str = "\n[...truncated]";

/// Result of fitting text into a character budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetOutcome {
    pub text: String,
    pub truncated: bool,
}

/// Fit `text` into `max_chars` characters, appending [`TRUNCATION_MARKER`]
/// when anything was cut. The marker itself is counted against the budget, so
/// the returned text never exceeds `max_chars`.
///
/// Budgets are in `char`s, not bytes: the host contract is character-based
/// and truncation must never split a multi-byte sequence.
#[must_use]
pub fn hard_truncate(text: &str, max_chars: usize) -> BudgetOutcome {
    let total = text.chars().count();
    if total <= max_chars {
        return BudgetOutcome {
            text: text.to_string(),
            truncated: false,
        };
    }

    let marker_len = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_len {
        // Degenerate budget: emit as much of the marker as fits.
        let text: String = TRUNCATION_MARKER.chars().take(max_chars).collect();
        return BudgetOutcome {
            text,
            truncated: true,
        };
    }

    let keep = max_chars - marker_len;
    let mut text: String = text.chars().take(keep).collect();
    text.push_str(TRUNCATION_MARKER);
    BudgetOutcome {
        text,
        truncated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fits_untouched() {
        let out = hard_truncate("hello", 10);
        assert_eq!(out.text, "hello");
        assert!(!out.truncated);
    }

    #[test]
    fn truncates_within_budget() {
        let long = "x".repeat(500);
        let out = hard_truncate(&long, 100);
        assert!(out.truncated);
        assert!(out.text.chars().count() <= 100);
        assert!(out.text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn degenerate_budget_never_exceeds() {
        let out = hard_truncate("some long text here", 3);
        assert!(out.truncated);
        assert!(out.text.chars().count() <= 3);
    }

    #[test]
    fn multibyte_safe() {
        let text = "файл".repeat(50);
        let out = hard_truncate(&text, 40);
        assert!(out.text.chars().count() <= 40);
    }
}
