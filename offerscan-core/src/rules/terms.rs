use serde::Serialize;
use std::ops::Range;

/// The kinds of numeric term recognised in offer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TermKind {
    /// "5%" - makes the rule a percentage rule
    Percentage,
    /// "up to ₹500" - upper bound on a percentage discount
    Cap,
    /// "Min Order ₹5000" - purchase threshold
    MinOrder,
    /// A bare currency amount - makes the rule flat when no percentage exists
    Flat,
}

impl TermKind {
    /// Evaluation order. A later kind may depend on what earlier kinds found:
    /// Flat only applies without a Percentage, and skips text already claimed
    /// by Cap and MinOrder.
    pub const PRECEDENCE: [TermKind; 4] = [
        TermKind::Percentage,
        TermKind::Cap,
        TermKind::MinOrder,
        TermKind::Flat,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TermKind::Percentage => "percentage",
            TermKind::Cap => "cap",
            TermKind::MinOrder => "min_order",
            TermKind::Flat => "flat",
        }
    }
}

/// A numeric term found in text, with the byte span of the whole match
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub kind: TermKind,
    pub value: f64,
    pub span: Range<usize>,
}

impl Term {
    pub fn overlaps(&self, span: &Range<usize>) -> bool {
        self.span.start < span.end && span.start < self.span.end
    }
}

/// Drop thousands separators between digits: "₹1,00,000" -> "₹100000".
/// Other commas are kept so sentence structure is unchanged.
pub fn strip_digit_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    chars
        .iter()
        .enumerate()
        .filter(|&(i, &c)| {
            let between_digits = c == ','
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit());
            !between_digits
        })
        .map(|(_, &c)| c)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_digit_separators() {
        assert_eq!(strip_digit_separators("Get ₹1,000 off"), "Get ₹1000 off");
        assert_eq!(strip_digit_separators("₹1,00,000"), "₹100000");
        assert_eq!(strip_digit_separators("cashback, min order"), "cashback, min order");
        assert_eq!(strip_digit_separators("5, 6"), "5, 6");
        assert_eq!(strip_digit_separators(",1,"), ",1,");
    }

    #[test]
    fn test_overlap() {
        let term = Term { kind: TermKind::Flat, value: 1.0, span: 5..10 };
        assert!(term.overlaps(&(0..6)));
        assert!(term.overlaps(&(9..12)));
        assert!(!term.overlaps(&(0..5)));
        assert!(!term.overlaps(&(10..12)));
    }
}
