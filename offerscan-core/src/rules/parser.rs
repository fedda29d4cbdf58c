use super::terms::{strip_digit_separators, Term, TermKind};
use crate::config::RulePatternConfig;
use crate::types::Rule;
use anyhow::{Context, Result};
use regex::Regex;
use std::ops::Range;

struct TermPattern {
    kind: TermKind,
    regex: Regex,
}

// RuleParser - turns offer terms into at most one monetary rule.
// Patterns are compiled once and applied in TermKind::PRECEDENCE order.
pub struct RuleParser {
    patterns: Vec<TermPattern>,
}

impl Default for RuleParser {
    fn default() -> Self {
        Self::new(&RulePatternConfig::default()).expect("built-in rule patterns are valid")
    }
}

impl RuleParser {
    pub fn new(config: &RulePatternConfig) -> Result<Self> {
        let mut patterns = Vec::new();
        for kind in TermKind::PRECEDENCE {
            let pattern_str = match kind {
                TermKind::Percentage => &config.percentage,
                TermKind::Cap => &config.cap,
                TermKind::MinOrder => &config.min_order,
                TermKind::Flat => &config.currency,
            };
            let regex = Regex::new(pattern_str)
                .with_context(|| format!("Invalid {} pattern: {pattern_str}", kind.name()))?;
            patterns.push(TermPattern { kind, regex });
        }

        Ok(Self { patterns })
    }

    /// Order in which term kinds are evaluated
    pub fn precedence(&self) -> Vec<TermKind> {
        self.patterns.iter().map(|p| p.kind).collect()
    }

    /// Derive the single dominant rule from `text`, or None when the text
    /// carries no percentage and no standalone currency amount.
    pub fn parse(&self, text: &str) -> Option<Rule> {
        let terms = self.extract_terms(text);
        let first = |kind: TermKind| terms.iter().find(|t| t.kind == kind).map(|t| t.value);

        let min_order = first(TermKind::MinOrder);
        let rule = if let Some(percent) = first(TermKind::Percentage) {
            let rule = Rule::percentage(percent);
            match first(TermKind::Cap) {
                Some(cap) => rule.with_cap(cap),
                None => rule,
            }
        } else {
            Rule::flat(first(TermKind::Flat)?)
        };

        Some(match min_order {
            Some(min) => rule.with_min_order(min),
            None => rule,
        })
    }

    /// All usable terms in `text`, grouped by kind in precedence order.
    ///
    /// Flat terms are only produced when no percentage was found, and never
    /// from text already matched as a cap or minimum-order phrase.
    pub fn extract_terms(&self, text: &str) -> Vec<Term> {
        let text = strip_digit_separators(text);
        let mut terms: Vec<Term> = Vec::new();
        let mut claimed: Vec<Range<usize>> = Vec::new();

        for pattern in &self.patterns {
            match pattern.kind {
                TermKind::Percentage => {
                    terms.extend(
                        Self::matches(pattern, &text)
                            .filter(|t| t.value <= 100.0),
                    );
                }
                TermKind::Cap | TermKind::MinOrder => {
                    // Claim every keyword phrase, even ones with unusable values
                    claimed.extend(pattern.regex.find_iter(&text).map(|m| m.range()));
                    terms.extend(Self::matches(pattern, &text));
                }
                TermKind::Flat => {
                    if terms.iter().any(|t| t.kind == TermKind::Percentage) {
                        continue;
                    }
                    let standalone: Vec<Term> = Self::matches(pattern, &text)
                        .filter(|t| !claimed.iter().any(|span| t.overlaps(span)))
                        .collect();
                    terms.extend(standalone);
                }
            }
        }

        terms
    }

    /// Positive values captured by group 1 of `pattern`
    fn matches<'t>(pattern: &'t TermPattern, text: &'t str) -> impl Iterator<Item = Term> + 't {
        pattern.regex.captures_iter(text).filter_map(move |caps| {
            let whole = caps.get(0)?;
            let value: f64 = caps.get(1)?.as_str().parse().ok()?;
            (value.is_finite() && value > 0.0).then(|| Term {
                kind: pattern.kind,
                value,
                span: whole.range(),
            })
        })
    }
}
