//! Three progressive hints per pattern, from vague to almost giving the rule away.

use crate::{
    features::Metric,
    patterns::{CandidatePattern, TemplateId},
};

impl Metric {
    /// The hints for a rule about this metric: the concept, a nudge, and nearly the rule
    #[must_use]
    pub const fn hints(self) -> [&'static str; 3] {
        match self {
            Self::Length => [
                "The pattern is about how long the words are.",
                "These words are similar in their number of letters.",
                "They all have an unusual word length compared to most English words.",
            ],
            Self::UniqueLetters => [
                "The pattern is about how many different letters appear in each word.",
                "Count the distinct letters in each word.",
                "These words have an unusual number of unique letters (either very few or very many).",
            ],
            Self::Entropy => [
                "The pattern is about letter repetition and variety.",
                "Some letters repeat a lot in these words, or they're very mixed — the rule picks one extreme.",
                "They share an extreme in how predictable or random their letter distribution is.",
            ],
            Self::MaxLetterFrequency => [
                "The pattern is about one letter repeating a lot in each word.",
                "In each word, a single letter appears much more often than the others.",
                "These words have an unusually high (or low) “most repeated letter” count.",
            ],
            Self::VowelRatio => [
                "The pattern is about vowels vs consonants.",
                "Look at the proportion of vowels in each word.",
                "These words have an unusual ratio of vowels to consonants.",
            ],
            Self::CorpusFrequency => [
                "The pattern is about how common or rare these words are in real English.",
                "Think about how often you'd see these words in books or speech.",
                "These words are similar in how frequently they appear in the language.",
            ],
            Self::VowelSpacingStd => [
                "The pattern is about where vowels sit in the word.",
                "Look at the spacing or gaps between consecutive vowels.",
                "These words have unusually even or uneven spacing between their vowels.",
            ],
            Self::AlphabeticOrderScore => [
                "The pattern is about the order of letters in the alphabet.",
                "Look at whether the letters in each word follow A–Z order.",
                "These words have letters that are unusually close to (or far from) alphabetical order.",
            ],
            Self::BigramProbability => [
                "The pattern is about two-letter combinations.",
                "Think about how common or rare the letter pairs in these words are.",
                "These words have unusually common (or rare) two-letter sequences.",
            ],
            Self::EditDensity => [
                "The pattern is about how unusual the letter combinations are.",
                "Think about rare vs common letter pairs in these words.",
                "These words share an extreme in how “weird” or “normal” their letter combos are.",
            ],
            Self::ConsonantRuns => [
                "The pattern is about groups of consonants.",
                "Count how many blocks of consonants (without vowels) appear in each word.",
                "These words have an unusual number of consonant clusters.",
            ],
        }
    }
}

/// Guess the direction of a rule from its wording
///
/// This is a plain substring check: any "low " in the rule makes it read as low,
/// even when it comes from the second metric of a ratio rule.
fn direction_word(rule: &str) -> &'static str {
    let rule = rule.to_lowercase();
    if rule.contains("lowest") || rule.contains("low ") {
        "low"
    } else {
        "high"
    }
}

/// Put the direction after the first "unusual", unless the hint already names one.
///
/// The match is a plain substring, so "unusually even" reads "unusually lowly even".
fn with_direction(hint: &str, direction: &str) -> String {
    let lower = hint.to_lowercase();
    if lower.contains("high") || lower.contains("low") {
        return hint.to_owned();
    }
    hint.replacen("unusual", &format!("unusually {direction}"), 1)
}

/// Three hints that point at the pattern's rule, from vague to specific
#[must_use]
pub fn generate_hints(pattern: &CandidatePattern) -> [String; 3] {
    let [concept, nudge, almost] = pattern.metric_a.hints();
    let almost = if pattern.template == TemplateId::ExtremeOutliers {
        with_direction(almost, direction_word(&pattern.rule))
    } else {
        almost.to_owned()
    };
    [concept.to_owned(), nudge.to_owned(), almost]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use test_case::test_case;

    fn pattern(template: TemplateId, metric: Metric, rule: &str) -> CandidatePattern {
        CandidatePattern {
            words: vec![],
            rule: rule.to_owned(),
            template,
            metric_a: metric,
            metric_b: None,
            percentile: None,
            threshold: None,
            constraint: None,
            raw_scores: BTreeMap::new(),
        }
    }

    #[test]
    fn test_every_metric_has_three_hints() {
        for metric in Metric::ALL {
            let hints = metric.hints();
            assert!(hints.iter().all(|h| !h.is_empty()), "{metric}");
        }
    }

    #[test_case("Words with lowest length", "low" ; "lowest")]
    #[test_case("Words with LOWEST length", "low" ; "case insensitive")]
    #[test_case("Words with highest length", "high" ; "highest")]
    #[test_case("Words with unusually high length and low entropy (ratio anomaly)", "low" ; "low followed by space")]
    #[test_case("Words with very high entropy", "high" ; "no low")]
    fn test_direction_word(rule: &str, expected: &str) {
        assert_eq!(direction_word(rule), expected);
    }

    #[test]
    fn test_extreme_low_hint() {
        let p = pattern(
            TemplateId::ExtremeOutliers,
            Metric::Length,
            "Words with lowest length",
        );
        let hints = generate_hints(&p);
        assert_eq!(hints[0], "The pattern is about how long the words are.");
        assert_eq!(hints[1], "These words are similar in their number of letters.");
        assert_eq!(
            hints[2],
            "They all have an unusually low word length compared to most English words."
        );
    }

    #[test]
    fn test_extreme_high_hint() {
        let p = pattern(
            TemplateId::ExtremeOutliers,
            Metric::ConsonantRuns,
            "Words with highest consonant_runs",
        );
        assert_eq!(
            generate_hints(&p)[2],
            "These words have an unusually high number of consonant clusters."
        );
    }

    #[test]
    fn test_hint_with_direction_is_kept() {
        let p = pattern(
            TemplateId::ExtremeOutliers,
            Metric::MaxLetterFrequency,
            "Words with lowest max_letter_frequency",
        );
        assert_eq!(generate_hints(&p)[2], Metric::MaxLetterFrequency.hints()[2]);
    }

    #[test_case(Metric::VowelSpacingStd, "Words with lowest vowel_spacing_std",
        "These words have unusually lowly even or uneven spacing between their vowels." ; "spacing low")]
    #[test_case(Metric::AlphabeticOrderScore, "Words with highest alphabetic_order_score",
        "These words have letters that are unusually highly close to (or far from) alphabetical order." ; "order high")]
    #[test_case(Metric::BigramProbability, "Words with lowest bigram_probability",
        "These words have unusually lowly common (or rare) two-letter sequences." ; "bigram low")]
    fn test_unusually_gets_direction(metric: Metric, rule: &str, expected: &str) {
        let p = pattern(TemplateId::ExtremeOutliers, metric, rule);
        assert_eq!(generate_hints(&p)[2], expected);
    }

    #[test]
    fn test_other_templates_are_verbatim() {
        let p = pattern(
            TemplateId::RatioAnomaly,
            Metric::Length,
            "Words with unusually high length and low unique_letters (ratio anomaly)",
        );
        let hints = generate_hints(&p);
        assert_eq!(hints, Metric::Length.hints().map(String::from));
    }
}
