//! Score/Analysis Parser: pulls the compatibility score and analysis text out
//! of the scoring stage's free-form response.
//!
//! Never fails. Output that does not match the `Score:` / `Analysis:` shape the
//! scoring prompt asks for degrades to fixed fallbacks:
//! - no `Score:` label → `DEFAULT_SCORE`, analysis still extracted on its own
//! - `Score:` labels present but none followed by a usable integer →
//!   `(DEFAULT_SCORE, ANALYSIS_FALLBACK)`
//! - no `Analysis:` label → `ANALYSIS_FALLBACK`, score still extracted on its own

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Neutral score used when none can be read. Not a computed value.
pub const DEFAULT_SCORE: u32 = 75;
pub const MIN_SCORE: u32 = 1;
pub const MAX_SCORE: u32 = 100;

pub const ANALYSIS_FALLBACK: &str = "Could not parse the analysis from the AI response.";

// `[\s*]*` tolerates markdown emphasis such as `**Score:** 87`.
static SCORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bscore:[\s*]*(\d+)").expect("score regex is valid"));
static SCORE_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bscore:").expect("score label regex is valid"));
static ANALYSIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\banalysis:[\s*]*(.*)").expect("analysis regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreAnalysis {
    pub score: u32,
    pub analysis: String,
}

impl ScoreAnalysis {
    fn fallback() -> Self {
        Self {
            score: DEFAULT_SCORE,
            analysis: ANALYSIS_FALLBACK.to_string(),
        }
    }
}

enum ScoreField {
    Absent,
    Malformed,
    Value(u32),
}

pub fn parse_score_response(raw: &str) -> ScoreAnalysis {
    let score = match extract_score(raw) {
        ScoreField::Value(score) => score.clamp(MIN_SCORE, MAX_SCORE),
        ScoreField::Absent => {
            warn!("Scoring response has no 'Score:' label; using default {DEFAULT_SCORE}");
            DEFAULT_SCORE
        }
        ScoreField::Malformed => {
            warn!("Scoring response has a malformed score; falling back");
            return ScoreAnalysis::fallback();
        }
    };

    let analysis = extract_analysis(raw).unwrap_or_else(|| {
        warn!("Scoring response has no usable 'Analysis:' section");
        ANALYSIS_FALLBACK.to_string()
    });

    ScoreAnalysis { score, analysis }
}

/// First `Score:` label followed by digits wins; labels without digits are skipped.
fn extract_score(raw: &str) -> ScoreField {
    match SCORE_RE.captures(raw) {
        Some(caps) => match caps[1].parse::<u32>() {
            Ok(score) => ScoreField::Value(score),
            // too many digits to fit
            Err(_) => ScoreField::Malformed,
        },
        None if SCORE_LABEL_RE.is_match(raw) => ScoreField::Malformed,
        None => ScoreField::Absent,
    }
}

fn extract_analysis(raw: &str) -> Option<String> {
    let text = ANALYSIS_RE.captures(raw)?.get(1)?.as_str().trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_response() {
        let parsed = parse_score_response("Score: 87\nAnalysis: Strong keyword alignment.");
        assert_eq!(
            parsed,
            ScoreAnalysis {
                score: 87,
                analysis: "Strong keyword alignment.".to_string()
            }
        );
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let parsed = parse_score_response("SCORE: 64\nanalysis: Needs more cloud keywords.");
        assert_eq!(parsed.score, 64);
        assert_eq!(parsed.analysis, "Needs more cloud keywords.");
    }

    #[test]
    fn test_markdown_emphasis_is_tolerated() {
        let parsed = parse_score_response("**Score:** 91\n**Analysis:** Excellent match.");
        assert_eq!(parsed.score, 91);
        assert_eq!(parsed.analysis, "Excellent match.");
    }

    #[test]
    fn test_analysis_spans_lines_and_is_trimmed() {
        let parsed = parse_score_response(
            "Score: 70\nAnalysis:\n  Good Rust depth.\n  Missing Kubernetes.\n\n",
        );
        assert_eq!(parsed.analysis, "Good Rust depth.\n  Missing Kubernetes.");
    }

    #[test]
    fn test_missing_score_uses_default_and_fallback_analysis() {
        let parsed = parse_score_response("The candidate looks promising overall.");
        assert_eq!(parsed, ScoreAnalysis::fallback());
    }

    #[test]
    fn test_missing_score_keeps_analysis() {
        let parsed = parse_score_response("Analysis: Solid backend profile.");
        assert_eq!(parsed.score, DEFAULT_SCORE);
        assert_eq!(parsed.analysis, "Solid backend profile.");
    }

    #[test]
    fn test_missing_analysis_keeps_score() {
        let parsed = parse_score_response("Score: 55");
        assert_eq!(parsed.score, 55);
        assert_eq!(parsed.analysis, ANALYSIS_FALLBACK);
    }

    #[test]
    fn test_non_numeric_score_falls_back_entirely() {
        let parsed = parse_score_response("Score: high\nAnalysis: Great fit.");
        assert_eq!(parsed, ScoreAnalysis::fallback());
    }

    #[test]
    fn test_numeric_score_after_non_numeric_label_wins() {
        let parsed = parse_score_response("Keyword score: high\nScore: 80\nAnalysis: y");
        assert_eq!(
            parsed,
            ScoreAnalysis {
                score: 80,
                analysis: "y".to_string()
            }
        );
    }

    #[test]
    fn test_label_must_start_a_word() {
        let parsed = parse_score_response("Subscore: 12\nScore: 66\nAnalysis: Fine.");
        assert_eq!(parsed.score, 66);

        let parsed = parse_score_response("Subscore: 12\nAnalysis: Fine.");
        assert_eq!(parsed.score, DEFAULT_SCORE);
        assert_eq!(parsed.analysis, "Fine.");
    }

    #[test]
    fn test_overflowing_score_falls_back_entirely() {
        let parsed = parse_score_response("Score: 99999999999999999999\nAnalysis: ok");
        assert_eq!(parsed, ScoreAnalysis::fallback());
    }

    #[test]
    fn test_score_out_of_range_is_clamped() {
        assert_eq!(parse_score_response("Score: 0").score, MIN_SCORE);
        assert_eq!(parse_score_response("Score: 250").score, MAX_SCORE);
    }

    #[test]
    fn test_score_with_denominator() {
        let parsed = parse_score_response("Score: 82/100\nAnalysis: Good.");
        assert_eq!(parsed.score, 82);
    }

    #[test]
    fn test_empty_analysis_uses_fallback() {
        let parsed = parse_score_response("Score: 60\nAnalysis:   ");
        assert_eq!(parsed.analysis, ANALYSIS_FALLBACK);
    }
}
