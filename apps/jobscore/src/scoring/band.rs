use serde::Serialize;

/// Qualitative label for a 0–100 match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBand {
    Excellent,
    Good,
    Moderate,
    Weak,
    Poor,
}

impl ScoreBand {
    /// Scores above 100 are treated as 100.
    pub fn from_score(score: u8) -> Self {
        match score.min(100) {
            90..=u8::MAX => ScoreBand::Excellent,
            70..=89 => ScoreBand::Good,
            50..=69 => ScoreBand::Moderate,
            30..=49 => ScoreBand::Weak,
            _ => ScoreBand::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Moderate => "Moderate",
            ScoreBand::Weak => "Weak",
            ScoreBand::Poor => "Poor",
        }
    }

    /// CSS modifier used on the score circle.
    pub fn css_class(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "excellent",
            ScoreBand::Good => "good",
            ScoreBand::Moderate => "moderate",
            ScoreBand::Weak => "weak",
            ScoreBand::Poor => "poor",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        let cases = [
            (100, "Excellent"),
            (90, "Excellent"),
            (89, "Good"),
            (70, "Good"),
            (69, "Moderate"),
            (50, "Moderate"),
            (49, "Weak"),
            (30, "Weak"),
            (29, "Poor"),
            (0, "Poor"),
        ];
        for (score, label) in cases {
            assert_eq!(ScoreBand::from_score(score).label(), label, "score {score}");
        }
    }

    #[test]
    fn test_out_of_range_scores_clamp_to_excellent() {
        assert_eq!(ScoreBand::from_score(255), ScoreBand::Excellent);
    }

    #[test]
    fn test_css_class_is_lowercase_label() {
        let band = ScoreBand::from_score(55);
        assert_eq!(band.css_class(), band.label().to_lowercase());
    }
}
