use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const SKIN_TYPES: [&str; 5] = ["Oily", "Dry", "Combination", "Sensitive", "Normal"];

pub const POSSIBLE_ISSUES: [&str; 7] = [
    "Acne",
    "Hyperpigmentation",
    "Wrinkles",
    "Dullness",
    "Redness",
    "Texture Issues",
    "None",
];

const CONFIDENCE_RANGE: (f64, f64) = (0.65, 0.99);
const MAX_ISSUES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub image_id: String,
    pub skin_type: String,
    pub detected_issues: Vec<String>,
    pub confidence: f64,
}

/// Stand-in for a real classifier. The output depends only on the random
/// source, never on the image.
pub struct MockAnalyzer<R = StdRng> {
    rng: R,
    confidence_threshold: f64,
}

impl MockAnalyzer<StdRng> {
    /// Seeded analyzers repeat the same sequence of results; unseeded ones
    /// draw from OS entropy.
    pub fn from_seed(seed: Option<u64>, confidence_threshold: f64) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        MockAnalyzer::new(rng, confidence_threshold)
    }
}

impl<R: Rng> MockAnalyzer<R> {
    pub fn new(rng: R, confidence_threshold: f64) -> Self {
        MockAnalyzer {
            rng,
            confidence_threshold,
        }
    }

    pub fn analyze(&mut self, image_id: &str) -> AnalysisResult {
        info!("Starting mock analysis for image: {}", image_id);

        let skin_type = SKIN_TYPES
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(SKIN_TYPES[0]);

        let num_issues = self.rng.gen_range(0..=MAX_ISSUES);
        let detected_issues = POSSIBLE_ISSUES
            .choose_multiple(&mut self.rng, num_issues)
            .map(|issue| issue.to_string())
            .collect();

        let raw = self.rng.gen_range(CONFIDENCE_RANGE.0..=CONFIDENCE_RANGE.1);
        let confidence = (raw * 100.0).round() / 100.0;

        if confidence < self.confidence_threshold {
            warn!(
                "Low confidence analysis for {}: {} < {}",
                image_id, confidence, self.confidence_threshold
            );
        }

        let result = AnalysisResult {
            image_id: image_id.to_string(),
            skin_type: skin_type.to_string(),
            detected_issues,
            confidence,
        };

        info!("Analysis complete for {}: {:?}", image_id, result);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::mock::StepRng;

    use super::*;

    #[test]
    fn results_stay_within_fixed_sets_and_ranges() {
        let mut analyzer = MockAnalyzer::from_seed(Some(7), 0.6);

        for _ in 0..500 {
            let result = analyzer.analyze("img-1");

            assert_eq!(result.image_id, "img-1");
            assert!(SKIN_TYPES.contains(&result.skin_type.as_str()));
            assert!(result.detected_issues.len() <= MAX_ISSUES);

            let distinct: HashSet<_> = result.detected_issues.iter().collect();
            assert_eq!(distinct.len(), result.detected_issues.len());
            for issue in &result.detected_issues {
                assert!(POSSIBLE_ISSUES.contains(&issue.as_str()));
            }

            assert!((0.65..=0.99).contains(&result.confidence));
            let cents = result.confidence * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn every_issue_count_occurs() {
        let mut analyzer = MockAnalyzer::from_seed(Some(11), 0.6);
        let counts: HashSet<usize> = (0..200)
            .map(|_| analyzer.analyze("img").detected_issues.len())
            .collect();

        assert_eq!(counts, HashSet::from([0, 1, 2]));
    }

    #[test]
    fn same_seed_gives_same_sequence() {
        let mut first = MockAnalyzer::from_seed(Some(42), 0.6);
        let mut second = MockAnalyzer::from_seed(Some(42), 0.6);

        for _ in 0..20 {
            assert_eq!(first.analyze("img"), second.analyze("img"));
        }
    }

    #[test]
    fn repeated_calls_are_independent() {
        let mut analyzer = MockAnalyzer::from_seed(Some(3), 0.6);
        let results: Vec<_> = (0..50).map(|_| analyzer.analyze("same-id")).collect();

        assert!(results.iter().any(|r| r != &results[0]));
    }

    #[test]
    fn accepts_any_injected_rng() {
        let mut analyzer = MockAnalyzer::new(StepRng::new(0, 0), 0.6);
        let result = analyzer.analyze("img");

        assert_eq!(result.skin_type, SKIN_TYPES[0]);
        assert!(result.detected_issues.is_empty());
        assert_eq!(result.confidence, 0.65);
    }
}
