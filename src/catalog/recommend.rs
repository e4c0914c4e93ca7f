// Recommendation and browsing over the difficulty catalog

use super::{CatalogEntry, DifficultyCatalog};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Window around the target difficulty that counts as "similar"
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationWindow {
    /// Pieces may be this much easier than the target
    #[serde(default = "default_lower_margin")]
    pub lower_margin: f64,
    /// Pieces may be this much harder than the target
    #[serde(default = "default_upper_margin")]
    pub upper_margin: f64,
    #[serde(default = "default_count")]
    pub count: usize,
}

impl Default for RecommendationWindow {
    fn default() -> Self {
        Self {
            lower_margin: default_lower_margin(),
            upper_margin: default_upper_margin(),
            count: default_count(),
        }
    }
}

impl RecommendationWindow {
    /// Open interval (target - lower, target + upper)
    pub fn contains(&self, target: f64, difficulty: f64) -> bool {
        target - self.lower_margin < difficulty && difficulty < target + self.upper_margin
    }
}

fn default_lower_margin() -> f64 {
    0.3
}

fn default_upper_margin() -> f64 {
    0.5
}

fn default_count() -> usize {
    3
}

/// Difficulty bands offered for browsing, inclusive on both ends
pub const DIFFICULTY_BANDS: [(f64, f64); 6] = [
    (1.0, 1.5),
    (2.0, 2.5),
    (3.0, 3.0),
    (3.5, 3.5),
    (4.0, 4.5),
    (5.0, 5.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyBand<'a> {
    pub low: f64,
    pub high: f64,
    pub pieces: Vec<&'a CatalogEntry>,
}

impl DifficultyBand<'_> {
    pub fn label(&self) -> String {
        if self.low == self.high {
            format!("Difficulty {:.1}", self.low)
        } else {
            format!("Difficulty {:.1}-{:.1}", self.low, self.high)
        }
    }
}

impl DifficultyCatalog {
    /// Pieces inside the window around `target`, closest first.
    ///
    /// `exclude` names a piece to leave out, usually the one the target
    /// difficulty came from. Returns fewer than `window.count` entries when
    /// not enough pieces qualify.
    pub fn recommend(
        &self,
        target: f64,
        window: &RecommendationWindow,
        exclude: Option<&str>,
    ) -> Vec<&CatalogEntry> {
        let mut matches: Vec<&CatalogEntry> = self
            .entries()
            .iter()
            .filter(|e| Some(e.file.as_str()) != exclude)
            .filter(|e| window.contains(target, e.predicted_difficulty))
            .collect();

        matches.sort_by(|a, b| {
            let da = (a.predicted_difficulty - target).abs();
            let db = (b.predicted_difficulty - target).abs();
            da.partial_cmp(&db)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.file.cmp(&b.file))
        });
        matches.truncate(window.count);
        matches
    }

    /// Every band in `DIFFICULTY_BANDS`, empty bands included
    pub fn browse_ranges(&self) -> Vec<DifficultyBand<'_>> {
        DIFFICULTY_BANDS
            .iter()
            .map(|&(low, high)| DifficultyBand {
                low,
                high,
                pieces: self
                    .entries()
                    .iter()
                    .filter(|e| e.predicted_difficulty >= low && e.predicted_difficulty <= high)
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> DifficultyCatalog {
        DifficultyCatalog::new(
            [
                ("a.csv", 2.0),
                ("b.csv", 2.2),
                ("c.csv", 2.45),
                ("d.csv", 1.75),
                ("e.csv", 2.6),
                ("f.csv", 3.0),
            ]
            .into_iter()
            .map(|(file, d)| CatalogEntry {
                file: file.to_string(),
                predicted_difficulty: d,
            })
            .collect(),
        )
    }

    #[test]
    fn test_recommend_uses_asymmetric_open_window() {
        let catalog = catalog();
        let window = RecommendationWindow {
            count: 10,
            ..RecommendationWindow::default()
        };
        let picks: Vec<&str> = catalog
            .recommend(2.1, &window, None)
            .iter()
            .map(|e| e.file.as_str())
            .collect();
        // (1.8, 2.6): d at 1.75 and e at 2.6 fall outside
        assert_eq!(picks, vec!["a.csv", "b.csv", "c.csv"]);
    }

    #[test]
    fn test_recommend_excludes_source_and_truncates() {
        let catalog = catalog();
        let window = RecommendationWindow {
            count: 1,
            ..RecommendationWindow::default()
        };
        let picks = catalog.recommend(2.0, &window, Some("a.csv"));
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].file, "b.csv");
    }

    #[test]
    fn test_bands_are_inclusive_and_all_listed() {
        let catalog = catalog();
        let bands = catalog.browse_ranges();
        assert_eq!(bands.len(), 6);
        assert_eq!(bands[1].label(), "Difficulty 2.0-2.5");
        assert_eq!(bands[1].pieces.len(), 3);
        assert_eq!(bands[2].label(), "Difficulty 3.0");
        assert_eq!(bands[2].pieces.len(), 1);
        assert!(bands[0].pieces.is_empty());
    }
}
