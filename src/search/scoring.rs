//! Relevance scoring and ranking of merged citations.
//!
//! Each citation gets a score in `[0, 100]`:
//!
//! ```text
//! title match     40 / len(keywords) per keyword found in the title
//! abstract match  30 / len(keywords) per keyword found in the abstract
//! citations       min(20, citation_count / 10)
//! recency         10 if published in the last 5 years, 5 if in the last 10
//! ```
//!
//! Keyword matching is a case-insensitive substring test.

use crate::models::{current_year, Citation, MAX_CITATIONS};

const TITLE_WEIGHT: f64 = 40.0;
const ABSTRACT_WEIGHT: f64 = 30.0;
const CITATION_WEIGHT: f64 = 20.0;
const MAX_SCORE: f64 = 100.0;

/// Scores citations against a keyword set
#[derive(Debug, Clone, Copy)]
pub struct RelevanceScorer {
    current_year: i32,
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new(current_year())
    }
}

impl RelevanceScorer {
    /// A scorer measuring recency against `current_year`
    pub fn new(current_year: i32) -> Self {
        Self { current_year }
    }

    /// Compute the relevance of one citation
    pub fn score(&self, citation: &Citation, keywords: &[String]) -> f64 {
        let mut score = 0.0;

        if !keywords.is_empty() {
            let per_keyword = 1.0 / keywords.len() as f64;
            let title = citation.title.to_lowercase();
            let abstract_text = citation.abstract_text.to_lowercase();

            for keyword in keywords.iter().map(|k| k.to_lowercase()) {
                if title.contains(&keyword) {
                    score += TITLE_WEIGHT * per_keyword;
                }
                if abstract_text.contains(&keyword) {
                    score += ABSTRACT_WEIGHT * per_keyword;
                }
            }
        }

        score += (f64::from(citation.citation_count) / 10.0).min(CITATION_WEIGHT);
        score += self.recency(citation.year);

        score.clamp(0.0, MAX_SCORE)
    }

    fn recency(&self, year: i32) -> f64 {
        if year >= self.current_year - 5 {
            10.0
        } else if year >= self.current_year - 10 {
            5.0
        } else {
            0.0
        }
    }

    /// Score every citation, sort by descending score and keep the best ten
    pub fn rank(&self, mut citations: Vec<Citation>, keywords: &[String]) -> Vec<Citation> {
        for citation in &mut citations {
            citation.relevance_score = Some(self.score(citation, keywords));
        }

        citations.sort_by(|a, b| {
            let a = a.relevance_score.unwrap_or_default();
            let b = b.relevance_score.unwrap_or_default();
            b.total_cmp(&a)
        });
        citations.truncate(MAX_CITATIONS);
        citations
    }
}
