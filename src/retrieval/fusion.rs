//! Reciprocal rank fusion of ranked result lists
//!
//! Combines rankings from retrievers whose raw scores are not comparable
//! (BM25 vs. cosine similarity) using rank positions only.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::hash::Hash;

/// Default smoothing constant
pub const DEFAULT_RRF_CONSTANT: f64 = 60.0;

/// Identifier with its fused score
#[derive(Debug, Clone, PartialEq)]
pub struct FusedId<I> {
    pub id: I,
    pub score: f64,
}

/// Reciprocal rank fusion with a tunable constant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankFusion {
    constant: f64,
}

impl Default for RankFusion {
    fn default() -> Self {
        Self::new(DEFAULT_RRF_CONSTANT)
    }
}

impl RankFusion {
    /// A larger constant flattens the influence of top ranks
    pub fn new(constant: f64) -> Self {
        Self { constant }
    }

    /// Fuse ranked lists into one ranking over every distinct id.
    ///
    /// Each id scores `sum(1 / (constant + rank + 1))` over the lists it
    /// appears in, with zero-based ranks. Output is sorted by descending score;
    /// ties keep the order in which ids were first seen across the lists.
    /// Within one list only the first occurrence of an id counts.
    pub fn fuse<I>(&self, lists: &[Vec<I>]) -> Vec<FusedId<I>>
    where
        I: Hash + Eq + Clone,
    {
        let mut scores: IndexMap<I, f64> = IndexMap::new();

        for list in lists {
            let mut seen = HashSet::with_capacity(list.len());
            for (rank, id) in list.iter().enumerate() {
                if !seen.insert(id) {
                    continue;
                }
                *scores.entry(id.clone()).or_insert(0.0) += 1.0 / (self.constant + rank as f64 + 1.0);
            }
        }

        let mut fused: Vec<FusedId<I>> = scores
            .into_iter()
            .map(|(id, score)| FusedId { id, score })
            .collect();

        // Stable sort keeps first-seen order among equal scores
        fused.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        fused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(fused: &[FusedId<&'static str>]) -> Vec<&'static str> {
        fused.iter().map(|f| f.id).collect()
    }

    #[test]
    fn test_empty_inputs() {
        let fusion = RankFusion::default();
        assert!(fusion.fuse::<&str>(&[]).is_empty());
        assert!(fusion.fuse::<&str>(&[vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_disjoint_lists_keep_every_id_once() {
        let fused = RankFusion::default().fuse(&[vec!["a", "b", "c"], vec!["d", "e"]]);

        let mut seen = ids(&fused);
        assert_eq!(seen.len(), 5);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);

        for pair in fused.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_agreement_beats_single_list() {
        let fused = RankFusion::default().fuse(&[vec!["shared", "x"], vec!["shared", "y"], vec!["solo"]]);

        let shared = fused.iter().find(|f| f.id == "shared").unwrap();
        let solo = fused.iter().find(|f| f.id == "solo").unwrap();
        assert!(shared.score > solo.score);
        assert_eq!(fused[0].id, "shared");
    }

    #[test]
    fn test_score_formula() {
        let fused = RankFusion::new(60.0).fuse(&[vec!["a", "b"], vec!["b"]]);
        let b = fused.iter().find(|f| f.id == "b").unwrap();
        let expected = 1.0 / 62.0 + 1.0 / 61.0;
        assert!((b.score - expected).abs() < 1e-12);
        assert_eq!(fused[0].id, "b");
    }

    #[test]
    fn test_ties_follow_first_seen_order() {
        // a and c tie at rank 0, b and d tie at rank 1
        let fused = RankFusion::default().fuse(&[vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(ids(&fused), vec!["a", "c", "b", "d"]);

        let again = RankFusion::default().fuse(&[vec!["a", "b"], vec!["c", "d"]]);
        assert_eq!(fused, again);
    }

    #[test]
    fn test_constant_changes_rank_influence() {
        // "top" only in list one at rank 0; "steady" at rank 3 in both lists
        let lists = vec![
            vec!["top", "p", "q", "steady"],
            vec!["r", "s", "t", "steady"],
        ];
        let sharp = RankFusion::new(1.0).fuse(&lists);
        let flat = RankFusion::new(60.0).fuse(&lists);

        assert_eq!(sharp[0].id, "top");
        assert_eq!(flat[0].id, "steady");
    }

    #[test]
    fn test_duplicate_within_list_counts_once() {
        let fused = RankFusion::new(60.0).fuse(&[vec!["a", "a"]]);
        assert_eq!(fused.len(), 1);
        assert!((fused[0].score - 1.0 / 61.0).abs() < 1e-12);
    }
}
