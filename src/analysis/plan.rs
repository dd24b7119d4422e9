//! Chunk planning: choose a summarization tier from the commit count and
//! split the commit sequence into contiguous chunks.

use std::fmt;
use std::ops::Range;

use serde::Serialize;

/// Below this many commits a single summarization call is made.
pub const DIRECT_LIMIT: usize = 10;

/// Below this many commits the log is split in two halves.
pub const TWO_WAY_LIMIT: usize = 50;

/// At or above this many commits the analysis is rejected.
pub const MAX_COMMITS: usize = 100;

/// Summarization strategy selected by commit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// One call over every commit.
    Direct,
    /// Two halves summarized, then merged.
    TwoWay,
    /// Four quarters summarized, merged pairwise, then merged again.
    FourWay,
    /// Too many commits; no calls are made.
    Rejected,
}

impl Tier {
    pub fn for_count(total: usize) -> Self {
        if total < DIRECT_LIMIT {
            Tier::Direct
        } else if total < TWO_WAY_LIMIT {
            Tier::TwoWay
        } else if total < MAX_COMMITS {
            Tier::FourWay
        } else {
            Tier::Rejected
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Direct => "direct",
            Tier::TwoWay => "two-way",
            Tier::FourWay => "four-way",
            Tier::Rejected => "rejected",
        }
    }

    pub fn topology(&self) -> Option<Topology> {
        match self {
            Tier::Direct => Some(Topology::Single),
            Tier::TwoWay => Some(Topology::Pairwise),
            Tier::FourWay => Some(Topology::Tree),
            Tier::Rejected => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How chunk summaries are combined into the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    /// The only chunk is summarized straight into the narrative.
    Single,
    /// Two chunk summaries, one merge.
    Pairwise,
    /// Four chunk summaries, two adjacent-pair merges, one final merge.
    Tree,
}

/// The chunk layout for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub tier: Tier,
    /// Contiguous index ranges into the commit sequence, in order.
    pub chunks: Vec<Range<usize>>,
}

impl ChunkPlan {
    /// Plan the chunks for `total` commits.
    pub fn for_count(total: usize) -> Self {
        let tier = Tier::for_count(total);
        let chunks = match tier {
            Tier::Direct => vec![0..total],
            Tier::TwoWay => {
                let mid = total / 2;
                vec![0..mid, mid..total]
            }
            Tier::FourWay => {
                let size = total / 4;
                vec![0..size, size..size * 2, size * 2..size * 3, size * 3..total]
            }
            Tier::Rejected => Vec::new(),
        };
        Self { tier, chunks }
    }

    pub fn topology(&self) -> Option<Topology> {
        self.tier.topology()
    }

    /// Chunk sizes, in order.
    pub fn sizes(&self) -> Vec<usize> {
        self.chunks.iter().map(|r| r.len()).collect()
    }

    /// Apply the plan to a slice.
    ///
    /// The slice must have the length the plan was made for.
    pub fn split<'a, T>(&self, items: &'a [T]) -> Vec<&'a [T]> {
        self.chunks.iter().map(|r| &items[r.clone()]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(Tier::for_count(0), Tier::Direct);
        assert_eq!(Tier::for_count(9), Tier::Direct);
        assert_eq!(Tier::for_count(10), Tier::TwoWay);
        assert_eq!(Tier::for_count(49), Tier::TwoWay);
        assert_eq!(Tier::for_count(50), Tier::FourWay);
        assert_eq!(Tier::for_count(99), Tier::FourWay);
        assert_eq!(Tier::for_count(100), Tier::Rejected);
        assert_eq!(Tier::for_count(10_000), Tier::Rejected);
    }

    #[test]
    fn test_two_way_split_point() {
        let plan = ChunkPlan::for_count(30);
        assert_eq!(plan.chunks, vec![0..15, 15..30]);

        let plan = ChunkPlan::for_count(11);
        assert_eq!(plan.chunks, vec![0..5, 5..11]);
    }

    #[test]
    fn test_four_way_remainder_goes_last() {
        assert_eq!(ChunkPlan::for_count(50).sizes(), vec![12, 12, 12, 14]);
        assert_eq!(ChunkPlan::for_count(52).sizes(), vec![13, 13, 13, 13]);
        assert_eq!(ChunkPlan::for_count(99).sizes(), vec![24, 24, 24, 27]);
    }

    #[test]
    fn test_rejected_has_no_chunks() {
        let plan = ChunkPlan::for_count(100);
        assert!(plan.chunks.is_empty());
        assert_eq!(plan.topology(), None);
    }

    #[test]
    fn test_split_is_lossless_for_every_accepted_count() {
        for n in 0..MAX_COMMITS {
            let items: Vec<usize> = (0..n).collect();
            let plan = ChunkPlan::for_count(n);
            let rejoined: Vec<usize> = plan
                .split(&items)
                .into_iter()
                .flat_map(|chunk| chunk.iter().copied())
                .collect();
            assert_eq!(rejoined, items, "partition of {n} commits lost or reordered items");
        }
    }

    #[test]
    fn test_topology_per_tier() {
        assert_eq!(ChunkPlan::for_count(5).topology(), Some(Topology::Single));
        assert_eq!(ChunkPlan::for_count(20).topology(), Some(Topology::Pairwise));
        assert_eq!(ChunkPlan::for_count(60).topology(), Some(Topology::Tree));
    }
}
