//! Document-Source Sync: translates an external document store's articles
//! and entity mentions into graphs (§4.3, §6).
//!
//! The wire protocol to any particular document store is out of scope;
//! this module defines only the trait boundary a host integration would
//! implement against, plus the pure translation logic that consumes it.

use crate::flags::Flags;
use crate::graph::SparseGraph;
use crate::object_id::ObjectId;

/// One article document returned by [`DocumentSource::find_articles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleDoc {
    pub id: ObjectId,
    pub time: i64,
}

/// One entity-mention document returned by [`DocumentSource::find_entities`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMention {
    /// Sentence index within the article.
    pub sen: u64,
    /// Entity node index.
    pub ent: u64,
}

/// Comparison direction for a [`TimeFilter`] bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A monotone time-range query: `Forward` means `> since` (optionally tied
/// by `$or`-style `id` comparison on exact equality), `Backward` means `<
/// since` (§4.3's "fetch queries are monotone" invariant).
#[derive(Debug, Clone, Copy)]
pub struct TimeFilter {
    pub since: i64,
    pub since_id: ObjectId,
    pub direction: Direction,
}

impl TimeFilter {
    pub fn forward(since: i64, since_id: ObjectId) -> Self {
        Self {
            since,
            since_id,
            direction: Direction::Forward,
        }
    }

    pub fn backward(since: i64, since_id: ObjectId) -> Self {
        Self {
            since,
            since_id,
            direction: Direction::Backward,
        }
    }

    /// True if `(time, id)` satisfies this filter's strict inequality, with
    /// the documented `$or`-on-`id` tiebreak at equal `time`.
    pub fn matches(&self, time: i64, id: ObjectId) -> bool {
        match self.direction {
            Direction::Forward => {
                time > self.since || (time == self.since && id > self.since_id)
            }
            Direction::Backward => {
                time < self.since || (time == self.since && id < self.since_id)
            }
        }
    }
}

/// Sort order requested from [`DocumentSource::find_articles`]: `(time,
/// id)` ascending or descending together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortSpec {
    Ascending,
    Descending,
}

/// External collaborator boundary: a host integration implements this
/// trait against its own document store; this crate never does (§6).
pub trait DocumentSource {
    /// Cursor over articles matching `filter`, ordered by `sort`, capped at
    /// `limit` documents.
    fn find_articles(
        &self,
        filter: TimeFilter,
        sort: SortSpec,
        limit: usize,
    ) -> Box<dyn Iterator<Item = ArticleDoc> + '_>;

    /// Cursor over one article's entity mentions, ordered by `sen`
    /// ascending.
    fn find_entities(&self, doc_id: ObjectId) -> Box<dyn Iterator<Item = EntityMention> + '_>;
}

/// Parameters controlling article → graph translation (§6).
#[derive(Debug, Clone, Copy)]
pub struct TranslationParams {
    /// Maximum sentence distance between two mentions for them to be
    /// considered co-occurring.
    pub max_distance: u64,
    /// When `true`, sum `exp(-|sen1-sen2|)` over every qualifying mention
    /// pair; when `false`, only the smallest-distance pair contributes
    /// (ties broken by sentence-ascending encounter order — §9 Open
    /// Questions, resolved by reading `pytvg.py`'s construction order).
    pub sum_weights: bool,
}

/// Builds a graph from one article's entity mentions, per §6's
/// co-occurrence rule.
pub fn build_article_graph(
    mentions: impl IntoIterator<Item = EntityMention>,
    params: TranslationParams,
) -> SparseGraph {
    let mentions: Vec<EntityMention> = mentions.into_iter().collect();
    let mut graph = SparseGraph::new(Flags::empty());

    if params.sum_weights {
        for i in 0..mentions.len() {
            for j in (i + 1)..mentions.len() {
                let (a, b) = (&mentions[i], &mentions[j]);
                if a.ent == b.ent {
                    continue;
                }
                let distance = a.sen.abs_diff(b.sen);
                if distance > params.max_distance {
                    continue;
                }
                let weight = (-(distance as f64)).exp() as f32;
                graph.add(a.ent, b.ent, weight);
            }
        }
        return graph;
    }

    // sum_weights == false: per unordered entity pair, keep only the
    // smallest-distance mention pair, first-encountered on a tie.
    use std::collections::HashMap;
    let mut best: HashMap<(u64, u64), (u64, usize)> = HashMap::new();
    for i in 0..mentions.len() {
        for j in (i + 1)..mentions.len() {
            let (a, b) = (&mentions[i], &mentions[j]);
            if a.ent == b.ent {
                continue;
            }
            let distance = a.sen.abs_diff(b.sen);
            if distance > params.max_distance {
                continue;
            }
            let key = if a.ent <= b.ent {
                (a.ent, b.ent)
            } else {
                (b.ent, a.ent)
            };
            let encounter_order = i * mentions.len() + j;
            best.entry(key)
                .and_modify(|(best_dist, best_order)| {
                    if distance < *best_dist
                        || (distance == *best_dist && encounter_order < *best_order)
                    {
                        *best_dist = distance;
                        *best_order = encounter_order;
                    }
                })
                .or_insert((distance, encounter_order));
        }
    }
    for ((a, b), (distance, _)) in best {
        let weight = (-(distance as f64)).exp() as f32;
        graph.set(a, b, weight);
    }
    graph
}
