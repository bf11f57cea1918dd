//! Document-Source Sync: on-demand batch fetch of graphs from an external
//! [`DocumentSource`] into a [`Tvg`], with `LOAD_NEXT`/`LOAD_PREV` boundary
//! flags and `GraphCache`-backed residency (§4.3).
//!
//! This wraps a `Tvg`/`GraphCache` pair rather than teaching `Tvg` itself
//! about fetching: a plain `Tvg` remains usable standalone (§4.2), and sync
//! is opt-in by constructing a [`SyncedTvg`] around one.

use crate::cache::GraphCache;
use crate::error::Result;
use crate::object_id::ObjectId;
use crate::source::{
    build_article_graph, DocumentSource, SortSpec, TimeFilter, TranslationParams,
};
use crate::tvg::{order_key_of, GraphHandle, Tvg};
use tracing::debug;

/// The sentinel `objectid` used as the *lower* probe bound when a fetch
/// query has no prior document to anchor on (forward direction).
const OID_MIN: ObjectId = ObjectId::None;
/// The sentinel `objectid` used as the *upper* probe bound (backward
/// direction), matching the `[0xff; 12]` convention used elsewhere for an
/// inclusive upper `Oid` bound (see [`crate::tvg::Tvg::range_ts`]).
const OID_MAX: ObjectId = ObjectId::Oid([0xff; 12]);

/// A [`Tvg`] fronted by a document-source-backed [`GraphCache`]. Lookups
/// that miss locally fall through to a batch fetch against `source`;
/// iteration that crosses a `LOAD_NEXT`/`LOAD_PREV` boundary triggers a
/// further fetch (§4.3).
pub struct SyncedTvg<'s, S: DocumentSource> {
    tvg: Tvg,
    cache: GraphCache,
    source: &'s S,
    batch_size: usize,
    translation: TranslationParams,
    fetch_count: u64,
}

impl<'s, S: DocumentSource> SyncedTvg<'s, S> {
    pub fn new(
        tvg: Tvg,
        cache: GraphCache,
        source: &'s S,
        batch_size: usize,
        translation: TranslationParams,
    ) -> Self {
        Self {
            tvg,
            cache,
            source,
            batch_size,
            translation,
            fetch_count: 0,
        }
    }

    pub fn tvg(&self) -> &Tvg {
        &self.tvg
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    /// Number of batch fetches issued against the document source so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count
    }

    fn touch(&mut self, handle: &GraphHandle) {
        if let Some(key) = order_key_of(handle) {
            self.cache.touch(key, handle.clone());
        }
    }

    /// Fetches up to `batch_size` articles matching `filter`/`sort`,
    /// translates and links each as a Graph, and returns the linked handles
    /// in fetch order. The last handle is flagged `LOAD_NEXT` (forward) or
    /// `LOAD_PREV` (backward) unless the source returned fewer than
    /// `batch_size` documents, which signals exhaustion in that direction.
    fn fetch(&mut self, filter: TimeFilter, sort: SortSpec) -> Result<Vec<GraphHandle>> {
        self.fetch_count += 1;
        let docs: Vec<_> = self
            .source
            .find_articles(filter, sort, self.batch_size)
            .collect();
        let exhausted = docs.len() < self.batch_size;
        debug!(
            count = docs.len(),
            exhausted, "document-source batch fetch"
        );

        let mut handles = Vec::with_capacity(docs.len());
        for doc in &docs {
            let mentions = self.source.find_entities(doc.id);
            let graph = build_article_graph(mentions, self.translation);
            let handle = self.tvg.link(graph, doc.time, doc.id)?;
            self.touch(&handle);
            handles.push(handle);
        }

        if let Some(last) = handles.last() {
            let flag = !exhausted;
            match sort {
                SortSpec::Ascending => last.borrow_mut().set_load_next(flag),
                SortSpec::Descending => last.borrow_mut().set_load_prev(flag),
            }
        }
        Ok(handles)
    }

    fn fetch_forward(&mut self, since: i64, since_id: ObjectId) -> Result<Vec<GraphHandle>> {
        self.fetch(TimeFilter::forward(since, since_id), SortSpec::Ascending)
    }

    fn fetch_backward(&mut self, since: i64, since_id: ObjectId) -> Result<Vec<GraphHandle>> {
        self.fetch(TimeFilter::backward(since, since_id), SortSpec::Descending)
    }

    /// Smallest-keyed graph with `ts >= ts`, fetching a forward batch from
    /// the document source on a local miss.
    pub fn lookup_ge(&mut self, ts: i64) -> Result<Option<GraphHandle>> {
        if let Some(h) = self.tvg.lookup_ge(ts) {
            self.touch(&h);
            return Ok(Some(h));
        }
        self.fetch_forward(ts, OID_MIN)?;
        let found = self.tvg.lookup_ge(ts);
        if let Some(h) = &found {
            self.touch(h);
        }
        Ok(found)
    }

    /// Largest-keyed graph with `ts <= ts`, fetching a backward batch from
    /// the document source on a local miss.
    pub fn lookup_le(&mut self, ts: i64) -> Result<Option<GraphHandle>> {
        if let Some(h) = self.tvg.lookup_le(ts) {
            self.touch(&h);
            return Ok(Some(h));
        }
        self.fetch_backward(ts, OID_MAX)?;
        let found = self.tvg.lookup_le(ts);
        if let Some(h) = &found {
            self.touch(h);
        }
        Ok(found)
    }

    /// The graph immediately after `handle`, fetching a further forward
    /// batch if `handle` is flagged `LOAD_NEXT` and the local ordering has
    /// no successor yet.
    pub fn next(&mut self, handle: &GraphHandle) -> Result<Option<GraphHandle>> {
        if let Some(h) = self.tvg.next(handle) {
            self.touch(&h);
            return Ok(Some(h));
        }
        if !handle.borrow().load_next() {
            return Ok(None);
        }
        let (since, since_id) = {
            let g = handle.borrow();
            (g.ts().expect("linked"), g.object_id())
        };
        self.fetch_forward(since, since_id)?;
        let next = self.tvg.next(handle);
        if let Some(h) = &next {
            self.touch(h);
        }
        Ok(next)
    }

    /// Symmetric to [`SyncedTvg::next`] for `LOAD_PREV`.
    pub fn prev(&mut self, handle: &GraphHandle) -> Result<Option<GraphHandle>> {
        if let Some(h) = self.tvg.prev(handle) {
            self.touch(&h);
            return Ok(Some(h));
        }
        if !handle.borrow().load_prev() {
            return Ok(None);
        }
        let (since, since_id) = {
            let g = handle.borrow();
            (g.ts().expect("linked"), g.object_id())
        };
        self.fetch_backward(since, since_id)?;
        let prev = self.tvg.prev(handle);
        if let Some(h) = &prev {
            self.touch(h);
        }
        Ok(prev)
    }

    /// Re-materialises an evicted graph's edges by re-fetching and
    /// re-translating its article's entity mentions (§4.3, §9: eviction
    /// preserves the header; a subsequent access re-materialises).
    pub fn materialize(&mut self, handle: &GraphHandle) -> Result<()> {
        if !handle.borrow().is_evicted() {
            return Ok(());
        }
        let doc_id = handle.borrow().object_id();
        let mentions = self.source.find_entities(doc_id);
        let rebuilt = build_article_graph(mentions, self.translation);
        handle
            .borrow_mut()
            .rematerialize(rebuilt.bucket_store().clone());
        if let Some(key) = order_key_of(handle) {
            self.cache.touch(key, handle.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::Flags;
    use crate::source::{ArticleDoc, EntityMention};

    struct FakeSource {
        articles: Vec<ArticleDoc>,
        entities: std::collections::HashMap<u64, Vec<EntityMention>>,
    }

    impl DocumentSource for FakeSource {
        fn find_articles(
            &self,
            filter: TimeFilter,
            sort: SortSpec,
            limit: usize,
        ) -> Box<dyn Iterator<Item = ArticleDoc> + '_> {
            let mut docs: Vec<ArticleDoc> = self
                .articles
                .iter()
                .copied()
                .filter(|d| filter.matches(d.time, d.id))
                .collect();
            match (sort, filter.direction) {
                (SortSpec::Ascending, _) => docs.sort_by_key(|d| (d.time, d.id)),
                (SortSpec::Descending, _) => {
                    docs.sort_by_key(|d| (d.time, d.id));
                    docs.reverse();
                }
            }
            docs.truncate(limit);
            Box::new(docs.into_iter())
        }

        fn find_entities(&self, doc_id: ObjectId) -> Box<dyn Iterator<Item = EntityMention> + '_> {
            let key = match doc_id {
                ObjectId::Int(n) => n,
                _ => 0,
            };
            Box::new(
                self.entities
                    .get(&key)
                    .cloned()
                    .unwrap_or_default()
                    .into_iter(),
            )
        }
    }

    fn fake_source(n: usize) -> FakeSource {
        let articles = (0..n)
            .map(|i| ArticleDoc {
                id: ObjectId::Int(i as u64),
                time: i as i64 * 10,
            })
            .collect();
        let mut entities = std::collections::HashMap::new();
        for i in 0..n {
            entities.insert(
                i as u64,
                vec![
                    EntityMention { sen: 0, ent: 1 },
                    EntityMention { sen: 1, ent: 2 },
                ],
            );
        }
        FakeSource { articles, entities }
    }

    fn translation() -> TranslationParams {
        TranslationParams {
            max_distance: 5,
            sum_weights: true,
        }
    }

    #[test]
    fn lookup_ge_on_empty_tvg_triggers_one_fetch() {
        let source = fake_source(5);
        let tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
        let cache = GraphCache::new(usize::MAX);
        let mut synced = SyncedTvg::new(tvg, cache, &source, 2, translation());

        let first = synced.lookup_ge(0).unwrap().unwrap();
        assert_eq!(first.borrow().ts(), Some(0));
        assert_eq!(synced.fetch_count(), 1);
    }

    #[test]
    fn crossing_load_next_boundary_issues_exactly_two_batch_fetches() {
        let source = fake_source(5);
        let tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
        let cache = GraphCache::new(usize::MAX);
        let mut synced = SyncedTvg::new(tvg, cache, &source, 2, translation());

        let a = synced.lookup_ge(0).unwrap().unwrap();
        assert_eq!(synced.fetch_count(), 1);
        let b = synced.next(&a).unwrap().unwrap();
        assert_eq!(synced.fetch_count(), 1); // second doc of the same batch
        let _c = synced.next(&b).unwrap().unwrap();
        assert_eq!(synced.fetch_count(), 2); // crossed LOAD_NEXT, one more fetch
    }

    #[test]
    fn exhausted_source_does_not_set_load_next() {
        let source = fake_source(1);
        let tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
        let cache = GraphCache::new(usize::MAX);
        let mut synced = SyncedTvg::new(tvg, cache, &source, 2, translation());

        let a = synced.lookup_ge(0).unwrap().unwrap();
        assert!(!a.borrow().load_next());
        assert!(synced.next(&a).unwrap().is_none());
        assert_eq!(synced.fetch_count(), 1);
    }

    #[test]
    fn materialize_restores_evicted_edges() {
        let source = fake_source(1);
        let tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
        let cache = GraphCache::new(usize::MAX);
        let mut synced = SyncedTvg::new(tvg, cache, &source, 2, translation());

        let handle = synced.lookup_ge(0).unwrap().unwrap();
        let before = handle.borrow().get(1, 2);
        handle.borrow_mut().evict();
        assert!(handle.borrow().is_evicted());
        synced.materialize(&handle).unwrap();
        assert!(!handle.borrow().is_evicted());
        assert_eq!(handle.borrow().get(1, 2), before);
    }
}
