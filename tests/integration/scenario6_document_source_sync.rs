use std::collections::HashMap;

use tvg::flags::Flags;
use tvg::cache::GraphCache;
use tvg::object_id::ObjectId;
use tvg::source::{ArticleDoc, DocumentSource, EntityMention, SortSpec, TimeFilter, TranslationParams};
use tvg::sync::SyncedTvg;
use tvg::tvg::Tvg;

struct FakeSource {
    articles: Vec<ArticleDoc>,
    entities: HashMap<u64, Vec<EntityMention>>,
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
        docs.sort_by_key(|d| (d.time, d.id));
        if sort == SortSpec::Descending {
            docs.reverse();
        }
        docs.truncate(limit);
        Box::new(docs.into_iter())
    }

    fn find_entities(&self, doc_id: ObjectId) -> Box<dyn Iterator<Item = EntityMention> + '_> {
        let key = match doc_id {
            ObjectId::Int(n) => n,
            _ => 0,
        };
        Box::new(self.entities.get(&key).cloned().unwrap_or_default().into_iter())
    }
}

fn fake_source(n: usize) -> FakeSource {
    let articles = (0..n)
        .map(|i| ArticleDoc {
            id: ObjectId::Int(i as u64),
            time: i as i64 * 10,
        })
        .collect();
    let entities = (0..n as u64)
        .map(|i| (i, vec![EntityMention { sen: 0, ent: 1 }, EntityMention { sen: 1, ent: 2 }]))
        .collect();
    FakeSource { articles, entities }
}

// §8 scenario 6: a lookup_ge followed by two `next` hops across a
// batch_size=2 source issues exactly two batch fetches.
#[test]
fn crossing_a_batch_boundary_issues_exactly_two_fetches() {
    let source = fake_source(6);
    let tvg = Tvg::new(Flags::empty(), 1e-6, vec![]);
    let cache = GraphCache::new(usize::MAX);
    let translation = TranslationParams {
        max_distance: 5,
        sum_weights: true,
    };
    let mut synced = SyncedTvg::new(tvg, cache, &source, 2, translation);

    let a = synced.lookup_ge(0).unwrap().unwrap();
    assert_eq!(synced.fetch_count(), 1);

    let b = synced.next(&a).unwrap().unwrap();
    assert_eq!(synced.fetch_count(), 1, "second document of the first batch is already resident");

    let _c = synced.next(&b).unwrap().unwrap();
    assert_eq!(synced.fetch_count(), 2, "crossing the LOAD_NEXT boundary triggers one more fetch");
}
