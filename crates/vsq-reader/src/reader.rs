//! The feature reader pipeline.

use std::sync::Arc;

use uuid::Uuid;
use vsq_query::{Projection, QueryDescriptor};
use vsq_repo::Repository;
use vsq_types::{Feature, ObjectId};

use crate::decimate::ScreenMap;
use crate::error::{ReaderError, ReaderResult};
use crate::materialize::Materializer;
use crate::resolver::RevisionResolver;
use crate::stages::{FeatureStream, Paginate, SortStage};

/// Single-pass iterator over the features a query selects.
///
/// After the first error the reader is exhausted. Dropping it releases the
/// trees and caches it holds.
pub struct FeatureReader {
    query_id: Uuid,
    type_path: String,
    stream: FeatureStream,
    emitted: u64,
    done: bool,
}

impl FeatureReader {
    fn new(query_id: Uuid, type_path: &str, stream: FeatureStream) -> Self {
        Self {
            query_id,
            type_path: type_path.to_string(),
            stream,
            emitted: 0,
            done: false,
        }
    }

    /// A reader that yields nothing.
    pub fn empty(type_path: &str) -> Self {
        Self::new(Uuid::now_v7(), type_path, Box::new(std::iter::empty()))
    }

    /// Time-ordered id tagging this reader's log events.
    pub fn query_id(&self) -> Uuid {
        self.query_id
    }

    /// Features emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl Iterator for FeatureReader {
    type Item = ReaderResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.stream.next() {
            Some(Ok(feature)) => {
                self.emitted += 1;
                Some(Ok(feature))
            }
            Some(Err(e)) => {
                tracing::debug!(query_id = %self.query_id, error = %e, "reader failed");
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for FeatureReader {}

impl Drop for FeatureReader {
    fn drop(&mut self) {
        tracing::debug!(
            query_id = %self.query_id,
            type_path = %self.type_path,
            emitted = self.emitted,
            exhausted = self.done,
            "reader closed"
        );
    }
}

/// Open a reader over the type tree at `type_path`.
///
/// Revisions are resolved before this returns, so an unknown root fails
/// here rather than on the first pull. An `EXCLUDE` filter returns an empty
/// reader without touching the repository.
pub fn open_reader(
    repo: &Arc<dyn Repository>,
    type_path: &str,
    descriptor: &QueryDescriptor,
) -> ReaderResult<FeatureReader> {
    let query_id = Uuid::now_v7();
    if descriptor.simplified.is_exclude() {
        tracing::debug!(%query_id, type_path, "filter excludes everything; empty reader");
        return Ok(FeatureReader::new(query_id, type_path, Box::new(std::iter::empty())));
    }

    let resolver = RevisionResolver::new(repo.clone());
    let (old, new) = match descriptor.old_root() {
        Some(old_root) => resolver.resolve_range(&descriptor.root, old_root, type_path)?,
        None => {
            let new = resolver.resolve(&descriptor.root, type_path)?;
            let old = resolver.resolve(&ObjectId::null().to_hex(), type_path)?;
            (old, new)
        }
    };
    tracing::debug!(
        %query_id,
        type_path,
        root = %new.spec,
        old_root = %old.spec,
        filter = %descriptor.simplified,
        "opening reader"
    );

    // Source: changed nodes of the wanted kinds.
    let change_types = descriptor.change_types.clone();
    let walk = repo
        .diff(old.walk_root(), new.walk_root())
        .map(|entry| entry.map_err(ReaderError::from))
        .filter(move |entry| {
            entry
                .as_ref()
                .map_or(true, |e| change_types.contains(&e.change_type()))
        });

    // Materialize.
    let mut materializer = Materializer::new(
        repo.clone(),
        descriptor.needs_content(),
        descriptor.geometry_factory,
    );
    let mut stream: FeatureStream =
        Box::new(walk.map(move |entry| entry.and_then(|e| materializer.materialize(&e))));

    // Filter.
    if !descriptor.simplified.is_include() {
        let filter = descriptor.simplified.clone();
        stream = Box::new(stream.filter(move |item| {
            item.as_ref().map_or(true, |feature| filter.evaluate(feature))
        }));
    }

    // Project to the requested attributes plus sort keys.
    if let Some(keep) = descriptor.working_attributes() {
        stream = Box::new(stream.map(move |item| {
            item.map(|mut feature| {
                feature.retain_attributes(|name| keep.contains(name));
                feature
            })
        }));
    }

    // Sort, then drop sort-only attributes.
    if !descriptor.sort.is_natural() {
        stream = Box::new(SortStage::new(stream, descriptor.sort.clone()));
        let sort_only = descriptor
            .sort
            .attribute_names()
            .iter()
            .any(|name| !descriptor.projection.includes(name));
        if sort_only {
            let projection: Projection = descriptor.projection.clone();
            stream = Box::new(stream.map(move |item| {
                item.map(|mut feature| {
                    feature.retain_attributes(|name| projection.includes(name));
                    feature
                })
            }));
        }
    }

    if descriptor.offset > 0 || descriptor.limit.is_some() {
        stream = Box::new(Paginate::new(stream, descriptor.offset, descriptor.limit));
    }

    if let Some(tolerance) = descriptor.decimation {
        let mut screen = ScreenMap::new(tolerance);
        stream = Box::new(stream.filter(move |item| {
            item.as_ref()
                .map_or(true, |feature| screen.check(feature.bounds.as_ref()))
        }));
    }

    Ok(FeatureReader::new(query_id, type_path, stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, road, CountingRepository, ROADS};
    use proptest::prelude::*;
    use vsq_filter::{CompareOp, Filter};
    use vsq_query::{QueryRequest, QueryTranslator, SortBy};
    use vsq_types::{ChangeType, Value};

    fn descriptor(request: QueryRequest) -> QueryDescriptor {
        QueryTranslator::default()
            .translate(&request, &crate::test_support::roads_type())
            .unwrap()
    }

    fn run(repo: &Arc<dyn Repository>, request: QueryRequest) -> Vec<Feature> {
        open_reader(repo, ROADS, &descriptor(request))
            .unwrap()
            .collect::<ReaderResult<_>>()
            .unwrap()
    }

    fn ids(features: &[Feature]) -> Vec<&str> {
        features.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn snapshot_yields_live_features_as_added() {
        let fx = fixture();
        let features = run(&fx.repo, QueryRequest::new());
        assert_eq!(ids(&features), vec!["A", "C", "D"]);
        assert!(features.iter().all(|f| f.change_type == ChangeType::Added));
        assert_eq!(features[0].get("name"), Some(&Value::from("Main")));
        assert_eq!(features[0].len(), 3);
    }

    #[test]
    fn snapshot_at_tag() {
        let fx = fixture();
        let features = run(&fx.repo, QueryRequest::new().with_root("r1"));
        assert_eq!(ids(&features), vec!["A", "B", "C"]);
        let by_hex = run(&fx.repo, QueryRequest::new().with_root(fx.r1.to_hex()));
        assert_eq!(features, by_hex);
    }

    #[test]
    fn diff_between_revisions() {
        let fx = fixture();
        let changes = run(&fx.repo, QueryRequest::new().with_old_root("r1"));
        let pairs: Vec<_> = changes.iter().map(|f| (f.id.as_str(), f.change_type)).collect();
        assert_eq!(pairs, vec![("B", ChangeType::Removed), ("D", ChangeType::Added)]);
    }

    #[test]
    fn removed_only_reads_old_content() {
        let fx = fixture();
        let removed = run(
            &fx.repo,
            QueryRequest::new()
                .with_old_root("r1")
                .with_change_types([ChangeType::Removed]),
        );
        assert_eq!(ids(&removed), vec!["B"]);
        assert_eq!(removed[0].get("name"), Some(&Value::from("Oak")));

        let added = run(
            &fx.repo,
            QueryRequest::new()
                .with_old_root("r1")
                .with_change_types([ChangeType::Added]),
        );
        assert_eq!(ids(&added), vec!["D"]);
    }

    #[test]
    fn modified_features_use_new_content() {
        let fx = fixture();
        let mut builder = fx.inner.builder("main").unwrap();
        builder.put_feature(ROADS, "A", road("Main St", Some(4), 0.0, 0.0)).unwrap();
        builder.commit("rename").unwrap();

        let changes = run(
            &fx.repo,
            QueryRequest::new()
                .with_old_root(fx.r2.to_hex())
                .with_change_types([ChangeType::Modified]),
        );
        assert_eq!(ids(&changes), vec!["A"]);
        assert_eq!(changes[0].get("name"), Some(&Value::from("Main St")));
    }

    #[test]
    fn old_root_without_type_reports_everything_added() {
        let fx = fixture();
        let changes = run(&fx.repo, QueryRequest::new().with_old_root("empty"));
        assert_eq!(ids(&changes), vec!["A", "C", "D"]);
        assert!(changes.iter().all(|f| f.change_type == ChangeType::Added));
    }

    #[test]
    fn filter_projection_and_sort() {
        let fx = fixture();
        let features = run(
            &fx.repo,
            QueryRequest::new()
                .with_filter(Filter::not(Filter::is_null("lanes")))
                .with_properties(["name"])
                .with_sort(vec![SortBy::desc("lanes")]),
        );
        assert_eq!(ids(&features), vec!["C", "A"]);
        for f in &features {
            assert_eq!(f.attribute_names().collect::<Vec<_>>(), vec!["name"]);
        }
    }

    #[test]
    fn zero_property_projection_keeps_bounds() {
        let fx = fixture();
        let features = run(&fx.repo, QueryRequest::new().with_properties(Vec::<String>::new()));
        assert_eq!(features.len(), 3);
        assert!(features.iter().all(|f| f.is_empty() && f.bounds.is_some()));
    }

    #[test]
    fn reverse_natural_order() {
        let fx = fixture();
        let features = run(&fx.repo, QueryRequest::new().with_sort(vec![SortBy::Reverse]));
        assert_eq!(ids(&features), vec!["D", "C", "A"]);
    }

    #[test]
    fn exclude_touches_nothing() {
        let fx = fixture();
        let counting = Arc::new(CountingRepository::new(fx.inner.clone()));
        let repo: Arc<dyn Repository> = counting.clone();
        let filter = Filter::and(vec![
            Filter::eq("name", "Main"),
            Filter::not(Filter::eq("name", "Main")),
        ]);
        let mut reader = open_reader(&repo, ROADS, &descriptor(QueryRequest::new().with_filter(filter)))
            .unwrap();
        assert!(reader.next().is_none());
        assert_eq!(counting.calls(), 0);
    }

    #[test]
    fn two_opens_yield_identical_sequences() {
        let fx = fixture();
        let d = descriptor(QueryRequest::new().with_filter(Filter::compare("lanes", CompareOp::Ge, 2)));
        let first: Vec<_> = open_reader(&fx.repo, ROADS, &d).unwrap().map(Result::unwrap).collect();
        let second: Vec<_> = open_reader(&fx.repo, ROADS, &d).unwrap().map(Result::unwrap).collect();
        assert_eq!(first, second);
        assert_eq!(ids(&first), vec!["A", "C"]);
    }

    #[test]
    fn each_reader_gets_its_own_query_id() {
        let fx = fixture();
        let d = descriptor(QueryRequest::new());
        let first = open_reader(&fx.repo, ROADS, &d).unwrap();
        let second = open_reader(&fx.repo, ROADS, &d).unwrap();
        assert_ne!(first.query_id(), second.query_id());
        assert_eq!(first.query_id().get_version_num(), 7);
        assert_eq!(FeatureReader::empty(ROADS).count(), 0);
    }

    #[test]
    fn unknown_root_fails_at_open() {
        let fx = fixture();
        let d = descriptor(QueryRequest::new().with_root("missing"));
        assert!(matches!(
            open_reader(&fx.repo, ROADS, &d),
            Err(ReaderError::RevisionNotFound(_))
        ));
    }

    #[test]
    fn missing_content_fails_then_fuses() {
        let fx = fixture();
        let node = fx
            .repo
            .resolve_node(&vsq_repo::RevSpec::head("roads/C"))
            .unwrap()
            .unwrap();
        fx.inner.objects().remove(&node.object_id());

        let mut reader = open_reader(&fx.repo, ROADS, &descriptor(QueryRequest::new())).unwrap();
        assert_eq!(reader.next().unwrap().unwrap().id, "A");
        assert!(matches!(reader.next(), Some(Err(ReaderError::MissingContent { .. }))));
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
        assert_eq!(reader.emitted(), 1);
    }

    #[test]
    fn decimation_drops_features_sharing_a_cell() {
        let fx = fixture();
        let mut builder = fx.inner.builder("main").unwrap();
        builder.put_feature(ROADS, "A2", road("Near", Some(1), 0.1, 0.1)).unwrap();
        builder.commit("crowd").unwrap();

        let all = run(&fx.repo, QueryRequest::new());
        assert_eq!(all.len(), 4);
        let decimated = run(&fx.repo, QueryRequest::new().with_decimation(1.0));
        assert_eq!(ids(&decimated), vec!["A", "C", "D"]);
    }

    proptest! {
        #[test]
        fn offset_limit_is_a_window(offset in 0u64..5, limit in prop::option::of(0u64..5)) {
            let fx = fixture();
            let full = run(&fx.repo, QueryRequest::new());
            let mut request = QueryRequest::new().with_offset(offset);
            if let Some(limit) = limit {
                request = request.with_max_features(limit);
            }
            let page = run(&fx.repo, request);
            let expected: Vec<_> = full
                .iter()
                .skip(offset as usize)
                .take(limit.map_or(usize::MAX, |l| l as usize))
                .cloned()
                .collect();
            prop_assert_eq!(page, expected);
        }
    }
}
