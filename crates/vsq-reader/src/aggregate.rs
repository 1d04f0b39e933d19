//! Feature count and bounds, with shortcuts that avoid iteration.
//!
//! A snapshot query with an `INCLUDE` filter and no decimation is answered
//! from the type tree's node: its size is the feature count and its bounds
//! are the union of every feature's bounds. Differential queries are always
//! counted by iterating, whatever change types they select.

use std::sync::Arc;

use vsq_query::QueryDescriptor;
use vsq_repo::Repository;
use vsq_types::ReferencedEnvelope;

use crate::error::ReaderResult;
use crate::reader::open_reader;
use crate::resolver::RevisionResolver;

fn unfiltered_snapshot(descriptor: &QueryDescriptor) -> bool {
    descriptor.simplified.is_include()
        && descriptor.is_snapshot()
        && descriptor.decimation.is_none()
}

/// Number of features the query would return, honoring offset and limit.
pub fn count(
    repo: &Arc<dyn Repository>,
    type_path: &str,
    descriptor: &QueryDescriptor,
) -> ReaderResult<u64> {
    if descriptor.simplified.is_exclude() {
        tracing::debug!(type_path, "count: filter excludes everything");
        return Ok(0);
    }

    if unfiltered_snapshot(descriptor) {
        let resolved = RevisionResolver::new(repo.clone()).resolve(&descriptor.root, type_path)?;
        let available = resolved.tree.size().saturating_sub(descriptor.offset);
        let count = descriptor.limit.map_or(available, |limit| available.min(limit));
        tracing::debug!(type_path, size = resolved.tree.size(), count, "count: tree size shortcut");
        return Ok(count);
    }

    let mut count = 0;
    for feature in open_reader(repo, type_path, &descriptor.for_count())? {
        feature?;
        count += 1;
    }
    tracing::debug!(type_path, count, "count: iterated");
    Ok(count)
}

/// Bounding box of the features the query would return.
///
/// The result is empty, never an error, when nothing matches.
pub fn bounds(
    repo: &Arc<dyn Repository>,
    type_path: &str,
    descriptor: &QueryDescriptor,
    crs: Option<String>,
) -> ReaderResult<ReferencedEnvelope> {
    let mut result = ReferencedEnvelope::empty(crs);
    if descriptor.simplified.is_exclude() {
        tracing::debug!(type_path, "bounds: filter excludes everything");
        return Ok(result);
    }

    if unfiltered_snapshot(descriptor) && descriptor.offset == 0 && descriptor.limit.is_none() {
        let resolved = RevisionResolver::new(repo.clone()).resolve(&descriptor.root, type_path)?;
        if let Some(envelope) = resolved.bounds() {
            result.expand_to_include(envelope);
        }
        tracing::debug!(type_path, empty = result.is_empty(), "bounds: tree node shortcut");
        return Ok(result);
    }

    for feature in open_reader(repo, type_path, &descriptor.for_bounds())? {
        if let Some(envelope) = feature?.bounds {
            result.expand_to_include(&envelope);
        }
    }
    tracing::debug!(type_path, empty = result.is_empty(), "bounds: iterated");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, road, roads_type, CountingRepository, ROADS};
    use proptest::prelude::*;
    use vsq_filter::{CompareOp, Filter};
    use vsq_query::{QueryRequest, QueryTranslator, SortBy};
    use vsq_types::{ChangeType, Envelope};

    fn descriptor(request: QueryRequest) -> QueryDescriptor {
        QueryTranslator::default().translate(&request, &roads_type()).unwrap()
    }

    fn iterated_count(repo: &Arc<dyn Repository>, d: &QueryDescriptor) -> u64 {
        open_reader(repo, ROADS, d).unwrap().count() as u64
    }

    #[test]
    fn snapshot_count() {
        let fx = fixture();
        assert_eq!(count(&fx.repo, ROADS, &descriptor(QueryRequest::new())).unwrap(), 3);
        let at_r1 = descriptor(QueryRequest::new().with_root("r1"));
        assert_eq!(count(&fx.repo, ROADS, &at_r1).unwrap(), 3);
    }

    #[test]
    fn filtered_count_iterates() {
        let fx = fixture();
        let d = descriptor(
            QueryRequest::new().with_filter(Filter::compare("lanes", CompareOp::Ge, 2)),
        );
        assert_eq!(count(&fx.repo, ROADS, &d).unwrap(), 2);
    }

    #[test]
    fn diff_count() {
        let fx = fixture();
        let d = descriptor(QueryRequest::new().with_old_root("r1"));
        assert_eq!(count(&fx.repo, ROADS, &d).unwrap(), 2);

        let removed = descriptor(
            QueryRequest::new()
                .with_old_root("r1")
                .with_change_types([ChangeType::Removed]),
        );
        assert_eq!(count(&fx.repo, ROADS, &removed).unwrap(), 1);
    }

    #[test]
    fn shortcut_bounds_match_iteration() {
        let fx = fixture();
        let d = descriptor(QueryRequest::new());
        let shortcut = bounds(&fx.repo, ROADS, &d, Some("EPSG:4326".into())).unwrap();

        let mut iterated = ReferencedEnvelope::empty(Some("EPSG:4326".into()));
        for feature in open_reader(&fx.repo, ROADS, &d).unwrap() {
            iterated.expand_to_include(&feature.unwrap().bounds.unwrap());
        }
        assert_eq!(shortcut, iterated);
        assert_eq!(shortcut.envelope, Some(Envelope::new(-3.0, 0.0, 10.0, 8.0)));
    }

    #[test]
    fn filtered_bounds() {
        let fx = fixture();
        let d = descriptor(QueryRequest::new().with_filter(Filter::eq("name", "Elm")));
        let env = bounds(&fx.repo, ROADS, &d, None).unwrap();
        assert_eq!(env.envelope, Some(Envelope::point(10.0, 2.0)));

        let none = descriptor(QueryRequest::new().with_filter(Filter::eq("name", "Nope")));
        let env = bounds(&fx.repo, ROADS, &none, Some("EPSG:4326".into())).unwrap();
        assert!(env.is_empty());
        assert_eq!(env.crs.as_deref(), Some("EPSG:4326"));
    }

    #[test]
    fn diff_bounds_cover_removed_features() {
        let fx = fixture();
        let d = descriptor(
            QueryRequest::new()
                .with_old_root("r1")
                .with_change_types([ChangeType::Removed]),
        );
        let env = bounds(&fx.repo, ROADS, &d, None).unwrap();
        assert_eq!(env.envelope, Some(Envelope::point(5.0, 5.0)));
    }

    #[test]
    fn sorted_window_bounds_follow_the_sort() {
        let fx = fixture();
        let d = descriptor(
            QueryRequest::new()
                .with_sort(vec![SortBy::desc("lanes")])
                .with_max_features(1),
        );
        let env = bounds(&fx.repo, ROADS, &d, None).unwrap();
        assert_eq!(env.envelope, Some(Envelope::point(10.0, 2.0)));

        let mut iterated = ReferencedEnvelope::empty(None);
        for feature in open_reader(&fx.repo, ROADS, &d).unwrap() {
            iterated.expand_to_include(&feature.unwrap().bounds.unwrap());
        }
        assert_eq!(env, iterated);
    }

    #[test]
    fn decimated_count_follows_the_sort() {
        let fx = fixture();
        let mut builder = fx.inner.builder("main").unwrap();
        builder.put_feature(ROADS, "A2", road("Near", Some(1), 0.1, 0.1)).unwrap();
        builder.commit("crowd").unwrap();

        let d = descriptor(
            QueryRequest::new()
                .with_sort(vec![SortBy::asc("name")])
                .with_max_features(2)
                .with_decimation(1.0),
        );
        assert_eq!(count(&fx.repo, ROADS, &d).unwrap(), 2);
        assert_eq!(count(&fx.repo, ROADS, &d).unwrap(), iterated_count(&fx.repo, &d));
    }

    #[test]
    fn exclude_makes_no_store_access() {
        let fx = fixture();
        let counting = Arc::new(CountingRepository::new(fx.inner.clone()));
        let repo: Arc<dyn Repository> = counting.clone();
        let d = descriptor(QueryRequest::new().with_filter(Filter::Exclude));

        assert_eq!(count(&repo, ROADS, &d).unwrap(), 0);
        let env = bounds(&repo, ROADS, &d, Some("EPSG:4326".into())).unwrap();
        assert!(env.is_empty());
        assert_eq!(counting.calls(), 0);
    }

    proptest! {
        #[test]
        fn shortcut_count_matches_iteration(offset in 0u64..5, limit in prop::option::of(0u64..5)) {
            let fx = fixture();
            let mut request = QueryRequest::new().with_offset(offset);
            if let Some(limit) = limit {
                request = request.with_max_features(limit);
            }
            let d = descriptor(request);
            prop_assert_eq!(count(&fx.repo, ROADS, &d).unwrap(), iterated_count(&fx.repo, &d));
        }
    }
}
