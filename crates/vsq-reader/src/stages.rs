//! Buffered and counting stages of the reader pipeline.
//!
//! Errors from upstream are always passed through: sorting stops buffering
//! at the first error and surfaces it, and pagination only counts features.

use vsq_query::SortOrder;
use vsq_types::Feature;

use crate::error::{ReaderError, ReaderResult};

pub type FeatureStream = Box<dyn Iterator<Item = ReaderResult<Feature>> + Send>;

/// Buffers all upstream features on the first pull and emits them sorted.
pub struct SortStage {
    upstream: Option<FeatureStream>,
    sort: SortOrder,
    sorted: std::vec::IntoIter<ReaderResult<Feature>>,
}

impl SortStage {
    pub fn new(upstream: FeatureStream, sort: SortOrder) -> Self {
        Self {
            upstream: Some(upstream),
            sort,
            sorted: Vec::new().into_iter(),
        }
    }

    fn fill(&mut self, upstream: FeatureStream) {
        let mut buffer: Vec<(usize, Feature)> = Vec::new();
        let mut failure: Option<ReaderError> = None;
        for (position, item) in upstream.enumerate() {
            match item {
                Ok(feature) => buffer.push((position, feature)),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = failure {
            self.sorted = vec![Err(e)].into_iter();
            return;
        }
        let sort = &self.sort;
        buffer.sort_by(|a, b| sort.compare((&a.1, a.0), (&b.1, b.0)));
        tracing::trace!(buffered = buffer.len(), "sorted features");
        self.sorted = buffer
            .into_iter()
            .map(|(_, f)| Ok(f))
            .collect::<Vec<_>>()
            .into_iter();
    }
}

impl Iterator for SortStage {
    type Item = ReaderResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(upstream) = self.upstream.take() {
            self.fill(upstream);
        }
        self.sorted.next()
    }
}

/// Skips `offset` features, then yields at most `limit`.
pub struct Paginate {
    upstream: FeatureStream,
    skip: u64,
    remaining: Option<u64>,
}

impl Paginate {
    pub fn new(upstream: FeatureStream, offset: u64, limit: Option<u64>) -> Self {
        Self {
            upstream,
            skip: offset,
            remaining: limit,
        }
    }
}

impl Iterator for Paginate {
    type Item = ReaderResult<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        loop {
            let item = self.upstream.next()?;
            if item.is_ok() && self.skip > 0 {
                self.skip -= 1;
                continue;
            }
            if item.is_ok() {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
            }
            return Some(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsq_query::SortBy;
    use vsq_types::{ChangeType, Value};

    fn stream(items: Vec<ReaderResult<Feature>>) -> FeatureStream {
        Box::new(items.into_iter())
    }

    fn feature(id: &str, rank: i64) -> ReaderResult<Feature> {
        let mut f = Feature::new(id, ChangeType::Added);
        f.push("rank", Value::Int(rank));
        Ok(f)
    }

    fn ids(items: impl Iterator<Item = ReaderResult<Feature>>) -> Vec<String> {
        items.map(|r| r.unwrap().id).collect()
    }

    #[test]
    fn sort_orders_buffered_features() {
        let upstream = stream(vec![feature("a", 3), feature("b", 1), feature("c", 2)]);
        let sorted = SortStage::new(upstream, SortOrder::Explicit(vec![SortBy::asc("rank")]));
        assert_eq!(ids(sorted), vec!["b", "c", "a"]);
    }

    #[test]
    fn sort_surfaces_upstream_error() {
        let upstream = stream(vec![
            feature("a", 3),
            Err(ReaderError::TypeNotFound("x".into())),
            feature("c", 2),
        ]);
        let mut sorted = SortStage::new(upstream, SortOrder::Explicit(vec![SortBy::Reverse]));
        assert!(matches!(sorted.next(), Some(Err(ReaderError::TypeNotFound(_)))));
        assert!(sorted.next().is_none());
    }

    #[test]
    fn paginate_window() {
        let items = || stream((0..6).map(|i| feature(&i.to_string(), i)).collect());
        assert_eq!(ids(Paginate::new(items(), 2, Some(3))), vec!["2", "3", "4"]);
        assert_eq!(ids(Paginate::new(items(), 5, None)), vec!["5"]);
        assert_eq!(ids(Paginate::new(items(), 9, None)).len(), 0);
        assert_eq!(ids(Paginate::new(items(), 0, Some(0))).len(), 0);
    }

    #[test]
    fn paginate_never_skips_errors() {
        let upstream = stream(vec![
            feature("a", 0),
            Err(ReaderError::TypeNotFound("x".into())),
            feature("b", 1),
        ]);
        let mut page = Paginate::new(upstream, 2, Some(1));
        assert!(matches!(page.next(), Some(Err(_))));
    }
}
