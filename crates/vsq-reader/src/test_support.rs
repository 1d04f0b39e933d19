//! Shared repository fixture for reader tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use geo_types::point;
use vsq_repo::{InMemoryRepository, RepoResult, Repository};
use vsq_store::ObjectStore;
use vsq_types::{AttributeDescriptor, AttributeKind, FeatureType, ObjectId, Value};

pub const ROADS: &str = "roads";

pub struct Fixture {
    pub repo: Arc<dyn Repository>,
    pub inner: Arc<InMemoryRepository>,
    pub r1: ObjectId,
    pub r2: ObjectId,
}

pub fn roads_type() -> FeatureType {
    FeatureType::new(
        ROADS,
        vec![
            AttributeDescriptor::new("name", AttributeKind::String),
            AttributeDescriptor::new("lanes", AttributeKind::Int),
            AttributeDescriptor::new("geom", AttributeKind::Geometry),
        ],
    )
    .with_crs("EPSG:4326")
}

pub fn road(name: &str, lanes: Option<i64>, x: f64, y: f64) -> Vec<Value> {
    vec![
        Value::from(name),
        lanes.map_or(Value::Null, Value::Int),
        Value::Geometry(point!(x: x, y: y).into()),
    ]
}

/// `empty` tag: no types. `r1` tag: roads {A, B, C}.
/// `main` (HEAD): roads {A, C, D} with A and C unchanged.
pub fn fixture() -> Fixture {
    let inner = Arc::new(InMemoryRepository::new());
    let mut builder = inner.builder("main").unwrap();
    let empty = builder.commit("empty").unwrap();
    inner.tag("empty", empty).unwrap();

    builder.put_type(roads_type()).unwrap();
    builder.put_feature(ROADS, "A", road("Main", Some(2), 0.0, 0.0)).unwrap();
    builder.put_feature(ROADS, "B", road("Oak", Some(1), 5.0, 5.0)).unwrap();
    builder.put_feature(ROADS, "C", road("Elm", Some(3), 10.0, 2.0)).unwrap();
    let r1 = builder.commit("r1").unwrap();
    inner.tag("r1", r1).unwrap();

    builder.remove_feature(ROADS, "B");
    builder.put_feature(ROADS, "D", road("Pine", None, -3.0, 8.0)).unwrap();
    let r2 = builder.commit("r2").unwrap();
    drop(builder);

    Fixture {
        repo: inner.clone(),
        inner,
        r1,
        r2,
    }
}

/// Repository wrapper counting every call that reaches the store.
pub struct CountingRepository {
    pub inner: Arc<InMemoryRepository>,
    pub calls: AtomicUsize,
}

impl CountingRepository {
    pub fn new(inner: Arc<InMemoryRepository>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Repository for CountingRepository {
    fn store(&self) -> Arc<dyn ObjectStore> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.store()
    }

    fn resolve_root(&self, reference: &str) -> RepoResult<Option<ObjectId>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_root(reference)
    }
}
