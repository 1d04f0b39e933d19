//! Diff entries to features.

use std::collections::HashMap;
use std::sync::Arc;

use vsq_diff::DiffEntry;
use vsq_repo::Repository;
use vsq_types::{Feature, FeatureType, GeometryFactory, ObjectId, Value};

use crate::error::{ReaderError, ReaderResult};

/// Turns diff entries into features, owned by one reader.
///
/// Feature types are resolved once per distinct metadata id. Removed
/// features are read from the old side of the entry, everything else from
/// the new side. With `load_content` off only ids and node bounds are
/// produced and the store is not touched.
pub struct Materializer {
    repo: Arc<dyn Repository>,
    types: HashMap<ObjectId, Arc<FeatureType>>,
    load_content: bool,
    geometry_factory: Option<GeometryFactory>,
}

impl Materializer {
    pub fn new(
        repo: Arc<dyn Repository>,
        load_content: bool,
        geometry_factory: Option<GeometryFactory>,
    ) -> Self {
        Self {
            repo,
            types: HashMap::new(),
            load_content,
            geometry_factory,
        }
    }

    pub fn materialize(&mut self, entry: &DiffEntry) -> ReaderResult<Feature> {
        let node = entry.relevant();
        let mut feature = Feature::new(node.name(), entry.change_type())
            .with_bounds(node.bounds().copied());
        if !self.load_content {
            return Ok(feature);
        }

        let schema = self.feature_type(node.metadata_id)?;
        let content = self
            .repo
            .resolve_feature(&node.object_id())?
            .ok_or_else(|| ReaderError::MissingContent {
                path: node.path(),
                id: node.object_id(),
            })?;
        if content.values.len() != schema.attributes.len() {
            return Err(ReaderError::CorruptFeature {
                path: node.path(),
                reason: format!(
                    "{} values for {} attributes of {}",
                    content.values.len(),
                    schema.attributes.len(),
                    schema.name
                ),
            });
        }

        for (attr, value) in schema.attributes.iter().zip(content.values) {
            let value = match (&self.geometry_factory, value) {
                (Some(factory), Value::Geometry(g)) => Value::Geometry(factory.apply(&g)),
                (_, value) => value,
            };
            feature.push(attr.name.clone(), value);
        }
        Ok(feature)
    }

    fn feature_type(&mut self, id: ObjectId) -> ReaderResult<Arc<FeatureType>> {
        if let Some(schema) = self.types.get(&id) {
            return Ok(schema.clone());
        }
        tracing::trace!(type_id = %id.short_hex(), "feature type cache miss");
        let schema = self
            .repo
            .resolve_type(&id)?
            .map(|t| Arc::new(t.schema))
            .ok_or(ReaderError::TypeResolutionFailure(id))?;
        self.types.insert(id, schema.clone());
        Ok(schema)
    }

    /// Number of distinct feature types resolved so far.
    pub fn cached_types(&self) -> usize {
        self.types.len()
    }
}
