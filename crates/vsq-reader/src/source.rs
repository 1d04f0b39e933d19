//! A feature type at a revision, exposed as a queryable source.

use std::collections::BTreeSet;
use std::sync::Arc;

use vsq_query::{AdapterConfig, Capabilities, QueryDescriptor, QueryRequest, QueryTranslator};
use vsq_repo::{Repository, RevSpec};
use vsq_store::NodeRef;
use vsq_types::{ChangeType, Feature, FeatureType, ReferencedEnvelope};

use crate::aggregate;
use crate::error::{ReaderError, ReaderResult};
use crate::reader::{self, FeatureReader};

/// One feature type of a repository, viewed at a configurable revision.
///
/// The root ref, old root and change types act as view defaults: a request
/// that leaves them unset picks them up when it is translated. Each query
/// resolves refs afresh, so a moved branch is seen by the next query.
pub struct VersionedFeatureSource {
    repo: Arc<dyn Repository>,
    type_name: String,
    translator: QueryTranslator,
    root_ref: String,
    old_root: Option<String>,
    change_types: Option<BTreeSet<ChangeType>>,
}

impl VersionedFeatureSource {
    pub fn new(repo: Arc<dyn Repository>, type_name: impl Into<String>, config: AdapterConfig) -> Self {
        let root_ref = config.root_ref.clone();
        Self {
            repo,
            type_name: type_name.into(),
            translator: QueryTranslator::new(config),
            root_ref,
            old_root: None,
            change_types: None,
        }
    }

    /// The name this source was opened under.
    pub fn name(&self) -> &str {
        &self.type_name
    }

    pub fn root_ref(&self) -> &str {
        &self.root_ref
    }

    pub fn set_root_ref(&mut self, root_ref: impl Into<String>) {
        self.root_ref = root_ref.into();
    }

    /// Switch between snapshot (`None`) and differential views.
    pub fn set_old_root(&mut self, old_root: Option<String>) {
        self.old_root = old_root;
    }

    pub fn set_change_types(&mut self, change_types: impl IntoIterator<Item = ChangeType>) {
        self.change_types = Some(change_types.into_iter().collect());
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.translator.capabilities()
    }

    /// The type tree at the view's root, matched by full path or by its
    /// last path segment.
    pub fn type_ref(&self) -> ReaderResult<NodeRef> {
        self.type_ref_at(&self.root_ref)
    }

    fn type_ref_at(&self, root: &str) -> ReaderResult<NodeRef> {
        let spec = RevSpec::parse(root)?;
        let trees = self
            .repo
            .type_trees(&spec.reference)?
            .ok_or_else(|| ReaderError::RevisionNotFound(root.to_string()))?;
        let wanted = self.type_name.trim_matches('/');
        trees
            .iter()
            .find(|node| node.path() == wanted)
            .or_else(|| trees.iter().find(|node| node.name() == wanted))
            .cloned()
            .ok_or_else(|| ReaderError::TypeNotFound(self.type_name.clone()))
    }

    /// The native feature type, renamed to this source's name if needed.
    pub fn schema(&self) -> ReaderResult<FeatureType> {
        self.schema_of(&self.type_ref()?)
    }

    fn schema_of(&self, type_ref: &NodeRef) -> ReaderResult<FeatureType> {
        let native = self
            .repo
            .resolve_type(&type_ref.metadata_id)?
            .ok_or(ReaderError::TypeResolutionFailure(type_ref.metadata_id))?
            .schema;
        Ok(if native.name == self.type_name {
            native
        } else {
            native.renamed(self.type_name.clone())
        })
    }

    /// Translate a request with the view defaults filled in.
    pub fn descriptor(&self, request: &QueryRequest) -> ReaderResult<QueryDescriptor> {
        let (descriptor, _) = self.prepare(request)?;
        Ok(descriptor)
    }

    /// Fill in the view defaults, then resolve the type and its schema at
    /// the request's effective root.
    fn prepare(&self, request: &QueryRequest) -> ReaderResult<(QueryDescriptor, NodeRef)> {
        let mut request = request.clone();
        let root = request
            .root_revision
            .get_or_insert_with(|| self.root_ref.clone())
            .clone();
        let type_ref = self.type_ref_at(&root)?;
        let schema = self.schema_of(&type_ref)?;
        if request.old_root_revision.is_none() {
            request.old_root_revision = self.old_root.clone();
        }
        if request.change_types.is_none() {
            request.change_types = self.change_types.clone();
        }
        let descriptor = self.translator.translate(&request, &schema)?;
        Ok((descriptor, type_ref))
    }

    pub fn open_reader(&self, request: &QueryRequest) -> ReaderResult<FeatureReader> {
        let (descriptor, type_ref) = self.prepare(request)?;
        reader::open_reader(&self.repo, &type_ref.path(), &descriptor)
    }

    pub fn count(&self, request: &QueryRequest) -> ReaderResult<u64> {
        let (descriptor, type_ref) = self.prepare(request)?;
        aggregate::count(&self.repo, &type_ref.path(), &descriptor)
    }

    /// Bounds in the schema's CRS.
    pub fn bounds(&self, request: &QueryRequest) -> ReaderResult<ReferencedEnvelope> {
        let (descriptor, type_ref) = self.prepare(request)?;
        let crs = self.schema_of(&type_ref)?.crs;
        aggregate::bounds(&self.repo, &type_ref.path(), &descriptor, crs)
    }

    /// Run a query to completion.
    pub fn query(&self, request: &QueryRequest) -> ReaderResult<Vec<Feature>> {
        self.open_reader(request)?.collect()
    }
}

impl std::fmt::Debug for VersionedFeatureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedFeatureSource")
            .field("type_name", &self.type_name)
            .field("root_ref", &self.root_ref)
            .field("old_root", &self.old_root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture, Fixture, ROADS};
    use vsq_query::{CapabilityToggles, QueryError};
    use vsq_types::{Envelope, Value};

    fn source(fx: &Fixture, name: &str) -> VersionedFeatureSource {
        VersionedFeatureSource::new(fx.repo.clone(), name, AdapterConfig::default())
    }

    fn ids(features: &[Feature]) -> Vec<&str> {
        features.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn snapshot_through_the_source() {
        let fx = fixture();
        let src = source(&fx, ROADS);
        assert_eq!(src.name(), ROADS);
        assert_eq!(src.root_ref(), "HEAD");
        assert_eq!(ids(&src.query(&QueryRequest::new()).unwrap()), vec!["A", "C", "D"]);
        assert_eq!(src.count(&QueryRequest::new()).unwrap(), 3);

        let env = src.bounds(&QueryRequest::new()).unwrap();
        assert_eq!(env.crs.as_deref(), Some("EPSG:4326"));
        assert_eq!(env.envelope, Some(Envelope::new(-3.0, 0.0, 10.0, 8.0)));
    }

    #[test]
    fn view_settings_apply_to_requests() {
        let fx = fixture();
        let mut src = source(&fx, ROADS);
        src.set_old_root(Some("r1".into()));
        let changes = src.query(&QueryRequest::new()).unwrap();
        assert_eq!(ids(&changes), vec!["B", "D"]);

        src.set_change_types([ChangeType::Removed]);
        let removed = src.query(&QueryRequest::new()).unwrap();
        assert_eq!(ids(&removed), vec!["B"]);
        assert_eq!(removed[0].get("name"), Some(&Value::from("Oak")));

        // Explicit request settings win over the view.
        let added = src
            .query(&QueryRequest::new().with_change_types([ChangeType::Added]))
            .unwrap();
        assert_eq!(ids(&added), vec!["D"]);

        src.set_old_root(None);
        src.set_root_ref("r1");
        assert_eq!(ids(&src.query(&QueryRequest::new()).unwrap()), vec!["A", "B", "C"]);
    }

    #[test]
    fn unknown_type_is_reported() {
        let fx = fixture();
        let src = source(&fx, "streets");
        assert!(matches!(src.type_ref(), Err(ReaderError::TypeNotFound(_))));
        assert!(matches!(src.count(&QueryRequest::new()), Err(ReaderError::TypeNotFound(_))));

        let schema = source(&fx, ROADS).schema().unwrap();
        assert_eq!(schema.name, ROADS);
        assert_eq!(schema.attributes.len(), 3);
    }

    #[test]
    fn nested_type_found_by_last_segment() {
        use vsq_store::{Node, ObjectStoreExt, RevCommit, RevFeature, RevFeatureType, TreeBuilder};

        let fx = fixture();
        let store = fx.inner.objects();
        let schema = crate::test_support::roads_type().renamed("rail");
        let type_id = store.write_feature_type(&RevFeatureType::new(schema)).unwrap();
        let content = RevFeature::new(crate::test_support::road("Coast", Some(2), 1.0, 1.0));
        let feature_id = store.write_feature(&content).unwrap();

        let mut rail = TreeBuilder::new();
        rail.put_feature(Node::feature("R1", feature_id, Some(Envelope::point(1.0, 1.0))));
        let rail = rail.build().unwrap();
        store.write_tree(&rail).unwrap();
        let mut transport = TreeBuilder::new();
        transport.put_tree("rail", &rail, type_id);
        let transport = transport.build().unwrap();
        store.write_tree(&transport).unwrap();
        let mut root = TreeBuilder::new();
        root.put_tree("transport", &transport, vsq_types::ObjectId::null());
        let root = root.build().unwrap();
        let tree_id = store.write_tree(&root).unwrap();
        let commit = store
            .write_commit(&RevCommit {
                tree_id,
                parents: vec![],
                message: "nested".into(),
            })
            .unwrap();
        fx.inner.update_ref("refs/heads/nested", commit).unwrap();

        let mut src = source(&fx, "rail");
        src.set_root_ref("nested");
        assert_eq!(src.type_ref().unwrap().path(), "transport/rail");
        assert_eq!(src.schema().unwrap().name, "rail");
        let features = src.query(&QueryRequest::new()).unwrap();
        assert_eq!(ids(&features), vec!["R1"]);
        assert_eq!(features[0].get("name"), Some(&Value::from("Coast")));

        let mut by_path = source(&fx, "transport/rail");
        by_path.set_root_ref("nested");
        assert_eq!(by_path.schema().unwrap().name, "transport/rail");
        assert_eq!(by_path.count(&QueryRequest::new()).unwrap(), 1);
    }

    #[test]
    fn request_root_selects_the_schema() {
        let fx = fixture();
        let mut builder = fx.inner.builder("dev").unwrap();
        builder
            .put_type(crate::test_support::roads_type().renamed("rivers"))
            .unwrap();
        builder
            .put_feature("rivers", "R", crate::test_support::road("Elbe", None, 3.0, 3.0))
            .unwrap();
        builder.commit("rivers").unwrap();

        let src = source(&fx, "rivers");
        assert!(matches!(src.type_ref(), Err(ReaderError::TypeNotFound(_))));
        let at_dev = QueryRequest::new().with_root("dev");
        assert_eq!(ids(&src.query(&at_dev).unwrap()), vec!["R"]);
        assert_eq!(src.count(&at_dev).unwrap(), 1);
        assert_eq!(
            src.bounds(&at_dev).unwrap().envelope,
            Some(Envelope::point(3.0, 3.0))
        );
    }

    #[test]
    fn unknown_root_is_reported() {
        let fx = fixture();
        let mut src = source(&fx, ROADS);
        src.set_root_ref("nope");
        assert!(matches!(src.type_ref(), Err(ReaderError::RevisionNotFound(_))));
    }

    #[test]
    fn disabled_capabilities_reject_requests() {
        let fx = fixture();
        let config = AdapterConfig {
            capabilities: CapabilityToggles {
                sort: false,
                ..CapabilityToggles::default()
            },
            ..AdapterConfig::default()
        };
        let src = VersionedFeatureSource::new(fx.repo.clone(), ROADS, config);
        assert!(!src.capabilities().sort);
        let request = QueryRequest::new().with_sort(vec![vsq_query::SortBy::asc("name")]);
        assert!(matches!(
            src.open_reader(&request),
            Err(ReaderError::Query(QueryError::UnsupportedCapability(_)))
        ));
    }
}
