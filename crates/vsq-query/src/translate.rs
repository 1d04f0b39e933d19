use std::collections::BTreeSet;

use vsq_filter::simplify;
use vsq_types::{AttributeKind, ChangeType, FeatureType, ObjectId};

use crate::capabilities::Capabilities;
use crate::config::AdapterConfig;
use crate::descriptor::{Projection, QueryDescriptor, QueryMode};
use crate::error::{QueryError, QueryResult};
use crate::request::QueryRequest;
use crate::sort::{SortBy, SortOrder};

/// Validates requests against a feature type and the adapter's
/// capabilities, producing canonical [`QueryDescriptor`]s.
#[derive(Clone, Debug, Default)]
pub struct QueryTranslator {
    config: AdapterConfig,
    capabilities: Capabilities,
}

impl QueryTranslator {
    pub fn new(config: AdapterConfig) -> Self {
        let capabilities = Capabilities::from_config(&config);
        Self {
            config,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn translate(
        &self,
        request: &QueryRequest,
        schema: &FeatureType,
    ) -> QueryResult<QueryDescriptor> {
        self.check_capabilities(request)?;

        request.filter.validate(schema)?;
        let simplified = simplify(&request.filter);
        if !self.capabilities.filter && !simplified.is_include() {
            return Err(unsupported("filter"));
        }
        let filter_attributes = request.filter.attribute_names(schema.geometry_attribute());

        let projection = projection(request, schema)?;
        let sort = sort_order(&request.sort, schema)?;
        if !self.capabilities.sort && !sort.is_natural() {
            return Err(unsupported("sort"));
        }

        let mode = match request.old_root_revision.as_deref().map(str::trim) {
            Some(old) if !old.is_empty() && !is_null_revision(old) => QueryMode::Diff {
                old_root: old.to_string(),
            },
            _ => QueryMode::Snapshot,
        };
        let change_types = change_types(request, &mode);

        let decimation = match request.decimation {
            Some(hint) if hint.tolerance.is_finite() && hint.tolerance > 0.0 => {
                Some(hint.tolerance)
            }
            Some(hint) => {
                tracing::debug!(tolerance = hint.tolerance, "ignoring non-positive decimation tolerance");
                None
            }
            None => None,
        };

        let descriptor = QueryDescriptor {
            type_name: schema.name.clone(),
            filter: request.filter.clone(),
            simplified,
            filter_attributes,
            projection,
            sort,
            offset: request.offset.unwrap_or(0),
            limit: request.max_features.filter(|&max| max != u64::MAX),
            root: request
                .root_revision
                .clone()
                .unwrap_or_else(|| self.config.root_ref.clone()),
            mode,
            change_types,
            decimation,
            geometry_factory: request.geometry_factory,
            default_geometry: schema.default_geometry.clone(),
        };
        tracing::trace!(
            type_name = %descriptor.type_name,
            filter = %descriptor.simplified,
            root = %descriptor.root,
            snapshot = descriptor.is_snapshot(),
            "translated query"
        );
        Ok(descriptor)
    }

    fn check_capabilities(&self, request: &QueryRequest) -> QueryResult<()> {
        if request.retype.as_ref().is_some_and(|r| !r.is_empty()) && !self.capabilities.retype {
            return Err(unsupported("retype"));
        }
        if request.version.is_some() && !self.capabilities.version {
            return Err(unsupported("version"));
        }
        let limited = request.max_features.is_some_and(|max| max != u64::MAX);
        if limited && !self.capabilities.limit {
            return Err(unsupported("limit"));
        }
        if request.offset.is_some_and(|offset| offset > 0) && !self.capabilities.offset {
            return Err(unsupported("offset"));
        }
        Ok(())
    }
}

fn unsupported(what: &str) -> QueryError {
    QueryError::UnsupportedCapability(what.to_string())
}

fn is_null_revision(spec: &str) -> bool {
    let reference = spec.split_once(':').map_or(spec, |(r, _)| r);
    ObjectId::from_hex(reference).is_ok_and(|id| id.is_null())
}

fn projection(request: &QueryRequest, schema: &FeatureType) -> QueryResult<Projection> {
    let Some(names) = &request.properties else {
        return Ok(Projection::All);
    };
    if names.is_empty() {
        return Ok(Projection::None);
    }
    let mut selected = BTreeSet::new();
    for name in names {
        if !schema.has_attribute(name) {
            return Err(QueryError::UnknownProperty {
                name: name.clone(),
                type_name: schema.name.clone(),
            });
        }
        selected.insert(name.clone());
    }
    Ok(Projection::Names(selected))
}

fn sort_order(keys: &[SortBy], schema: &FeatureType) -> QueryResult<SortOrder> {
    for key in keys {
        let SortBy::Property { name, .. } = key else {
            continue;
        };
        match schema.attribute(name) {
            None => {
                return Err(QueryError::InvalidSort {
                    property: name.clone(),
                    reason: format!("no such attribute in {}", schema.name),
                })
            }
            Some(attr) if attr.kind == AttributeKind::Geometry => {
                return Err(QueryError::InvalidSort {
                    property: name.clone(),
                    reason: "geometry attributes are not sortable".into(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(SortOrder::from_keys(keys))
}

fn change_types(request: &QueryRequest, mode: &QueryMode) -> BTreeSet<ChangeType> {
    let requested = request.change_types.as_ref().filter(|set| !set.is_empty());
    match mode {
        QueryMode::Snapshot => {
            let added: BTreeSet<_> = [ChangeType::Added].into_iter().collect();
            if let Some(set) = requested.filter(|set| **set != added) {
                tracing::debug!(requested = ?set, "no old root given; querying ADDED only");
            }
            added
        }
        QueryMode::Diff { .. } => requested
            .cloned()
            .unwrap_or_else(|| ChangeType::ALL.into_iter().collect()),
    }
}
