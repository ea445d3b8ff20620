//! Targeting configuration.
//!
//! [`TargetingConfiguration`] is the full per-viewer settings block. It is
//! only changed through explicit calls; [`TargetingOptions`] is the partial
//! update accepted by `configure`, where absent fields leave the current
//! value untouched.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::viewer::validate_field_of_view;

/// Which geometry the resolver ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GeometryGranularity {
    /// Whole objects, by world position.
    #[default]
    Objects,
    /// Visible edges, by midpoint.
    Edges,
    /// Visible welded vertices.
    Vertices,
}

impl GeometryGranularity {
    /// Returns whether edge extraction is needed.
    pub fn needs_geometry(self) -> bool {
        !matches!(self, GeometryGranularity::Objects)
    }
}

/// Which mesh of an object feeds edge extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeshSource {
    /// The render mesh.
    #[default]
    Visual,
    /// The physics/collision mesh.
    Collision,
}

/// Which execution backends should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendSelection {
    /// No backend; outputs stay empty.
    None,
    /// The immediate per-object backend.
    #[default]
    Object,
    /// The batched data-oriented backend.
    Entity,
    /// Both backends side by side.
    Both,
}

impl BackendSelection {
    /// Returns whether the object backend is selected.
    pub fn wants_object(self) -> bool {
        matches!(self, BackendSelection::Object | BackendSelection::Both)
    }

    /// Returns whether the entity backend is selected.
    pub fn wants_entity(self) -> bool {
        matches!(self, BackendSelection::Entity | BackendSelection::Both)
    }
}

/// Worker settings for the data-oriented backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Worker thread count; `None` lets the pool decide.
    pub worker_threads: Option<usize>,
    /// Items per job chunk.
    pub chunk_size: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            worker_threads: None,
            chunk_size: 64,
        }
    }
}

/// Per-viewer targeting settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfiguration {
    /// Whether targeting runs at all.
    pub enabled: bool,
    /// Geometry granularity to target.
    pub granularity: GeometryGranularity,
    /// Only objects carrying this tag are candidates.
    pub tag_filter: Option<String>,
    /// Mesh used for edge extraction.
    pub mesh_source: MeshSource,
    /// Backends to run.
    pub backend: BackendSelection,
    /// Maximum number of ranked targets to publish.
    pub max_targets: Option<usize>,
    /// Classify edges on worker threads in the object backend.
    pub parallel_edges: bool,
    /// Data-oriented backend worker settings.
    pub batch: BatchSettings,
}

impl Default for TargetingConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            granularity: GeometryGranularity::Objects,
            tag_filter: None,
            mesh_source: MeshSource::Visual,
            backend: BackendSelection::Object,
            max_targets: None,
            parallel_edges: true,
            batch: BatchSettings::default(),
        }
    }
}

impl TargetingConfiguration {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the geometry granularity.
    #[must_use]
    pub fn with_granularity(mut self, granularity: GeometryGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Sets the tag filter.
    #[must_use]
    pub fn with_tag_filter(mut self, tag: impl Into<String>) -> Self {
        self.tag_filter = Some(tag.into());
        self
    }

    /// Sets the backend selection.
    #[must_use]
    pub fn with_backend(mut self, backend: BackendSelection) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the mesh source.
    #[must_use]
    pub fn with_mesh_source(mut self, mesh_source: MeshSource) -> Self {
        self.mesh_source = mesh_source;
        self
    }

    /// Limits the number of ranked targets.
    #[must_use]
    pub fn with_max_targets(mut self, max: usize) -> Self {
        self.max_targets = Some(max);
        self
    }
}

/// A partial configuration update.
///
/// An empty string for `tag_filter` clears the filter, and a `max_targets`
/// of 0 removes the limit. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetingOptions {
    /// New granularity.
    pub geometry_granularity: Option<GeometryGranularity>,
    /// New tag filter; empty clears it.
    pub tag_filter: Option<String>,
    /// New backend selection.
    pub backend: Option<BackendSelection>,
    /// New vertical field of view in degrees (applies to the viewer).
    pub field_of_view: Option<f32>,
    /// Enable or disable targeting.
    pub enabled: Option<bool>,
    /// New mesh source.
    pub mesh_source: Option<MeshSource>,
    /// New ranked-target limit; 0 removes it.
    pub max_targets: Option<usize>,
    /// Enable or disable parallel edge classification.
    pub parallel_edges: Option<bool>,
}

impl TargetingOptions {
    /// Parses options from JSON, e.g. `{"geometryGranularity": "edges"}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks values that have a restricted range.
    pub fn validate(&self) -> Result<()> {
        if let Some(fov) = self.field_of_view {
            validate_field_of_view(fov)?;
        }
        Ok(())
    }

    /// Applies every present field to `config`.
    ///
    /// Returns which parts changed. The field of view is not part of the
    /// configuration and is left to the caller.
    pub fn apply_to(&self, config: &mut TargetingConfiguration) -> ConfigChanges {
        let mut changes = ConfigChanges::default();

        if let Some(granularity) = self.geometry_granularity {
            changes.granularity = config.granularity != granularity;
            config.granularity = granularity;
        }
        if let Some(tag) = &self.tag_filter {
            let tag = (!tag.is_empty()).then(|| tag.clone());
            changes.tag_filter = config.tag_filter != tag;
            config.tag_filter = tag;
        }
        if let Some(backend) = self.backend {
            changes.backend = config.backend != backend;
            config.backend = backend;
        }
        if let Some(mesh_source) = self.mesh_source {
            changes.mesh_source = config.mesh_source != mesh_source;
            config.mesh_source = mesh_source;
        }
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(max) = self.max_targets {
            config.max_targets = (max > 0).then_some(max);
        }
        if let Some(parallel) = self.parallel_edges {
            config.parallel_edges = parallel;
        }
        changes
    }
}

/// Which configuration parts an update touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    /// Granularity changed.
    pub granularity: bool,
    /// Tag filter changed.
    pub tag_filter: bool,
    /// Backend selection changed.
    pub backend: bool,
    /// Mesh source changed.
    pub mesh_source: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SightlineError;

    #[test]
    fn test_defaults() {
        let config = TargetingConfiguration::default();
        assert!(config.enabled);
        assert_eq!(config.granularity, GeometryGranularity::Objects);
        assert_eq!(config.backend, BackendSelection::Object);
        assert!(config.tag_filter.is_none());
    }

    #[test]
    fn test_builder() {
        let config = TargetingConfiguration::new()
            .with_granularity(GeometryGranularity::Edges)
            .with_tag_filter("enemy")
            .with_backend(BackendSelection::Both)
            .with_max_targets(3);
        assert!(config.granularity.needs_geometry());
        assert_eq!(config.tag_filter.as_deref(), Some("enemy"));
        assert!(config.backend.wants_object() && config.backend.wants_entity());
        assert_eq!(config.max_targets, Some(3));
    }

    #[test]
    fn test_options_from_json() {
        let options = TargetingOptions::from_json(
            r#"{"geometryGranularity": "vertices", "tagFilter": "prop", "backend": "entity", "fieldOfView": 25.0}"#,
        )
        .unwrap();
        assert_eq!(options.geometry_granularity, Some(GeometryGranularity::Vertices));
        assert_eq!(options.tag_filter.as_deref(), Some("prop"));
        assert_eq!(options.backend, Some(BackendSelection::Entity));
        assert_eq!(options.field_of_view, Some(25.0));
    }

    #[test]
    fn test_options_reject_bad_fov() {
        let result = TargetingOptions::from_json(r#"{"fieldOfView": 0.0}"#);
        assert!(matches!(result, Err(SightlineError::InvalidFieldOfView(_))));

        let result = TargetingOptions::from_json(r#"{"backend": "gpu"}"#);
        assert!(matches!(result, Err(SightlineError::JsonError(_))));
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut config = TargetingConfiguration::default();
        let options = TargetingOptions {
            geometry_granularity: Some(GeometryGranularity::Edges),
            tag_filter: Some("enemy".into()),
            ..Default::default()
        };
        let changes = options.apply_to(&mut config);
        assert!(changes.granularity);
        assert!(changes.tag_filter);
        assert!(!changes.backend);

        // Same values again: nothing changes.
        let changes = options.apply_to(&mut config);
        assert_eq!(changes, ConfigChanges::default());

        // Empty tag clears the filter.
        let clear = TargetingOptions {
            tag_filter: Some(String::new()),
            ..Default::default()
        };
        assert!(clear.apply_to(&mut config).tag_filter);
        assert!(config.tag_filter.is_none());
    }

    #[test]
    fn test_options_reject_unknown_keys() {
        let result = TargetingOptions::from_json(r#"{"granularity": "edges"}"#);
        assert!(matches!(result, Err(SightlineError::JsonError(_))));
    }

    #[test]
    fn test_zero_max_targets_clears_limit() {
        let mut config = TargetingConfiguration::default();
        TargetingOptions::from_json(r#"{"maxTargets": 2}"#)
            .unwrap()
            .apply_to(&mut config);
        assert_eq!(config.max_targets, Some(2));

        TargetingOptions::from_json(r#"{"maxTargets": 0}"#)
            .unwrap()
            .apply_to(&mut config);
        assert_eq!(config.max_targets, None);
    }

    #[test]
    fn test_configuration_roundtrips_through_serde() {
        let config = TargetingConfiguration::new().with_tag_filter("crate");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"granularity\":\"objects\""));
        let back: TargetingConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
