//! Run configuration loaded from YAML and overridden from the command line.
//!
//! Every field has a default, so an empty file (or no file at all) samples
//! La Revellata at 20 m against the IGN service.

use crate::RunnerError;
use geoalt_terrain::{
    BoundingBox, FetchOptions, Resolution, TerrainRun, DEFAULT_ENDPOINT, DEFAULT_MAX_REQUEST_LEN,
    DEFAULT_SURFACE_NAME, DEFAULT_TIMEOUT_SECS, PRESETS,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Preset used when no area is configured.
pub const DEFAULT_AREA: &str = "la-revellata";

/// Default target spacing in metres.
pub const DEFAULT_SPACING_M: f64 = 20.0;

/// Area to sample: a preset name or explicit bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AreaConfig {
    /// Named preset, e.g. `la-rhune`.
    Preset(String),
    /// Explicit WGS84 bounds.
    Bounds(BoundingBox),
}

impl Default for AreaConfig {
    fn default() -> Self {
        AreaConfig::Preset(DEFAULT_AREA.to_string())
    }
}

impl AreaConfig {
    /// Resolve to a validated bounding box.
    pub fn bbox(&self) -> Result<BoundingBox, RunnerError> {
        let bbox = match self {
            AreaConfig::Preset(name) => BoundingBox::preset(name).ok_or_else(|| {
                let known: Vec<&str> = PRESETS.iter().map(|(name, _)| *name).collect();
                RunnerError::ConfigError(format!(
                    "Unknown area '{}'. Known presets: {}",
                    name,
                    known.join(", ")
                ))
            })?,
            AreaConfig::Bounds(bbox) => *bbox,
        };
        bbox.validate()?;
        Ok(bbox)
    }
}

/// Sampling resolution. Exactly one of the two fields may be set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionConfig {
    /// Target ground spacing in metres.
    pub spacing_m: Option<f64>,
    /// Fixed number of points per axis.
    pub steps: Option<usize>,
}

impl ResolutionConfig {
    /// Convert to the planner's mode.
    pub fn resolution(&self) -> Result<Resolution, RunnerError> {
        match (self.spacing_m, self.steps) {
            (Some(_), Some(_)) => Err(RunnerError::ConfigError(
                "resolution: set either spacing_m or steps, not both".to_string(),
            )),
            (Some(spacing), None) => Ok(Resolution::Spacing(spacing)),
            (None, Some(steps)) => Ok(Resolution::Steps(steps)),
            (None, None) => Ok(Resolution::Spacing(DEFAULT_SPACING_M)),
        }
    }
}

/// Elevation service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service URL.
    pub endpoint: String,
    /// Longest request the service accepts, in bytes.
    pub max_request_len: usize,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// Requests in flight at once (1 = sequential).
    pub concurrency: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_request_len: DEFAULT_MAX_REQUEST_LEN,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: 1,
        }
    }
}

/// Where and how to write the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Wavefront OBJ output path.
    pub path: PathBuf,
    /// Object name.
    pub name: String,
    /// Mark faces smooth-shaded.
    pub smooth: bool,
    /// Optional JSON metadata sidecar path.
    pub metadata_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("land.obj"),
            name: DEFAULT_SURFACE_NAME.to_string(),
            smooth: true,
            metadata_path: None,
        }
    }
}

/// Complete configuration of one run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Area to sample.
    pub area: AreaConfig,
    /// Sampling resolution.
    pub resolution: ResolutionConfig,
    /// Elevation service.
    pub service: ServiceConfig,
    /// Output.
    pub output: OutputConfig,
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Preset name.
    pub area: Option<String>,
    /// Explicit bounds.
    pub bounds: Option<BoundingBox>,
    /// Target spacing in metres.
    pub spacing_m: Option<f64>,
    /// Fixed step count.
    pub steps: Option<usize>,
    /// Service URL.
    pub endpoint: Option<String>,
    /// Request length limit.
    pub max_request_len: Option<usize>,
    /// Requests in flight.
    pub concurrency: Option<usize>,
    /// HTTP timeout.
    pub timeout_secs: Option<u64>,
    /// OBJ path.
    pub output_path: Option<PathBuf>,
    /// JSON sidecar path.
    pub metadata_path: Option<PathBuf>,
    /// Object name.
    pub name: Option<String>,
    /// Disable smooth shading.
    pub flat: bool,
}

impl RunConfig {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, RunnerError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Apply command-line overrides.
    ///
    /// A spacing or step count on the command line replaces whatever
    /// resolution the file had.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(area) = overrides.area {
            self.area = AreaConfig::Preset(area);
        }
        if let Some(bounds) = overrides.bounds {
            self.area = AreaConfig::Bounds(bounds);
        }
        if overrides.spacing_m.is_some() || overrides.steps.is_some() {
            self.resolution = ResolutionConfig {
                spacing_m: overrides.spacing_m,
                steps: overrides.steps,
            };
        }
        if let Some(endpoint) = overrides.endpoint {
            self.service.endpoint = endpoint;
        }
        if let Some(limit) = overrides.max_request_len {
            self.service.max_request_len = limit;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.service.concurrency = concurrency;
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.service.timeout_secs = timeout;
        }
        if let Some(path) = overrides.output_path {
            self.output.path = path;
        }
        if let Some(path) = overrides.metadata_path {
            self.output.metadata_path = Some(path);
        }
        if let Some(name) = overrides.name {
            self.output.name = name;
        }
        if overrides.flat {
            self.output.smooth = false;
        }
    }

    /// Check values the library does not check itself.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.service.concurrency == 0 {
            return Err(RunnerError::ConfigError(
                "service.concurrency must be at least 1".to_string(),
            ));
        }
        if self.service.max_request_len == 0 {
            return Err(RunnerError::ConfigError(
                "service.max_request_len must be positive".to_string(),
            ));
        }
        if self.output.name.trim().is_empty() {
            return Err(RunnerError::ConfigError(
                "output.name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The immutable run this configuration describes.
    pub fn terrain_run(&self) -> Result<TerrainRun, RunnerError> {
        self.validate()?;
        let mut run = TerrainRun::new(self.area.bbox()?, self.resolution.resolution()?);
        run.name = self.output.name.clone();
        run.smooth = self.output.smooth;
        Ok(run)
    }

    /// Fetch options for the elevation service.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            max_request_len: self.service.max_request_len,
            concurrency: self.service.concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = RunConfig::from_yaml("").unwrap();
        assert_eq!(config, RunConfig::default());
        let run = config.terrain_run().unwrap();
        assert_eq!(run.bbox, BoundingBox::preset(DEFAULT_AREA).unwrap());
        assert_eq!(run.resolution, Resolution::Spacing(DEFAULT_SPACING_M));
        assert_eq!(run.name, "land");
        assert!(run.smooth);
    }

    #[test]
    fn test_preset_and_steps() {
        let yaml = "area: la-rhune\nresolution:\n  steps: 125\n";
        let config = RunConfig::from_yaml(yaml).unwrap();
        let run = config.terrain_run().unwrap();
        assert_eq!(run.bbox.north, 43.319527);
        assert_eq!(run.resolution, Resolution::Steps(125));
    }

    #[test]
    fn test_explicit_bounds() {
        let yaml = r#"
area:
  north: 43.195645
  south: 43.192090
  east: -0.603585
  west: -0.606585
resolution:
  spacing_m: 10.0
service:
  concurrency: 4
output:
  path: oloron.obj
  name: oloron
  smooth: false
"#;
        let config = RunConfig::from_yaml(yaml).unwrap();
        let run = config.terrain_run().unwrap();
        assert_eq!(run.bbox, BoundingBox::preset("oloron").unwrap());
        assert_eq!(config.fetch_options().concurrency, 4);
        assert_eq!(config.service.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.output.path, PathBuf::from("oloron.obj"));
        assert!(!run.smooth);
    }

    #[test]
    fn test_invalid_configs() {
        let both = "resolution:\n  spacing_m: 10.0\n  steps: 20\n";
        assert!(RunConfig::from_yaml(both).unwrap().terrain_run().is_err());

        let unknown = "area: atlantis\n";
        let err = RunConfig::from_yaml(unknown).unwrap().terrain_run().unwrap_err();
        assert!(err.to_string().contains("la-revellata"));

        let inverted = "area: {north: 1.0, south: 2.0, east: 3.0, west: 2.0}\n";
        assert!(matches!(
            RunConfig::from_yaml(inverted).unwrap().terrain_run(),
            Err(RunnerError::Terrain(_))
        ));

        let zero = "service:\n  concurrency: 0\n";
        assert!(RunConfig::from_yaml(zero).unwrap().terrain_run().is_err());

        assert!(RunConfig::from_yaml("servce:\n  concurrency: 2\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = RunConfig::from_yaml("resolution:\n  steps: 50\n").unwrap();
        config.apply(ConfigOverrides {
            area: Some("oloron".to_string()),
            spacing_m: Some(5.0),
            concurrency: Some(8),
            name: Some("oloron".to_string()),
            flat: true,
            ..ConfigOverrides::default()
        });

        let run = config.terrain_run().unwrap();
        assert_eq!(run.resolution, Resolution::Spacing(5.0));
        assert_eq!(run.bbox, BoundingBox::preset("oloron").unwrap());
        assert_eq!(run.name, "oloron");
        assert!(!run.smooth);
        assert_eq!(config.service.concurrency, 8);

        let bounds = BoundingBox::new(1.0, 0.0, 1.0, 0.0).unwrap();
        config.apply(ConfigOverrides {
            bounds: Some(bounds),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.area, AreaConfig::Bounds(bounds));
        // Untouched values survive
        assert_eq!(config.resolution.spacing_m, Some(5.0));
    }
}
