use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::{MorphologyOrder, ReducerConfig, DEFAULT_BLUR_SIGMA},
    color::{HsvFilter, MAX_HUE},
    error::{DetectError, Result},
};

/// Upper bound on simultaneous colour filters
pub const MAX_FILTERS: usize = 9;

pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FrameConfig {
    /// Resize incoming frames before processing
    pub resize: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            resize: false,
            width: DEFAULT_FRAME_WIDTH,
            height: DEFAULT_FRAME_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MorphologyConfig {
    pub enabled: bool,
    pub order: MorphologyOrder,
    /// 1 gives a 3x3 structuring element
    #[schemars(range(min = 1, max = 10))]
    pub kernel_radius: u8,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: MorphologyOrder::OpenClose,
            kernel_radius: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BlurConfig {
    pub enabled: bool,
    pub sigma: f32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EdgeConfig {
    pub enabled: bool,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            low_threshold: 50.0,
            high_threshold: 100.0,
        }
    }
}

/// Full detector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectorConfig {
    /// Fit a minimum-area rectangle to every detected object
    pub fit_rectangles: bool,
    pub frame: FrameConfig,
    pub morphology: MorphologyConfig,
    pub blur: BlurConfig,
    pub edges: EdgeConfig,
    pub reducer: ReducerConfig,
    /// Colour filters, indexed by filter id
    pub filters: Vec<HsvFilter>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fit_rectangles: false,
            frame: FrameConfig::default(),
            morphology: MorphologyConfig::default(),
            blur: BlurConfig::default(),
            edges: EdgeConfig::default(),
            reducer: ReducerConfig::default(),
            filters: vec![HsvFilter::full_range()],
        }
    }
}

impl DetectorConfig {
    /// Default configuration with `count` full-range filters
    pub fn with_filter_count(count: usize) -> Result<Self> {
        let config = Self {
            filters: vec![HsvFilter::full_range(); count],
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn filter(&self, id: usize) -> Result<&HsvFilter> {
        self.filters.get(id).ok_or(DetectError::UnknownFilter {
            id,
            available: self.filters.len(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.filters.len() > MAX_FILTERS {
            return Err(DetectError::ValidationFailed(format!(
                "{} filters configured, at most {} supported",
                self.filters.len(),
                MAX_FILTERS
            )));
        }

        for (id, filter) in self.filters.iter().enumerate() {
            if filter.min.hue > MAX_HUE || filter.max.hue > MAX_HUE {
                return Err(DetectError::ValidationFailed(format!(
                    "filter {}: hue must be at most {}",
                    id, MAX_HUE
                )));
            }
            if filter.min.hue > filter.max.hue
                || filter.min.sat > filter.max.sat
                || filter.min.val > filter.max.val
            {
                return Err(DetectError::ValidationFailed(format!(
                    "filter {}: min {:?} exceeds max {:?}",
                    id, filter.min, filter.max
                )));
            }
        }

        if self.blur.enabled && !(self.blur.sigma > 0.0) {
            return Err(DetectError::ValidationFailed(format!(
                "blur sigma must be positive, got {}",
                self.blur.sigma
            )));
        }
        if self.edges.enabled && self.edges.low_threshold > self.edges.high_threshold {
            return Err(DetectError::ValidationFailed(format!(
                "edge low threshold {} exceeds high threshold {}",
                self.edges.low_threshold, self.edges.high_threshold
            )));
        }
        if self.morphology.enabled && self.morphology.kernel_radius == 0 {
            return Err(DetectError::ValidationFailed(
                "morphology kernel radius must be at least 1".to_string(),
            ));
        }
        if !self.reducer.min_area.is_finite() {
            return Err(DetectError::ValidationFailed("min_area must be finite".to_string()));
        }
        if self.frame.resize && (self.frame.width == 0 || self.frame.height == 0) {
            return Err(DetectError::ValidationFailed("frame size must be non-zero".to_string()));
        }

        Ok(())
    }

    /// Get the JSON schema of the configuration format
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(DetectorConfig)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: DetectorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: DetectorConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref)?;
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            _ => Err(DetectError::UnsupportedFormat(path_ref.display().to_string())),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save as TOML regardless of the file extension
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Save configuration, picking the format from the file extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(DetectError::UnsupportedFormat(path_ref.display().to_string())),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::NoiseCount;
    use crate::color::Hsv;

    #[test]
    fn test_default_thresholds() {
        let config = DetectorConfig::default();
        assert_eq!(config.reducer.min_area, 400.0);
        assert_eq!(config.reducer.noise_ceiling, 50);
        assert_eq!(config.reducer.noise_count, NoiseCount::AllNodes);
        assert_eq!(config.morphology.order, MorphologyOrder::OpenClose);
        assert_eq!((config.frame.width, config.frame.height), (640, 480));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = DetectorConfig::from_toml(
            r#"
            fit_rectangles = true

            [reducer]
            min_area = 100.0
            noise_count = "top_level"

            [edges]
            enabled = false

            [[filters]]
            name = "red"
            min = { hue = 0, sat = 120, val = 70 }
            max = { hue = 10, sat = 255, val = 255 }

            [[filters]]
            name = "blue"
            min = { hue = 100, sat = 150, val = 0 }
            max = { hue = 140, sat = 255, val = 255 }
            "#,
        )
        .expect("Should parse config");

        assert!(config.fit_rectangles);
        assert_eq!(config.reducer.min_area, 100.0);
        assert_eq!(config.reducer.noise_ceiling, 50);
        assert_eq!(config.reducer.noise_count, NoiseCount::TopLevel);
        assert!(!config.edges.enabled);
        assert!(config.blur.enabled);
        assert_eq!(config.filters.len(), 2);
        assert_eq!(config.filter(1).expect("Should exist").name.as_deref(), Some("blue"));
        assert!(matches!(config.filter(2), Err(DetectError::UnknownFilter { id: 2, available: 2 })));
    }

    #[test]
    fn test_toml_and_json_agree() {
        let config = DetectorConfig::with_filter_count(3).expect("Should build config");
        let from_toml = DetectorConfig::from_toml(&config.to_toml().expect("Should write TOML"))
            .expect("Should parse TOML");
        let from_json = DetectorConfig::from_json(&config.to_json().expect("Should write JSON"))
            .expect("Should parse JSON");
        assert_eq!(from_toml, config);
        assert_eq!(from_json, config);
    }

    #[test]
    fn test_validation_failures() {
        assert!(DetectorConfig::with_filter_count(MAX_FILTERS + 1).is_err());

        let mut config = DetectorConfig::default();
        config.filters = vec![HsvFilter::new(Hsv::new(0, 0, 0), Hsv::new(200, 255, 255))];
        assert!(matches!(config.validate(), Err(DetectError::ValidationFailed(_))));

        let mut config = DetectorConfig::default();
        config.filters = vec![HsvFilter::new(Hsv::new(50, 0, 0), Hsv::new(40, 255, 255))];
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.edges.low_threshold = 200.0;
        assert!(config.validate().is_err());
        config.edges.enabled = false;
        assert!(config.validate().is_ok());

        let mut config = DetectorConfig::default();
        config.blur.sigma = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = serde_json::to_value(DetectorConfig::schema()).expect("Should serialize schema");
        let properties = schema["properties"].as_object().expect("Should have properties");
        for key in ["reducer", "morphology", "blur", "edges", "filters", "frame"] {
            assert!(properties.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_toml_file_round_trip() {
        let path = std::env::temp_dir().join(format!("detect_config_{}.toml", std::process::id()));
        let config = DetectorConfig::with_filter_count(2).expect("Should build config");
        config.to_toml_file(&path).expect("Should write config");
        let loaded = DetectorConfig::from_file(&path).expect("Should load config");
        std::fs::remove_file(&path).expect("Should clean up");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let config = DetectorConfig::default();
        let path = std::env::temp_dir().join("detect_config_test.yaml");
        assert!(matches!(config.to_file(&path), Err(DetectError::UnsupportedFormat(_))));
    }
}
