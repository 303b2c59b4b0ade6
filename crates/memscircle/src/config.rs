//! Pipeline configuration: method selection per stage plus scalar parameters.
//!
//! [`Configuration`] is a plain value type. Setters consume the value and
//! return the updated copy, so chaining reads naturally when rebuilding a
//! configuration from a settings store:
//!
//! ```
//! use memscircle::{Configuration, FilterMethod};
//!
//! let cfg = Configuration::default()
//!     .with_filter_method(FilterMethod::Median)
//!     .with_filter_radius(3);
//! assert_eq!(cfg.filter_radius(), 3);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

pub const FILTER_METHOD_KEY: &str = "FilterMethod";
pub const THRESHOLDING_METHOD_KEY: &str = "ThresholdingMethod";
pub const EDGE_DETECTION_METHOD_KEY: &str = "EdgeDetectionMethod";
pub const CIRCLE_FIT_METHOD_KEY: &str = "CircleFitMethod";
pub const FILTER_RADIUS_KEY: &str = "FilterRadius";
pub const GAUSSIAN_SIGMA_KEY: &str = "GaussianSigma";
pub const P_TILE_VALUE_KEY: &str = "PTileValue";

const DEFAULT_FILTER_RADIUS: u32 = 2;
const DEFAULT_GAUSSIAN_SIGMA: f64 = 1.0;
const DEFAULT_P_TILE_VALUE: f64 = 0.5;

/// Enumerations persisted by name in the settings store.
trait SettingsEnum: Copy + Sized + 'static {
    const ALL: &'static [Self];

    fn key(self) -> &'static str;

    fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.iter().copied().find(|v| v.key() == key)
    }
}

/// Smoothing kernel applied before thresholding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterMethod {
    /// Separable Gaussian, half-width = radius, std-dev = sigma.
    #[default]
    Gaussian,
    /// Unweighted box mean over a (2r+1)² window.
    Mean,
    /// Median over a (2r+1)² window.
    Median,
}

impl SettingsEnum for FilterMethod {
    const ALL: &'static [Self] = &[Self::Gaussian, Self::Mean, Self::Median];

    fn key(self) -> &'static str {
        match self {
            Self::Gaussian => "GaussianFilter",
            Self::Mean => "MeanFilter",
            Self::Median => "MedianFilter",
        }
    }
}

/// Binarization strategy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdingMethod {
    /// Histogram clustering (Otsu): minimize within-class variance.
    #[default]
    Cluster,
    /// Percentile: the configured fraction of pixels falls at or below the level.
    PTile,
}

impl SettingsEnum for ThresholdingMethod {
    const ALL: &'static [Self] = &[Self::Cluster, Self::PTile];

    fn key(self) -> &'static str {
        match self {
            Self::Cluster => "Cluster",
            Self::PTile => "PTile",
        }
    }
}

/// 3×3 gradient operator used to build the edge map.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EdgeDetectionMethod {
    #[default]
    Sobel,
    Prewitt,
    Scharr,
}

impl SettingsEnum for EdgeDetectionMethod {
    const ALL: &'static [Self] = &[Self::Sobel, Self::Prewitt, Self::Scharr];

    fn key(self) -> &'static str {
        match self {
            Self::Sobel => "Sobel",
            Self::Prewitt => "Prewitt",
            Self::Scharr => "Scharr",
        }
    }
}

/// Circle estimator applied to the extracted boundary points.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CircleFitMethod {
    /// Closed-form Kåsa least squares.
    #[default]
    SimpleAlgebraic,
    /// Kåsa estimate refined by Gauss-Newton on orthogonal distances.
    Geometric,
}

impl SettingsEnum for CircleFitMethod {
    const ALL: &'static [Self] = &[Self::SimpleAlgebraic, Self::Geometric];

    fn key(self) -> &'static str {
        match self {
            Self::SimpleAlgebraic => "SimpleAlgebraicFit",
            Self::Geometric => "GeometricFit",
        }
    }
}

/// Full pipeline configuration.
///
/// Equality compares all seven fields exactly.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Configuration {
    filter_method: FilterMethod,
    thresholding_method: ThresholdingMethod,
    edge_detection_method: EdgeDetectionMethod,
    circle_fit_method: CircleFitMethod,
    /// Filter half-width in pixels; 0 disables smoothing.
    filter_radius: u32,
    /// Gaussian standard deviation; only read when filtering is Gaussian.
    gaussian_sigma: f64,
    /// Percentile in [0, 1]; only read when thresholding is P-tile.
    p_tile_value: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            filter_method: FilterMethod::default(),
            thresholding_method: ThresholdingMethod::default(),
            edge_detection_method: EdgeDetectionMethod::default(),
            circle_fit_method: CircleFitMethod::default(),
            filter_radius: DEFAULT_FILTER_RADIUS,
            gaussian_sigma: DEFAULT_GAUSSIAN_SIGMA,
            p_tile_value: DEFAULT_P_TILE_VALUE,
        }
    }
}

impl Configuration {
    pub fn filter_method(&self) -> FilterMethod {
        self.filter_method
    }

    pub fn thresholding_method(&self) -> ThresholdingMethod {
        self.thresholding_method
    }

    pub fn edge_detection_method(&self) -> EdgeDetectionMethod {
        self.edge_detection_method
    }

    pub fn circle_fit_method(&self) -> CircleFitMethod {
        self.circle_fit_method
    }

    pub fn filter_radius(&self) -> u32 {
        self.filter_radius
    }

    pub fn gaussian_sigma(&self) -> f64 {
        self.gaussian_sigma
    }

    pub fn p_tile_value(&self) -> f64 {
        self.p_tile_value
    }

    pub fn with_filter_method(mut self, method: FilterMethod) -> Self {
        self.filter_method = method;
        self
    }

    pub fn with_thresholding_method(mut self, method: ThresholdingMethod) -> Self {
        self.thresholding_method = method;
        self
    }

    pub fn with_edge_detection_method(mut self, method: EdgeDetectionMethod) -> Self {
        self.edge_detection_method = method;
        self
    }

    pub fn with_circle_fit_method(mut self, method: CircleFitMethod) -> Self {
        self.circle_fit_method = method;
        self
    }

    pub fn with_filter_radius(mut self, radius: u32) -> Self {
        self.filter_radius = radius;
        self
    }

    pub fn with_gaussian_sigma(mut self, sigma: f64) -> Self {
        self.gaussian_sigma = sigma;
        self
    }

    pub fn with_p_tile_value(mut self, value: f64) -> Self {
        self.p_tile_value = value;
        self
    }

    /// Check every parameter invariant that applies to the selected methods.
    ///
    /// Sigma is only constrained when Gaussian filtering is selected; the
    /// p-tile value is checked regardless of the thresholding method.
    pub fn validate(&self) -> Result<()> {
        if self.filter_method == FilterMethod::Gaussian
            && !(self.gaussian_sigma.is_finite() && self.gaussian_sigma > 0.0)
        {
            return Err(Error::InvalidConfiguration {
                field: GAUSSIAN_SIGMA_KEY,
                reason: format!("must be finite and > 0, got {}", self.gaussian_sigma),
            });
        }
        if !(0.0..=1.0).contains(&self.p_tile_value) {
            return Err(Error::InvalidConfiguration {
                field: P_TILE_VALUE_KEY,
                reason: format!("must lie in [0, 1], got {}", self.p_tile_value),
            });
        }
        Ok(())
    }

    /// Flatten into the seven-key settings representation.
    pub fn to_settings(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert(
            FILTER_METHOD_KEY.to_string(),
            self.filter_method.key().to_string(),
        );
        map.insert(
            THRESHOLDING_METHOD_KEY.to_string(),
            self.thresholding_method.key().to_string(),
        );
        map.insert(
            EDGE_DETECTION_METHOD_KEY.to_string(),
            self.edge_detection_method.key().to_string(),
        );
        map.insert(
            CIRCLE_FIT_METHOD_KEY.to_string(),
            self.circle_fit_method.key().to_string(),
        );
        map.insert(FILTER_RADIUS_KEY.to_string(), self.filter_radius.to_string());
        map.insert(
            GAUSSIAN_SIGMA_KEY.to_string(),
            self.gaussian_sigma.to_string(),
        );
        map.insert(P_TILE_VALUE_KEY.to_string(), self.p_tile_value.to_string());
        map
    }

    /// Rebuild from a settings group. Missing or unparseable keys fall back to
    /// their defaults; the result is not validated.
    pub fn from_settings(settings: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| settings.get(key).map(String::as_str);

        let parsed = Self::default()
            .with_filter_method(
                get(FILTER_METHOD_KEY)
                    .and_then(FilterMethod::from_key)
                    .unwrap_or(defaults.filter_method),
            )
            .with_thresholding_method(
                get(THRESHOLDING_METHOD_KEY)
                    .and_then(ThresholdingMethod::from_key)
                    .unwrap_or(defaults.thresholding_method),
            )
            .with_edge_detection_method(
                get(EDGE_DETECTION_METHOD_KEY)
                    .and_then(EdgeDetectionMethod::from_key)
                    .unwrap_or(defaults.edge_detection_method),
            )
            .with_circle_fit_method(
                get(CIRCLE_FIT_METHOD_KEY)
                    .and_then(CircleFitMethod::from_key)
                    .unwrap_or(defaults.circle_fit_method),
            )
            .with_filter_radius(
                get(FILTER_RADIUS_KEY)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(defaults.filter_radius),
            )
            .with_gaussian_sigma(
                get(GAUSSIAN_SIGMA_KEY)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(defaults.gaussian_sigma),
            )
            .with_p_tile_value(
                get(P_TILE_VALUE_KEY)
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(defaults.p_tile_value),
            );

        tracing::debug!("loaded {}", parsed);
        parsed
    }

    /// Load a JSON configuration file. Absent fields take their defaults.
    pub fn from_json_file(path: &Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}

impl std::fmt::Display for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Configuration(FilterMethod: {}, ThresholdingMethod: {}, EdgeDetectionMethod: {}, \
             CircleFitMethod: {}, FilterRadius: {}, GaussianSigma: {}, PTileValue: {})",
            self.filter_method.key(),
            self.thresholding_method.key(),
            self.edge_detection_method.key(),
            self.circle_fit_method.key(),
            self.filter_radius,
            self.gaussian_sigma,
            self.p_tile_value,
        )
    }
}
