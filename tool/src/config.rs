use serde::{Deserialize, Serialize};

/// Settings read from `--config_file`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Largest distance between a Z word and the requested height that still
    /// counts as the same layer. Zero requires an exact match.
    pub height_tolerance: f64,
    pub plot: PlotConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            height_tolerance: 0.0,
            plot: PlotConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_hjson(src: &str) -> Result<Self, deser_hjson::Error> {
        let config: AnalysisConfig = deser_hjson::from_str(src)?;
        Ok(config.fixed_up())
    }

    fn fixed_up(mut self) -> Self {
        if self.height_tolerance.is_nan() || self.height_tolerance < 0.0 {
            tracing::warn!(
                tolerance = self.height_tolerance,
                "negative or NaN height tolerance, using exact matching"
            );
            self.height_tolerance = 0.0;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// SVG canvas size in pixels.
    pub width: u32,
    pub height: u32,
    pub margin: f64,
    pub path_color: String,
    pub marker_color: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        PlotConfig {
            width: 800,
            height: 800,
            margin: 60.0,
            path_color: "blue".into(),
            marker_color: "red".into(),
        }
    }
}
