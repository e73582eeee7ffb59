use crate::consts::DEFAULT_QUERY_DAYS;
use crate::error::{KeyFitError, KfResult};
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Args, Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    #[command(flatten)]
    pub geometry: GeometryConfig,
    #[command(flatten)]
    pub query: QueryConfig,
}

/// Pixel constants of the heatmap drawing.
#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeometryConfig {
    #[arg(long, default_value_t = 50.0)]
    pub key_width: f32,
    #[arg(long, default_value_t = 50.0)]
    pub key_height: f32,
    #[arg(long, default_value_t = 6.0)]
    pub key_gap: f32,
    #[arg(long, default_value_t = 20.0)]
    pub padding: f32,

    // Added to multi-row key heights so they cover the inter-row gap.
    #[arg(long, default_value_t = 0.14)]
    pub height_epsilon: f32,

    #[arg(long, default_value_t = 6.0)]
    pub corner_radius: f32,
    #[arg(long, default_value_t = 10.0)]
    pub label_font_size: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            key_width: 50.0,
            key_height: 50.0,
            key_gap: 6.0,
            padding: 20.0,
            height_epsilon: 0.14,
            corner_radius: 6.0,
            label_font_size: 10.0,
        }
    }
}

impl GeometryConfig {
    /// Horizontal distance between the left edges of two adjacent unit keys.
    #[inline(always)]
    pub fn column_pitch(&self) -> f32 {
        self.key_width + self.key_gap
    }

    #[inline(always)]
    pub fn row_pitch(&self) -> f32 {
        self.key_height + self.key_gap
    }

    pub fn validate(&self) -> KfResult<()> {
        let dims = [
            ("key_width", self.key_width),
            ("key_height", self.key_height),
        ];
        for (name, v) in dims {
            if !(v.is_finite() && v > 0.0) {
                return Err(KeyFitError::Config(format!("{} must be positive, got {}", name, v)));
            }
        }
        if !(self.key_gap >= 0.0 && self.padding >= 0.0) {
            return Err(KeyFitError::Config("key_gap and padding must not be negative".into()));
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueryConfig {
    /// Maximum ranking rows requested from the backend (unlimited if unset).
    #[arg(long)]
    pub ranking_limit: Option<u32>,

    /// Length of the initial date window, ending today.
    #[arg(long, default_value_t = DEFAULT_QUERY_DAYS)]
    pub default_days: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            ranking_limit: None,
            default_days: DEFAULT_QUERY_DAYS,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KfResult<Self> {
        let content = fs::read_to_string(&path).map_err(|e| {
            KeyFitError::Config(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.geometry.validate()?;
        Ok(config)
    }

    /// Copies every value the user typed on the command line over `self`,
    /// leaving file-provided values alone where the flag was defaulted.
    pub fn merge_from_cli(&mut self, cli: &Config, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($group:ident . $field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$group.$field = cli.$group.$field.clone();
                }
            };
        }

        update_if_present!(geometry.key_width);
        update_if_present!(geometry.key_height);
        update_if_present!(geometry.key_gap);
        update_if_present!(geometry.padding);
        update_if_present!(geometry.height_epsilon);
        update_if_present!(geometry.corner_radius);
        update_if_present!(geometry.label_font_size);

        update_if_present!(query.ranking_limit);
        update_if_present!(query.default_days);
    }
}
