//! Layout and runtime settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::color::FestiveDay;
use crate::model::Side;
use crate::tree::TrunkTexture;

/// Environment variable overriding [`TreeConfig::seed`].
pub const SEED_ENV: &str = "DONATION_TREE_SEED";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// World x of the trunk centre line; every branch is anchored on it.
    pub trunk_center_x: f64,
    /// World y of the bottom of the trunk base.
    pub ground_y: f64,
    pub trunk_base_height: f64,
    pub trunk_textures: [TrunkTexture; 2],
    /// Height above ground of the first branch on each side.
    pub first_branch_rise: f64,
    pub branch_scale: f64,
    pub left_angle_deg: f64,
    pub right_angle_deg: f64,
    pub angle_jitter_deg: f64,
    pub elevation_jitter: f64,
    pub branch_spacing: f64,
    pub extra_spacing_max: f64,
    /// Trunk kept above the highest branch footprint.
    pub trunk_margin: f64,
    pub initial_side: Side,
    pub festive_day: FestiveDay,
    pub write_retries: u32,
    pub write_backoff_ms: u64,
    pub seed: Option<u64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            trunk_center_x: 6000.0,
            ground_y: 0.0,
            trunk_base_height: 1900.0,
            trunk_textures: [
                TrunkTexture {
                    name: "Trunk_Mid_01_CroppedY".to_string(),
                    height: 1408.0,
                },
                TrunkTexture {
                    name: "Trunk_Mid_02_CroppedY".to_string(),
                    height: 1344.0,
                },
            ],
            first_branch_rise: 1200.0,
            branch_scale: 0.4,
            left_angle_deg: -80.0,
            right_angle_deg: 80.0,
            angle_jitter_deg: 5.0,
            elevation_jitter: 40.0,
            branch_spacing: 120.0,
            extra_spacing_max: 160.0,
            trunk_margin: 600.0,
            initial_side: Side::Left,
            festive_day: FestiveDay::default(),
            write_retries: 3,
            write_backoff_ms: 250,
            seed: None,
        }
    }
}

impl TreeConfig {
    /// Read a JSON config file; missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: TreeConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DONATION_TREE_SEED` if set to a valid integer.
    pub fn with_env_seed(mut self) -> Self {
        if let Some(seed) = std::env::var(SEED_ENV).ok().and_then(|v| v.trim().parse().ok()) {
            self.seed = Some(seed);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("angle_jitter_deg", self.angle_jitter_deg),
            ("elevation_jitter", self.elevation_jitter),
            ("extra_spacing_max", self.extra_spacing_max),
            ("branch_spacing", self.branch_spacing),
            ("trunk_margin", self.trunk_margin),
        ];
        if let Some((name, _)) = non_negative.iter().find(|(_, v)| !(*v >= 0.0)) {
            return Err(ConfigError::Invalid(format!("{name} must be >= 0")));
        }
        if !(self.branch_scale > 0.0) {
            return Err(ConfigError::Invalid("branch_scale must be > 0".to_string()));
        }
        if let Some(t) = self.trunk_textures.iter().find(|t| !(t.height > 0.0)) {
            return Err(ConfigError::Invalid(format!(
                "trunk texture {} must have a positive height",
                t.name
            )));
        }
        let festive = &self.festive_day;
        if !(1..=12).contains(&festive.month) || !(1..=31).contains(&festive.day) {
            return Err(ConfigError::Invalid("festive_day is not a calendar day".to_string()));
        }
        if !(-23..=23).contains(&festive.utc_offset_hours) {
            return Err(ConfigError::Invalid(
                "festive_day.utc_offset_hours must be within -23..=23".to_string(),
            ));
        }
        Ok(())
    }

    pub fn write_backoff(&self) -> Duration {
        Duration::from_millis(self.write_backoff_ms)
    }

    pub fn base_angle(&self, side: Side) -> f64 {
        match side {
            Side::Left => self.left_angle_deg,
            Side::Right => self.right_angle_deg,
        }
    }

    /// Top of the trunk base piece.
    pub fn trunk_base_top(&self) -> f64 {
        self.ground_y - self.trunk_base_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn default_config_is_valid() {
        TreeConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_json(r#"{ "branch_spacing": 80.0, "initial_side": "right", "seed": 7 }"#);
        let config = TreeConfig::load(file.path()).unwrap();

        assert_eq!(config.branch_spacing, 80.0);
        assert_eq!(config.initial_side, Side::Right);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.branch_scale, 0.4);
        assert_eq!(config.festive_day, FestiveDay::default());
    }

    #[test]
    fn nested_festive_day_is_read() {
        let file = write_json(r#"{ "festive_day": { "month": 4, "day": 22, "utc_offset_hours": 9 } }"#);
        let config = TreeConfig::load(file.path()).unwrap();
        assert_eq!(config.festive_day.month, 4);
        assert_eq!(config.festive_day.utc_offset_hours, 9);
    }

    #[test]
    fn negative_jitter_is_rejected() {
        let file = write_json(r#"{ "angle_jitter_deg": -1.0 }"#);
        let err = TreeConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("angle_jitter_deg")));
    }

    #[test]
    fn flat_trunk_texture_is_rejected() {
        let mut config = TreeConfig::default();
        config.trunk_textures[1].height = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn out_of_range_festive_offset_is_rejected() {
        let file = write_json(r#"{ "festive_day": { "utc_offset_hours": 30 } }"#);
        let err = TreeConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("utc_offset_hours")));

        let mut config = TreeConfig::default();
        config.festive_day.utc_offset_hours = -23;
        config.validate().unwrap();
        config.festive_day.utc_offset_hours = -24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let file = write_json("{ not json");
        assert!(matches!(TreeConfig::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = TreeConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn base_top_is_above_ground() {
        let config = TreeConfig::default();
        assert!(config.trunk_base_top() < config.ground_y);
    }
}
