use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{DriftError, DriftResult};

/// Target dimensions for the optional post-composition center crop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropSize {
    /// Crop width in pixels.
    pub width: u32,
    /// Crop height in pixels.
    pub height: u32,
}

/// Scene-generation parameters.
///
/// A config is a pure data model: build it programmatically or deserialize it
/// via Serde (JSON), then pass it to [`crate::MovingDigits::new`]. All
/// invariants are checked once by [`GeneratorConfig::validate`]; generation
/// itself never clamps or repairs a bad value.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct GeneratorConfig {
    /// Square canvas edge length in pixels.
    #[serde(default = "default_canvas_size")]
    pub canvas_size: u32,
    /// Square sprite edge length in pixels.
    #[serde(default = "default_sprite_size")]
    pub sprite_size: u32,
    /// Trajectory step length in normalized canvas units per frame.
    #[serde(default = "default_step_length")]
    pub step_length: f64,
    /// Frames given to a predictive model as input.
    pub input_frames: usize,
    /// Frames the model must forecast; may be zero.
    pub output_frames: usize,
    /// Allowed object counts; one is drawn uniformly per generated sample.
    pub allowed_objects: Vec<u32>,
    /// Occlusion window length per object; `None` disables occlusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occlusion_len: Option<usize>,
    /// Optional center crop applied to composed frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropSize>,
}

fn default_canvas_size() -> u32 {
    100
}

fn default_sprite_size() -> u32 {
    28
}

fn default_step_length() -> f64 {
    0.2
}

impl GeneratorConfig {
    /// Parse and validate a config from JSON text.
    pub fn from_json(json: &str) -> DriftResult<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| DriftError::data(format!("parse config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load and validate a config from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> DriftResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config from '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Total frames per clip (input + output).
    pub fn total_frames(&self) -> usize {
        self.input_frames + self.output_frames
    }

    /// Validate config invariants.
    pub fn validate(&self) -> DriftResult<()> {
        if self.canvas_size == 0 || self.sprite_size == 0 {
            return Err(DriftError::validation(
                "canvas_size and sprite_size must be > 0",
            ));
        }
        if self.sprite_size > self.canvas_size {
            return Err(DriftError::validation(format!(
                "sprite_size {} exceeds canvas_size {}",
                self.sprite_size, self.canvas_size
            )));
        }
        if !self.step_length.is_finite() || self.step_length <= 0.0 {
            return Err(DriftError::validation(
                "step_length must be finite and > 0",
            ));
        }
        if self.input_frames == 0 {
            return Err(DriftError::validation("input_frames must be > 0"));
        }
        if self.allowed_objects.is_empty() {
            return Err(DriftError::validation("allowed_objects must be non-empty"));
        }
        if self.allowed_objects.iter().any(|&n| n == 0) {
            return Err(DriftError::validation("allowed object counts must be > 0"));
        }
        if let Some(len) = self.occlusion_len {
            if len == 0 {
                return Err(DriftError::validation(
                    "occlusion_len must be > 0 when set",
                ));
            }
            if len > self.input_frames {
                return Err(DriftError::validation(format!(
                    "occlusion_len {len} exceeds input_frames {}",
                    self.input_frames
                )));
            }
        }
        if let Some(crop) = self.crop {
            if crop.width == 0 || crop.height == 0 {
                return Err(DriftError::validation("crop dimensions must be > 0"));
            }
            if crop.width > self.canvas_size || crop.height > self.canvas_size {
                return Err(DriftError::validation(format!(
                    "crop {}x{} exceeds canvas_size {}",
                    crop.height, crop.width, self.canvas_size
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> GeneratorConfig {
        GeneratorConfig {
            canvas_size: 100,
            sprite_size: 28,
            step_length: 0.2,
            input_frames: 10,
            output_frames: 10,
            allowed_objects: vec![1, 2],
            occlusion_len: None,
            crop: None,
        }
    }

    #[test]
    fn valid_config_passes() {
        base().validate().unwrap();
    }

    #[test]
    fn occlusion_longer_than_input_is_rejected() {
        let cfg = GeneratorConfig {
            occlusion_len: Some(11),
            ..base()
        };
        assert!(matches!(
            cfg.validate(),
            Err(crate::DriftError::Validation(_))
        ));
    }

    #[test]
    fn occlusion_equal_to_input_is_allowed() {
        let cfg = GeneratorConfig {
            occlusion_len: Some(10),
            ..base()
        };
        cfg.validate().unwrap();
    }

    #[test]
    fn sprite_larger_than_canvas_is_rejected() {
        let cfg = GeneratorConfig {
            sprite_size: 101,
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_allowed_objects_is_rejected() {
        let cfg = GeneratorConfig {
            allowed_objects: vec![],
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn oversized_crop_is_rejected() {
        let cfg = GeneratorConfig {
            crop: Some(CropSize {
                width: 120,
                height: 64,
            }),
            ..base()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_round_trip_preserves_fields() {
        let cfg = GeneratorConfig {
            occlusion_len: Some(3),
            crop: Some(CropSize {
                width: 64,
                height: 64,
            }),
            ..base()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.canvas_size, cfg.canvas_size);
        assert_eq!(back.occlusion_len, cfg.occlusion_len);
        assert_eq!(back.crop, cfg.crop);
        assert_eq!(back.allowed_objects, cfg.allowed_objects);
    }

    #[test]
    fn from_json_validates_after_parsing() {
        let cfg = GeneratorConfig::from_json(
            r#"{"input_frames": 10, "output_frames": 10, "allowed_objects": [1], "occlusion_len": 3}"#,
        )
        .unwrap();
        assert_eq!(cfg.occlusion_len, Some(3));

        // Parses but violates an invariant: must fail at load time.
        let err = GeneratorConfig::from_json(
            r#"{"input_frames": 10, "output_frames": 0, "allowed_objects": [1], "occlusion_len": 11}"#,
        )
        .unwrap_err();
        assert!(matches!(err, crate::DriftError::Validation(_)));

        // Malformed JSON is a data error.
        let err = GeneratorConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::DriftError::Data(_)));
    }

    #[test]
    fn from_path_error_carries_file_context() {
        let err = GeneratorConfig::from_path("/nonexistent/config.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.json"));
    }

    #[test]
    fn omitted_geometry_fields_take_defaults() {
        let cfg: GeneratorConfig = serde_json::from_str(
            r#"{"input_frames": 10, "output_frames": 0, "allowed_objects": [2]}"#,
        )
        .unwrap();
        assert_eq!(cfg.canvas_size, 100);
        assert_eq!(cfg.sprite_size, 28);
        assert_eq!(cfg.step_length, 0.2);
        cfg.validate().unwrap();
    }
}
