use rayon::prelude::*;

use crate::{
    compose::compose_scene,
    config::GeneratorConfig,
    fixed::FixedSet,
    foundation::core::{OcclusionLabels, VideoClip},
    foundation::error::{DriftError, DriftResult},
    foundation::rng::Rng64,
    sprites::SpritePool,
};

/// Synthetic sample count reported by generated-mode datasets.
///
/// On-the-fly generation has no natural length; this mirrors the fixed
/// constant used by common moving-digit benchmark loaders.
const GENERATED_LEN: usize = 10_000;

/// Where a dataset's clips come from, selected once at construction.
pub enum DataSource {
    /// Compose clips on the fly from a sprite pool.
    Generated(SpritePool),
    /// Look clips up in a precomputed evaluation set.
    ///
    /// The fixed-set format carries no occlusion labels, so occlusion is
    /// disabled in this mode and [`Sample::occlusion`] is always empty.
    FixedSet(FixedSet),
}

/// Optional hook applied to the full (cropped) clip before the input/output
/// split.
pub type TransformFn = Box<dyn Fn(VideoClip) -> VideoClip + Send + Sync>;

/// One dataset sample: the frame split plus occlusion labels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Frames given to the model.
    pub input: VideoClip,
    /// Frames the model must forecast; empty when `output_frames` is 0.
    pub output: VideoClip,
    /// Per-object occluded frame indices; empty when occlusion is disabled
    /// or in fixed-set mode.
    pub occlusion: OcclusionLabels,
}

/// Moving-digit video dataset.
///
/// Exposes the index contract consumed by batched training loops: `get`
/// produces one `(input, output)` clip pair, `len` reports the number of
/// distinct samples. Generation draws from an explicit per-worker random
/// stream; the index only selects content in fixed-set mode.
pub struct MovingDigits {
    cfg: GeneratorConfig,
    source: DataSource,
    transform: Option<TransformFn>,
}

impl MovingDigits {
    /// Build a dataset over `source`, validating `cfg` against it.
    pub fn new(cfg: GeneratorConfig, source: DataSource) -> DriftResult<Self> {
        cfg.validate()?;
        match &source {
            DataSource::Generated(pool) => {
                if pool.is_empty() {
                    return Err(DriftError::data("sprite pool is empty"));
                }
                if pool.sprite_size() != cfg.sprite_size {
                    return Err(DriftError::validation(format!(
                        "pool sprite size {} does not match configured sprite_size {}",
                        pool.sprite_size(),
                        cfg.sprite_size
                    )));
                }
            }
            DataSource::FixedSet(set) => {
                if set.is_empty() {
                    return Err(DriftError::data("fixed set is empty"));
                }
                if set.frames() != cfg.total_frames() {
                    return Err(DriftError::validation(format!(
                        "fixed set has {} frames per sample, config expects {}",
                        set.frames(),
                        cfg.total_frames()
                    )));
                }
                if set.height() != cfg.canvas_size || set.width() != cfg.canvas_size {
                    return Err(DriftError::validation(format!(
                        "fixed set frames are {}x{}, config expects canvas_size {}",
                        set.height(),
                        set.width(),
                        cfg.canvas_size
                    )));
                }
            }
        }
        Ok(Self {
            cfg,
            source,
            transform: None,
        })
    }

    /// Attach a transform hook applied to every clip before the split.
    pub fn with_transform(mut self, transform: TransformFn) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Borrow the validated config.
    pub fn config(&self) -> &GeneratorConfig {
        &self.cfg
    }

    /// Number of distinct samples.
    pub fn len(&self) -> usize {
        match &self.source {
            DataSource::Generated(_) => GENERATED_LEN,
            DataSource::FixedSet(set) => set.len(),
        }
    }

    /// `true` when the dataset reports no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Produce sample `idx`, drawing from `rng` in generated mode.
    #[tracing::instrument(skip(self, rng))]
    pub fn get(&self, idx: usize, rng: &mut Rng64) -> DriftResult<Sample> {
        if idx >= self.len() {
            return Err(DriftError::validation(format!(
                "sample index {idx} out of range for dataset of {}",
                self.len()
            )));
        }

        let (clip, occlusion) = match &self.source {
            DataSource::Generated(pool) => {
                let choices = &self.cfg.allowed_objects;
                let num_objects = choices[rng.next_index(choices.len())];
                compose_scene(&self.cfg, num_objects, pool, rng)?
            }
            DataSource::FixedSet(set) => (set.sample(idx)?, OcclusionLabels::empty()),
        };
        self.finish(clip, occlusion)
    }

    /// Generate samples `range` in parallel, one derived stream per index.
    ///
    /// Each sample's stream is a pure function of `base_seed` and its index,
    /// so results are deterministic and independent of worker scheduling.
    pub fn generate_batch(
        &self,
        range: std::ops::Range<usize>,
        base_seed: u64,
    ) -> DriftResult<Vec<Sample>> {
        range
            .into_par_iter()
            .map(|idx| {
                let mut rng = stream_for_index(base_seed, idx);
                self.get(idx, &mut rng)
            })
            .collect()
    }

    /// Produce a scene for an explicit object count, bypassing the uniform
    /// object-count draw.
    ///
    /// Fails with a validation error when `num_objects` is not among the
    /// configured allowed counts; only available in generated mode.
    pub fn get_with_objects(&self, num_objects: u32, rng: &mut Rng64) -> DriftResult<Sample> {
        if !self.cfg.allowed_objects.contains(&num_objects) {
            return Err(DriftError::validation(format!(
                "object count {num_objects} not in allowed set {:?}",
                self.cfg.allowed_objects
            )));
        }
        let DataSource::Generated(pool) = &self.source else {
            return Err(DriftError::validation(
                "explicit object counts require a generated data source",
            ));
        };

        let (clip, occlusion) = compose_scene(&self.cfg, num_objects, pool, rng)?;
        self.finish(clip, occlusion)
    }

    /// Crop, transform, and split a composed clip into a sample.
    fn finish(&self, clip: VideoClip, occlusion: OcclusionLabels) -> DriftResult<Sample> {
        let clip = match self.cfg.crop {
            Some(crop) => clip.crop_center(crop.width, crop.height)?,
            None => clip,
        };
        let clip = match &self.transform {
            Some(f) => f(clip),
            None => clip,
        };
        let (input, output) = clip.split_at(self.cfg.input_frames)?;
        Ok(Sample {
            input,
            output,
            occlusion,
        })
    }
}

/// Derive the independent stream for sample `idx` under `base_seed`.
pub fn stream_for_index(base_seed: u64, idx: usize) -> Rng64 {
    Rng64::new(base_seed ^ (idx as u64).wrapping_mul(0xD6E8_FEB8_6659_FD93))
}

impl std::fmt::Debug for MovingDigits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            DataSource::Generated(pool) => format!("Generated({} sprites)", pool.len()),
            DataSource::FixedSet(set) => format!("FixedSet({} samples)", set.len()),
        };
        f.debug_struct("MovingDigits")
            .field("cfg", &self.cfg)
            .field("source", &source)
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}
