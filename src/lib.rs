//! Digitdrift synthesizes video clips of handwritten digits bouncing inside a
//! square canvas, for training and evaluating sequence-prediction models.
//!
//! # Pipeline overview
//!
//! 1. **Simulate**: [`simulate_trajectory`] turns a seeded random stream into a
//!    reflecting 2D trajectory (`Trajectory`), one placement per frame.
//! 2. **Compose**: [`compose_scene`] draws one sprite per object along its
//!    trajectory onto a shared multi-frame canvas with pixel-wise max
//!    compositing, skipping each object's occlusion window entirely.
//! 3. **Sample**: [`MovingDigits`] exposes the dataset contract: `get` yields
//!    an (input, output) frame split plus the per-object occlusion labels.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-seed**: every random draw comes from an explicit
//!   [`Rng64`] handle owned by the caller; there is no global random state.
//!   One stream per worker makes parallel data loading reproducible.
//! - **No IO in the generator**: sprite pools and fixed evaluation sets are
//!   loaded up front ([`SpritePool::from_idx_gz`], [`FixedSet::from_npy`]);
//!   composing a scene touches memory only.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compose;
mod config;
mod dataset;
mod fixed;
mod foundation;
mod sprites;
mod trajectory;

pub use compose::{blit_max, compose_scene};
pub use config::{CropSize, GeneratorConfig};
pub use dataset::{DataSource, MovingDigits, Sample, TransformFn, stream_for_index};
pub use fixed::FixedSet;
pub use foundation::core::{OcclusionLabels, OcclusionWindow, VideoClip};
pub use foundation::error::{DriftError, DriftResult};
pub use foundation::rng::Rng64;
pub use sprites::{Sprite, SpritePool};
pub use trajectory::{Trajectory, simulate_trajectory};
