use crate::{
    config::GeneratorConfig,
    foundation::core::{OcclusionLabels, OcclusionWindow, VideoClip},
    foundation::error::{DriftError, DriftResult},
    foundation::rng::Rng64,
    sprites::{Sprite, SpritePool},
    trajectory::simulate_trajectory,
};

/// Max-composite `sprite` onto `frame` at top-left offset `(top, left)`.
///
/// Overlapping sprites keep the brighter pixel; intensities are never summed
/// or overwritten. The caller guarantees the sprite fits inside the frame at
/// the given offset (trajectory offsets always do).
pub fn blit_max(frame: &mut [u8], frame_width: u32, sprite: Sprite<'_>, top: u32, left: u32) {
    let size = sprite.size() as usize;
    let stride = frame_width as usize;
    for r in 0..size {
        let dst_off = (top as usize + r) * stride + left as usize;
        let dst = &mut frame[dst_off..dst_off + size];
        let src = &sprite.pixels()[r * size..(r + 1) * size];
        for (d, &s) in dst.iter_mut().zip(src) {
            *d = (*d).max(s);
        }
    }
}

/// Compose one scene: `num_objects` sprites bouncing over `total_frames`.
///
/// Per object, in index order: simulate a trajectory (3 draws), draw a
/// uniform sprite index (1 draw), and, when occlusion is configured, draw
/// the occlusion window start (1 draw). Frames inside an object's window are
/// skipped entirely for that object: it contributes nothing, which is
/// distinct from being drawn dark. Windows are sampled independently per
/// object and may overlap across objects.
///
/// Returns the composed clip, logical shape
/// `(total_frames, canvas, canvas, 1)`, plus the occlusion label grid
/// (empty when occlusion is disabled).
#[tracing::instrument(skip(cfg, pool, rng))]
pub fn compose_scene(
    cfg: &GeneratorConfig,
    num_objects: u32,
    pool: &SpritePool,
    rng: &mut Rng64,
) -> DriftResult<(VideoClip, OcclusionLabels)> {
    cfg.validate()?;
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

    let total_frames = cfg.total_frames();
    let mut clip = VideoClip::zeroed(total_frames, cfg.canvas_size, cfg.canvas_size);
    let mut labels = match cfg.occlusion_len {
        Some(len) => OcclusionLabels::new(len, num_objects as usize),
        None => OcclusionLabels::empty(),
    };

    for n in 0..num_objects as usize {
        let traj = simulate_trajectory(
            total_frames,
            cfg.canvas_size,
            cfg.sprite_size,
            cfg.step_length,
            rng,
        );
        let sprite = pool.get(rng.next_index(pool.len()))?;

        let window = cfg.occlusion_len.map(|len| OcclusionWindow {
            // Validated above: len <= input_frames, so the range is non-empty.
            start: rng.next_index(cfg.input_frames - len + 1),
            len,
        });

        for i in 0..total_frames {
            if let Some(w) = window
                && w.contains(i)
            {
                continue;
            }
            let (top, left) = traj.position(i);
            blit_max(clip.frame_mut(i), cfg.canvas_size, sprite, top, left);
        }

        if let Some(w) = window {
            labels.set_window(n, w)?;
        }
    }

    tracing::debug!(
        frames = total_frames,
        canvas = cfg.canvas_size,
        occluded = cfg.occlusion_len.is_some(),
        "composed scene"
    );
    Ok((clip, labels))
}
