use crate::foundation::rng::Rng64;

/// One reflecting 2D trajectory: integer sprite placements, one per frame.
///
/// Every offset lies in `[0, canvas_size - sprite_size]`, so a
/// `sprite_size`-square sprite drawn at any recorded position stays inside the
/// canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Trajectory {
    rows: Vec<u32>,
    cols: Vec<u32>,
}

impl Trajectory {
    /// Number of recorded positions.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when no positions were recorded.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Placement at frame `i` as `(row, col)` top-left offsets.
    pub fn position(&self, i: usize) -> (u32, u32) {
        (self.rows[i], self.cols[i])
    }

    /// Row offsets, one per frame.
    pub fn rows(&self) -> &[u32] {
        &self.rows
    }

    /// Column offsets, one per frame.
    pub fn cols(&self) -> &[u32] {
        &self.cols
    }
}

/// Simulate one bouncing point mass for `len` steps.
///
/// The simulation runs in normalized `[0, 1]` space: the start position is
/// drawn uniformly from the unit square and the unit velocity from a uniform
/// angle, costing exactly three draws from `rng`. Each step advances both
/// axes by `velocity * step_length` and then reflects per axis independently
/// (coordinate clamped to the boundary, velocity component negated). The
/// post-reflection position of every step is recorded, scaled by
/// `canvas_size - sprite_size`, and truncated toward zero.
///
/// Pure function of its inputs; the caller is responsible for validating
/// `sprite_size <= canvas_size` (see [`crate::GeneratorConfig::validate`]).
pub fn simulate_trajectory(
    len: usize,
    canvas_size: u32,
    sprite_size: u32,
    step_length: f64,
    rng: &mut Rng64,
) -> Trajectory {
    let span = f64::from(canvas_size.saturating_sub(sprite_size));

    let mut x = rng.next_f64_01();
    let mut y = rng.next_f64_01();
    let theta = rng.next_f64_01() * std::f64::consts::TAU;
    let mut v_x = theta.cos();
    let mut v_y = theta.sin();

    let mut rows = Vec::with_capacity(len);
    let mut cols = Vec::with_capacity(len);
    for _ in 0..len {
        x += v_x * step_length;
        y += v_y * step_length;

        // Bounce off edges; a step may reflect on one axis, both, or neither.
        if x <= 0.0 {
            x = 0.0;
            v_x = -v_x;
        }
        if x >= 1.0 {
            x = 1.0;
            v_x = -v_x;
        }
        if y <= 0.0 {
            y = 0.0;
            v_y = -v_y;
        }
        if y >= 1.0 {
            y = 1.0;
            v_y = -v_y;
        }

        rows.push((y * span) as u32);
        cols.push((x * span) as u32);
    }

    Trajectory { rows, cols }
}
