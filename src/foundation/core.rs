use crate::foundation::error::{DriftError, DriftResult};

/// A sequence of square grayscale frames with a trailing singleton channel.
///
/// Pixel data is stored contiguously, frame-major then row-major. The logical
/// shape reported by [`VideoClip::shape`] is `(frames, height, width, 1)`; the
/// channel axis exists only so downstream image-format consumers see the
/// layout they expect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoClip {
    frames: usize,
    height: u32,
    width: u32,
    data: Vec<u8>,
}

impl VideoClip {
    /// Allocate a clip of `frames` zero-intensity frames.
    pub fn zeroed(frames: usize, height: u32, width: u32) -> Self {
        let len = frames * (height as usize) * (width as usize);
        Self {
            frames,
            height,
            width,
            data: vec![0; len],
        }
    }

    /// Build a clip from raw frame-major pixel data.
    pub fn from_raw(frames: usize, height: u32, width: u32, data: Vec<u8>) -> DriftResult<Self> {
        let expect = frames * (height as usize) * (width as usize);
        if data.len() != expect {
            return Err(DriftError::data(format!(
                "clip data length {} does not match shape ({frames}, {height}, {width}, 1)",
                data.len()
            )));
        }
        Ok(Self {
            frames,
            height,
            width,
            data,
        })
    }

    /// Logical shape `(frames, height, width, channels)`; channels is always 1.
    pub fn shape(&self) -> (usize, u32, u32, u32) {
        (self.frames, self.height, self.width, 1)
    }

    /// Number of frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// `true` when the clip holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Borrow frame `i` as a row-major pixel slice.
    ///
    /// Panics when `i >= frames`, like slice indexing.
    pub fn frame(&self, i: usize) -> &[u8] {
        let stride = (self.height as usize) * (self.width as usize);
        &self.data[i * stride..(i + 1) * stride]
    }

    /// Mutably borrow frame `i` as a row-major pixel slice.
    pub fn frame_mut(&mut self, i: usize) -> &mut [u8] {
        let stride = (self.height as usize) * (self.width as usize);
        &mut self.data[i * stride..(i + 1) * stride]
    }

    /// Intensity at `(frame, row, col)`.
    pub fn pixel(&self, frame: usize, row: u32, col: u32) -> u8 {
        self.frame(frame)[(row * self.width + col) as usize]
    }

    /// Borrow the full contiguous pixel buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Split into leading `n` frames and the remainder.
    pub fn split_at(mut self, n: usize) -> DriftResult<(VideoClip, VideoClip)> {
        if n > self.frames {
            return Err(DriftError::validation(format!(
                "cannot split clip of {} frames at {n}",
                self.frames
            )));
        }
        let stride = (self.height as usize) * (self.width as usize);
        let tail = self.data.split_off(n * stride);
        let head = VideoClip {
            frames: n,
            height: self.height,
            width: self.width,
            data: self.data,
        };
        let rest = VideoClip {
            frames: self.frames - n,
            height: self.height,
            width: self.width,
            data: tail,
        };
        Ok((head, rest))
    }

    /// Extract the centered `crop_height x crop_width` sub-region of every frame.
    pub fn crop_center(&self, crop_width: u32, crop_height: u32) -> DriftResult<VideoClip> {
        if crop_width == 0 || crop_height == 0 {
            return Err(DriftError::validation("crop dimensions must be > 0"));
        }
        if crop_width > self.width || crop_height > self.height {
            return Err(DriftError::validation(format!(
                "crop {crop_height}x{crop_width} exceeds frame {}x{}",
                self.height, self.width
            )));
        }

        let start_col = (self.width / 2 - crop_width / 2) as usize;
        let start_row = (self.height / 2 - crop_height / 2) as usize;
        let mut out = VideoClip::zeroed(self.frames, crop_height, crop_width);
        for f in 0..self.frames {
            let src = self.frame(f);
            let dst = out.frame_mut(f);
            for r in 0..crop_height as usize {
                let src_off = (start_row + r) * self.width as usize + start_col;
                let dst_off = r * crop_width as usize;
                dst[dst_off..dst_off + crop_width as usize]
                    .copy_from_slice(&src[src_off..src_off + crop_width as usize]);
            }
        }
        Ok(out)
    }
}

/// A contiguous run of frame indices during which one object is not drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OcclusionWindow {
    /// First occluded frame index.
    pub start: usize,
    /// Number of consecutive occluded frames.
    pub len: usize,
}

impl OcclusionWindow {
    /// `true` when `frame` falls inside the window.
    pub fn contains(self, frame: usize) -> bool {
        self.start <= frame && frame < self.start + self.len
    }

    /// Iterate the occluded frame indices in increasing order.
    pub fn frames(self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }
}

/// Label grid mapping `(interval position, object index)` to the absolute
/// frame index occluded for that object.
///
/// Column `n` holds the consecutive occluded frame indices of object `n`.
/// When occlusion is disabled the grid is empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcclusionLabels {
    len: usize,
    objects: usize,
    data: Vec<u32>,
}

impl OcclusionLabels {
    /// Empty grid used when occlusion is disabled.
    pub fn empty() -> Self {
        Self {
            len: 0,
            objects: 0,
            data: Vec::new(),
        }
    }

    /// Zero-filled grid of shape `(len, objects)`.
    pub fn new(len: usize, objects: usize) -> Self {
        Self {
            len,
            objects,
            data: vec![0; len * objects],
        }
    }

    /// Grid shape `(interval length, object count)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.len, self.objects)
    }

    /// `true` when no labels are recorded (occlusion disabled).
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Record `window`'s absolute frame indices into column `object`.
    pub fn set_window(&mut self, object: usize, window: OcclusionWindow) -> DriftResult<()> {
        if object >= self.objects {
            return Err(DriftError::validation(format!(
                "object index {object} out of range for {} label columns",
                self.objects
            )));
        }
        if window.len != self.len {
            return Err(DriftError::validation(format!(
                "window length {} does not match label grid length {}",
                window.len, self.len
            )));
        }
        for (pos, frame) in window.frames().enumerate() {
            self.data[pos * self.objects + object] = frame as u32;
        }
        Ok(())
    }

    /// Absolute frame index at `(pos, object)`.
    pub fn frame_at(&self, pos: usize, object: usize) -> u32 {
        self.data[pos * self.objects + object]
    }

    /// Reconstruct object `n`'s window from its column.
    pub fn window(&self, object: usize) -> Option<OcclusionWindow> {
        if self.is_empty() || object >= self.objects {
            return None;
        }
        Some(OcclusionWindow {
            start: self.frame_at(0, object) as usize,
            len: self.len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_clip_shape_and_contents() {
        let clip = VideoClip::zeroed(3, 4, 5);
        assert_eq!(clip.shape(), (3, 4, 5, 1));
        assert!(clip.data().iter().all(|&p| p == 0));
    }

    #[test]
    fn from_raw_rejects_wrong_length() {
        assert!(VideoClip::from_raw(2, 2, 2, vec![0; 7]).is_err());
        assert!(VideoClip::from_raw(2, 2, 2, vec![0; 8]).is_ok());
    }

    #[test]
    fn split_at_partitions_frames() {
        let mut clip = VideoClip::zeroed(4, 2, 2);
        clip.frame_mut(3)[0] = 9;
        let (head, tail) = clip.split_at(3).unwrap();
        assert_eq!(head.frames(), 3);
        assert_eq!(tail.frames(), 1);
        assert_eq!(tail.pixel(0, 0, 0), 9);
    }

    #[test]
    fn split_at_zero_and_full_are_valid() {
        let clip = VideoClip::zeroed(2, 2, 2);
        let (head, tail) = clip.clone().split_at(0).unwrap();
        assert!(head.is_empty());
        assert_eq!(tail.frames(), 2);

        let (head, tail) = clip.split_at(2).unwrap();
        assert_eq!(head.frames(), 2);
        assert!(tail.is_empty());
    }

    #[test]
    fn crop_center_extracts_middle_region() {
        let mut clip = VideoClip::zeroed(1, 6, 6);
        // Mark the pixel the integer-division start offsets should land on.
        let frame = clip.frame_mut(0);
        frame[(6 / 2 - 2 / 2) * 6 + (6 / 2 - 2 / 2)] = 7;
        let cropped = clip.crop_center(2, 2).unwrap();
        assert_eq!(cropped.shape(), (1, 2, 2, 1));
        assert_eq!(cropped.pixel(0, 0, 0), 7);
    }

    #[test]
    fn crop_larger_than_frame_is_rejected() {
        let clip = VideoClip::zeroed(1, 4, 4);
        assert!(clip.crop_center(5, 2).is_err());
    }

    #[test]
    fn window_contains_boundaries() {
        let w = OcclusionWindow { start: 3, len: 2 };
        assert!(!w.contains(2));
        assert!(w.contains(3));
        assert!(w.contains(4));
        assert!(!w.contains(5));
    }

    #[test]
    fn labels_record_consecutive_frames_per_column() {
        let mut labels = OcclusionLabels::new(3, 2);
        labels
            .set_window(1, OcclusionWindow { start: 5, len: 3 })
            .unwrap();
        assert_eq!(labels.frame_at(0, 1), 5);
        assert_eq!(labels.frame_at(1, 1), 6);
        assert_eq!(labels.frame_at(2, 1), 7);
        assert_eq!(labels.window(1), Some(OcclusionWindow { start: 5, len: 3 }));
    }

    #[test]
    fn labels_reject_mismatched_window() {
        let mut labels = OcclusionLabels::new(3, 1);
        assert!(
            labels
                .set_window(0, OcclusionWindow { start: 0, len: 2 })
                .is_err()
        );
        assert!(
            labels
                .set_window(1, OcclusionWindow { start: 0, len: 3 })
                .is_err()
        );
    }
}
