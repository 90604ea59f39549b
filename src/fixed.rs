use std::path::Path;

use anyhow::Context;

use crate::foundation::core::VideoClip;
use crate::foundation::error::{DriftError, DriftResult};

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Precomputed evaluation set: a fixed u8 tensor of shape
/// `(frames, samples, height, width)`.
///
/// Sampling copies one sample's frames out as a [`VideoClip`]; the
/// trajectory/occlusion machinery is bypassed entirely in this mode.
#[derive(Clone, Debug)]
pub struct FixedSet {
    frames: usize,
    samples: usize,
    height: u32,
    width: u32,
    data: Vec<u8>,
}

impl FixedSet {
    /// Build a set from a raw tensor in `(frames, samples, height, width)`
    /// layout.
    pub fn from_raw(
        frames: usize,
        samples: usize,
        height: u32,
        width: u32,
        data: Vec<u8>,
    ) -> DriftResult<Self> {
        let expect = frames * samples * (height as usize) * (width as usize);
        if data.len() != expect {
            return Err(DriftError::data(format!(
                "fixed set has {} bytes, expected {expect} for shape ({frames}, {samples}, {height}, {width})",
                data.len()
            )));
        }
        Ok(Self {
            frames,
            samples,
            height,
            width,
            data,
        })
    }

    /// Load a fixed set from a NumPy `.npy` file (the `mnist_test_seq.npy`
    /// layout: version 1.x header, `|u1` dtype, C order, rank-4 shape).
    pub fn from_npy(path: impl AsRef<Path>) -> DriftResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read fixed set from '{}'", path.display()))?;
        Self::from_npy_bytes(&bytes)
    }

    /// Parse a NumPy `.npy` byte buffer.
    pub fn from_npy_bytes(bytes: &[u8]) -> DriftResult<Self> {
        if bytes.len() < 10 || &bytes[..6] != NPY_MAGIC {
            return Err(DriftError::data("npy magic missing"));
        }
        let major = bytes[6];
        let (header_len, header_start) = match major {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 => {
                if bytes.len() < 12 {
                    return Err(DriftError::data("npy header truncated"));
                }
                (
                    u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                    12,
                )
            }
            v => {
                return Err(DriftError::data(format!(
                    "unsupported npy major version {v}"
                )));
            }
        };
        let payload_start = header_start + header_len;
        if bytes.len() < payload_start {
            return Err(DriftError::data("npy header truncated"));
        }
        let header = std::str::from_utf8(&bytes[header_start..payload_start])
            .map_err(|_| DriftError::data("npy header is not valid utf-8"))?;

        let descr = dict_value(header, "descr")?;
        if descr != "|u1" {
            return Err(DriftError::data(format!(
                "npy dtype {descr}, expected |u1"
            )));
        }
        if dict_value(header, "fortran_order")? != "False" {
            return Err(DriftError::data("npy must be C-contiguous"));
        }
        let shape = parse_shape(header)?;
        let &[frames, samples, height, width] = shape.as_slice() else {
            return Err(DriftError::data(format!(
                "npy shape has rank {}, expected 4",
                shape.len()
            )));
        };
        let height = u32::try_from(height)
            .map_err(|_| DriftError::data("npy height does not fit in u32"))?;
        let width =
            u32::try_from(width).map_err(|_| DriftError::data("npy width does not fit in u32"))?;

        Self::from_raw(frames, samples, height, width, bytes[payload_start..].to_vec())
    }

    /// Frames per sample.
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

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples
    }

    /// `true` when the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Copy sample `idx` out as a clip of shape
    /// `(frames, height, width, 1)`.
    pub fn sample(&self, idx: usize) -> DriftResult<VideoClip> {
        if idx >= self.samples {
            return Err(DriftError::validation(format!(
                "sample index {idx} out of range for fixed set of {}",
                self.samples
            )));
        }
        let frame_px = (self.height as usize) * (self.width as usize);
        let mut clip = VideoClip::zeroed(self.frames, self.height, self.width);
        for f in 0..self.frames {
            // Source layout is frame-major over samples: (frames, samples, h, w).
            let src_off = (f * self.samples + idx) * frame_px;
            clip.frame_mut(f)
                .copy_from_slice(&self.data[src_off..src_off + frame_px]);
        }
        Ok(clip)
    }
}

/// Extract the raw value string for `key` from a Python-dict npy header.
fn dict_value<'a>(header: &'a str, key: &str) -> DriftResult<&'a str> {
    let pat = format!("'{key}':");
    let at = header
        .find(&pat)
        .ok_or_else(|| DriftError::data(format!("npy header missing '{key}'")))?;
    let rest = header[at + pat.len()..].trim_start();
    let end = rest
        .find([',', '}'])
        .ok_or_else(|| DriftError::data("npy header unterminated"))?;
    Ok(rest[..end].trim().trim_matches('\''))
}

fn parse_shape(header: &str) -> DriftResult<Vec<usize>> {
    let open = header
        .find("'shape':")
        .and_then(|at| header[at..].find('(').map(|o| at + o))
        .ok_or_else(|| DriftError::data("npy header missing 'shape'"))?;
    let close = header[open..]
        .find(')')
        .map(|c| open + c)
        .ok_or_else(|| DriftError::data("npy shape unterminated"))?;

    let mut out = Vec::new();
    for part in header[open + 1..close].split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        out.push(
            part.parse::<usize>()
                .map_err(|_| DriftError::data(format!("npy shape entry '{part}' is not a number")))?,
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn npy_bytes(shape: &str, payload: &[u8]) -> Vec<u8> {
        let header = format!("{{'descr': '|u1', 'fortran_order': False, 'shape': {shape}, }}");
        let mut out = Vec::new();
        out.extend_from_slice(NPY_MAGIC);
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn parses_rank4_u8_npy() {
        // 2 frames, 3 samples, 2x2 pixels.
        let payload: Vec<u8> = (0..2 * 3 * 4).map(|i| i as u8).collect();
        let set = FixedSet::from_npy_bytes(&npy_bytes("(2, 3, 2, 2)", &payload)).unwrap();
        assert_eq!(set.frames(), 2);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn sample_gathers_one_column_of_the_tensor() {
        let payload: Vec<u8> = (0..2 * 3 * 4).map(|i| i as u8).collect();
        let set = FixedSet::from_raw(2, 3, 2, 2, payload).unwrap();
        let clip = set.sample(1).unwrap();
        assert_eq!(clip.shape(), (2, 2, 2, 1));
        // Frame 0 of sample 1 starts at offset (0*3 + 1) * 4 = 4.
        assert_eq!(clip.frame(0), &[4, 5, 6, 7]);
        // Frame 1 of sample 1 starts at offset (1*3 + 1) * 4 = 16.
        assert_eq!(clip.frame(1), &[16, 17, 18, 19]);
    }

    #[test]
    fn rejects_wrong_dtype() {
        let header = "{'descr': '<f4', 'fortran_order': False, 'shape': (1, 1, 1, 1), }";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(NPY_MAGIC);
        bytes.extend_from_slice(&[1, 0]);
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&[0; 4]);
        assert!(FixedSet::from_npy_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_wrong_rank() {
        let err = FixedSet::from_npy_bytes(&npy_bytes("(2, 2)", &[0; 4])).unwrap_err();
        assert!(err.to_string().contains("rank"));
    }

    #[test]
    fn rejects_missing_magic() {
        assert!(FixedSet::from_npy_bytes(b"NOPE").is_err());
    }

    #[test]
    fn rejects_payload_shape_mismatch() {
        assert!(FixedSet::from_npy_bytes(&npy_bytes("(2, 3, 2, 2)", &[0; 5])).is_err());
    }

    #[test]
    fn out_of_range_sample_fails() {
        let set = FixedSet::from_raw(1, 2, 1, 1, vec![0; 2]).unwrap();
        assert!(set.sample(2).is_err());
    }
}
