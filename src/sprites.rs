use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{DriftError, DriftResult};

/// IDX magic for an unsigned-byte tensor of rank 3 (count x rows x cols).
const IDX_UBYTE_RANK3_MAGIC: u32 = 0x0000_0803;

/// Borrowed view of one square grayscale sprite.
#[derive(Clone, Copy, Debug)]
pub struct Sprite<'a> {
    size: u32,
    pixels: &'a [u8],
}

impl<'a> Sprite<'a> {
    /// Sprite edge length in pixels.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Row-major grayscale pixels, `size * size` bytes.
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Intensity at `(row, col)`.
    pub fn pixel(&self, row: u32, col: u32) -> u8 {
        self.pixels[(row * self.size + col) as usize]
    }
}

/// Immutable pool of fixed-size square grayscale sprites.
///
/// IO is front-loaded: the pool is read and validated once, then shared
/// read-only by every compositing call. Sampling an instance is a uniform
/// index draw into [`SpritePool::get`].
#[derive(Clone, Debug)]
pub struct SpritePool {
    size: u32,
    count: usize,
    pixels: Vec<u8>,
}

impl SpritePool {
    /// Build a pool from raw contiguous pixel data (`count * size * size` bytes).
    pub fn from_raw(size: u32, count: usize, pixels: Vec<u8>) -> DriftResult<Self> {
        if size == 0 {
            return Err(DriftError::validation("sprite size must be > 0"));
        }
        let expect = count * (size as usize) * (size as usize);
        if pixels.len() != expect {
            return Err(DriftError::data(format!(
                "sprite pool has {} bytes, expected {expect} for {count} sprites of {size}x{size}",
                pixels.len()
            )));
        }
        Ok(Self {
            size,
            count,
            pixels,
        })
    }

    /// Load a pool from a gzip-compressed IDX unsigned-byte archive
    /// (the `train-images-idx3-ubyte.gz` layout: 16-byte big-endian header,
    /// then raw grayscale bytes).
    pub fn from_idx_gz(path: impl AsRef<Path>) -> DriftResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("open sprite archive '{}'", path.display()))?;
        let mut bytes = Vec::new();
        flate2::read::GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("decompress sprite archive '{}'", path.display()))?;
        Self::from_idx_bytes(&bytes)
    }

    /// Parse an uncompressed IDX unsigned-byte archive.
    pub fn from_idx_bytes(bytes: &[u8]) -> DriftResult<Self> {
        if bytes.len() < 16 {
            return Err(DriftError::data("idx header truncated"));
        }
        let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != IDX_UBYTE_RANK3_MAGIC {
            return Err(DriftError::data(format!(
                "idx magic 0x{magic:08x}, expected 0x{IDX_UBYTE_RANK3_MAGIC:08x}"
            )));
        }
        let count = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let rows = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let cols = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);
        if rows != cols {
            return Err(DriftError::data(format!(
                "idx images are {rows}x{cols}, expected square sprites"
            )));
        }
        let payload = &bytes[16..];
        let expect = count * (rows as usize) * (cols as usize);
        if payload.len() != expect {
            return Err(DriftError::data(format!(
                "idx payload has {} bytes, expected {expect}",
                payload.len()
            )));
        }
        Self::from_raw(rows, count, payload.to_vec())
    }

    /// Sprite edge length in pixels.
    pub fn sprite_size(&self) -> u32 {
        self.size
    }

    /// Number of sprites in the pool.
    pub fn len(&self) -> usize {
        self.count
    }

    /// `true` when the pool holds no sprites.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Borrow sprite `idx`.
    pub fn get(&self, idx: usize) -> DriftResult<Sprite<'_>> {
        if idx >= self.count {
            return Err(DriftError::data(format!(
                "sprite index {idx} out of range for pool of {}",
                self.count
            )));
        }
        let stride = (self.size as usize) * (self.size as usize);
        Ok(Sprite {
            size: self.size,
            pixels: &self.pixels[idx * stride..(idx + 1) * stride],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn idx_bytes(count: u32, rows: u32, cols: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&IDX_UBYTE_RANK3_MAGIC.to_be_bytes());
        out.extend_from_slice(&count.to_be_bytes());
        out.extend_from_slice(&rows.to_be_bytes());
        out.extend_from_slice(&cols.to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn parses_well_formed_idx() {
        let payload: Vec<u8> = (0..2 * 3 * 3).map(|i| i as u8).collect();
        let pool = SpritePool::from_idx_bytes(&idx_bytes(2, 3, 3, &payload)).unwrap();
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.sprite_size(), 3);
        let s = pool.get(1).unwrap();
        assert_eq!(s.pixel(0, 0), 9);
        assert_eq!(s.pixel(2, 2), 17);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = idx_bytes(1, 2, 2, &[0; 4]);
        bytes[3] = 0x01;
        let err = SpritePool::from_idx_bytes(&bytes).unwrap_err();
        assert!(matches!(err, DriftError::Data(_)));
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = idx_bytes(2, 3, 3, &[0; 9]);
        assert!(SpritePool::from_idx_bytes(&bytes).is_err());
    }

    #[test]
    fn rejects_non_square_images() {
        let bytes = idx_bytes(1, 2, 3, &[0; 6]);
        assert!(SpritePool::from_idx_bytes(&bytes).is_err());
    }

    #[test]
    fn out_of_range_sprite_lookup_fails() {
        let pool = SpritePool::from_raw(2, 1, vec![0; 4]).unwrap();
        assert!(pool.get(1).is_err());
    }

    #[test]
    fn round_trips_through_gzip_file() {
        let payload = vec![42u8; 2 * 2];
        let bytes = idx_bytes(1, 2, 2, &payload);

        let dir = std::env::temp_dir();
        let path = dir.join(format!("digitdrift-idx-{}.gz", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        let mut gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        gz.write_all(&bytes).unwrap();
        gz.finish().unwrap();

        let pool = SpritePool::from_idx_gz(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.get(0).unwrap().pixels(), payload.as_slice());
    }

    #[test]
    fn missing_file_error_carries_path_context() {
        let err = SpritePool::from_idx_gz("/nonexistent/digits.gz").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/digits.gz"));
    }
}
