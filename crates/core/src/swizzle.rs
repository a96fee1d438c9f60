//! nv2a swizzled (Z-order) texture addressing.
//!
//! Address bits are handed out round-robin to x, y and z, one bit per
//! dimension per round, for as long as `bit < dimension`. The resulting masks
//! describe which bits of a texel's index belong to which coordinate.

use crate::color::ColorFormatInfo;
use crate::error::SwizzleError;

pub trait Deswizzler {
    type Format;
    fn deswizzle(
        &self,
        source: &[u8],
        width: u32,
        height: u32,
        depth: u32,
        format: Self::Format,
    ) -> Result<Vec<u8>, SwizzleError>;
}

/// Per-dimension bit masks of a swizzled index.
///
/// For a 2D 8x32 texture x needs 3 bits and y needs 5:
/// ```text
/// x: 00010101
/// y: 11101010
/// z: 00000000
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwizzleMasks {
    pub x: u64,
    pub y: u64,
    pub z: u64,
}

impl SwizzleMasks {
    pub fn generate(width: u32, height: u32, depth: u32) -> Result<Self, SwizzleError> {
        let too_large = SwizzleError::DimensionsTooLarge {
            width,
            height,
            depth,
        };

        let mut masks = SwizzleMasks::default();
        let mut bit: u64 = 1;
        // Next index bit to hand out
        let mut cursor: u64 = 1;

        loop {
            let mut done = true;
            for (dimension, mask) in [
                (width, &mut masks.x),
                (height, &mut masks.y),
                (depth, &mut masks.z),
            ] {
                if bit < dimension as u64 {
                    *mask |= cursor;
                    cursor = cursor.checked_mul(2).ok_or_else(|| too_large.clone())?;
                    done = false;
                }
            }

            if done {
                break;
            }
            bit <<= 1;
        }

        masks.check_coverage(cursor - 1)?;
        Ok(masks)
    }

    /// Masks must be pairwise disjoint and together form `0b0..01..1`.
    fn check_coverage(&self, expected: u64) -> Result<(), SwizzleError> {
        let disjoint = self.x & self.y == 0 && self.x & self.z == 0 && self.y & self.z == 0;
        if !disjoint || self.union() != expected {
            return Err(SwizzleError::InconsistentMasks {
                x: self.x,
                y: self.y,
                z: self.z,
            });
        }

        Ok(())
    }

    pub fn union(&self) -> u64 {
        self.x | self.y | self.z
    }
}

/// Counts upwards through every value whose set bits lie within `mask`,
/// wrapping back to zero after `mask` itself.
///
/// Setting every bit outside the mask before adding one makes the carry skip
/// straight over them.
pub fn masked_offsets(mask: u64) -> impl Iterator<Item = u64> {
    std::iter::successors(Some(0u64), move |&value| {
        Some((value | !mask).wrapping_add(1) & mask)
    })
}

/// Visits every texel of a `width`x`height`x`depth` box in row-major order
/// (z outermost), passing its coordinates and swizzled index.
fn walk_box(
    width: u32,
    height: u32,
    depth: u32,
    mut f: impl FnMut(usize, usize, usize, usize) -> Result<(), SwizzleError>,
) -> Result<(), SwizzleError> {
    let masks = SwizzleMasks::generate(width, height, depth)?;

    for (z, offset_z) in masked_offsets(masks.z).take(depth as usize).enumerate() {
        for (y, offset_y) in masked_offsets(masks.y).take(height as usize).enumerate() {
            for (x, offset_x) in masked_offsets(masks.x).take(width as usize).enumerate() {
                f(x, y, z, (offset_x + offset_y + offset_z) as usize)?;
            }
        }
    }

    Ok(())
}

/// Saturates instead of wrapping so oversized boxes fail the bounds check.
fn linear_offset(
    x: usize,
    y: usize,
    z: usize,
    row_pitch: usize,
    slice_pitch: usize,
    bytes_per_pixel: usize,
) -> usize {
    z.saturating_mul(slice_pitch)
        .saturating_add(y.saturating_mul(row_pitch))
        .saturating_add(x.saturating_mul(bytes_per_pixel))
}

/// Copies a swizzled box into a linear buffer addressed by
/// `z * slice_pitch + y * row_pitch + x * bytes_per_pixel`.
///
/// `src` is expected to hold the texels back to back in swizzled order. The
/// copy stops at the first texel that would fall outside either buffer.
#[allow(clippy::too_many_arguments)]
pub fn unswizzle_box(
    src: &[u8],
    width: u32,
    height: u32,
    depth: u32,
    dst: &mut [u8],
    row_pitch: usize,
    slice_pitch: usize,
    bytes_per_pixel: usize,
) -> Result<(), SwizzleError> {
    profiling::scope!("unswizzle_box");

    walk_box(width, height, depth, |x, y, z, index| {
        let src_offset = index.saturating_mul(bytes_per_pixel);
        let dst_offset = linear_offset(x, y, z, row_pitch, slice_pitch, bytes_per_pixel);

        let source = src
            .get(src_offset..src_offset.saturating_add(bytes_per_pixel))
            .ok_or(SwizzleError::SourceTruncated {
                offset: src_offset,
                needed: bytes_per_pixel,
                actual: src.len(),
            })?;
        let dst_len = dst.len();
        let dest = dst
            .get_mut(dst_offset..dst_offset.saturating_add(bytes_per_pixel))
            .ok_or(SwizzleError::DestinationTooSmall {
                offset: dst_offset,
                needed: bytes_per_pixel,
                actual: dst_len,
            })?;

        dest.copy_from_slice(source);
        Ok(())
    })
}

pub fn unswizzle_rect(
    src: &[u8],
    width: u32,
    height: u32,
    dst: &mut [u8],
    pitch: usize,
    bytes_per_pixel: usize,
) -> Result<(), SwizzleError> {
    unswizzle_box(src, width, height, 1, dst, pitch, 0, bytes_per_pixel)
}

/// Inverse of [`unswizzle_box`]: interleaves a linear box into swizzled order.
#[allow(clippy::too_many_arguments)]
pub fn swizzle_box(
    src: &[u8],
    width: u32,
    height: u32,
    depth: u32,
    row_pitch: usize,
    slice_pitch: usize,
    dst: &mut [u8],
    bytes_per_pixel: usize,
) -> Result<(), SwizzleError> {
    walk_box(width, height, depth, |x, y, z, index| {
        let src_offset = linear_offset(x, y, z, row_pitch, slice_pitch, bytes_per_pixel);
        let dst_offset = index.saturating_mul(bytes_per_pixel);

        let source = src
            .get(src_offset..src_offset.saturating_add(bytes_per_pixel))
            .ok_or(SwizzleError::SourceTruncated {
                offset: src_offset,
                needed: bytes_per_pixel,
                actual: src.len(),
            })?;
        let dst_len = dst.len();
        let dest = dst
            .get_mut(dst_offset..dst_offset.saturating_add(bytes_per_pixel))
            .ok_or(SwizzleError::DestinationTooSmall {
                offset: dst_offset,
                needed: bytes_per_pixel,
                actual: dst_len,
            })?;

        dest.copy_from_slice(source);
        Ok(())
    })
}

pub struct Nv2aDeswizzler;

impl Deswizzler for Nv2aDeswizzler {
    type Format = ColorFormatInfo;

    /// Produces a tightly packed linear buffer (no row or slice padding).
    fn deswizzle(
        &self,
        source: &[u8],
        width: u32,
        height: u32,
        depth: u32,
        format: Self::Format,
    ) -> Result<Vec<u8>, SwizzleError> {
        let too_large = SwizzleError::DimensionsTooLarge {
            width,
            height,
            depth,
        };

        let bytes_per_pixel = format.bytes_per_pixel();
        let row_pitch = (width as usize)
            .checked_mul(bytes_per_pixel)
            .ok_or_else(|| too_large.clone())?;
        let slice_pitch = row_pitch
            .checked_mul(height as usize)
            .ok_or_else(|| too_large.clone())?;
        let size = slice_pitch.checked_mul(depth as usize).ok_or(too_large)?;

        // Every texel must be present before anything is allocated
        if source.len() < size {
            return Err(SwizzleError::SourceTruncated {
                offset: source.len(),
                needed: size - source.len(),
                actual: source.len(),
            });
        }

        let mut linear = vec![0; size];
        unswizzle_box(
            source,
            width,
            height,
            depth,
            &mut linear,
            row_pitch,
            slice_pitch,
            bytes_per_pixel,
        )?;

        Ok(linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::lookup_texture;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn is_contiguous_from_zero(value: u64) -> bool {
        value & value.wrapping_add(1) == 0
    }

    #[test]
    fn masks_8_32() {
        let masks = SwizzleMasks::generate(8, 32, 1).unwrap();
        assert_eq!(
            masks,
            SwizzleMasks {
                x: 0b0001_0101,
                y: 0b1110_1010,
                z: 0
            }
        );
    }

    #[test]
    fn masks_cube() {
        let masks = SwizzleMasks::generate(8, 8, 8).unwrap();
        assert_eq!(masks.x, 0b001_001_001);
        assert_eq!(masks.y, 0b010_010_010);
        assert_eq!(masks.z, 0b100_100_100);
    }

    #[test]
    fn masks_non_power_of_two() {
        // 3 needs two bits: bit 1 and bit 2 are both below it
        let masks = SwizzleMasks::generate(3, 2, 1).unwrap();
        assert_eq!(masks.x, 0b101);
        assert_eq!(masks.y, 0b010);
        assert_eq!(masks.z, 0);
    }

    #[test]
    fn masks_degenerate() {
        assert_eq!(
            SwizzleMasks::generate(1, 1, 1).unwrap(),
            SwizzleMasks::default()
        );
        assert_eq!(
            SwizzleMasks::generate(0, 0, 0).unwrap(),
            SwizzleMasks::default()
        );
    }

    #[test]
    fn masks_disjoint_and_contiguous() {
        let mut rng = StdRng::seed_from_u64(0x2a);
        for _ in 0..2000 {
            let width = rng.gen_range(1..=4096);
            let height = rng.gen_range(1..=4096);
            let depth = rng.gen_range(1..=512);

            let masks = SwizzleMasks::generate(width, height, depth).unwrap();
            assert_eq!(masks.x & masks.y, 0);
            assert_eq!(masks.x & masks.z, 0);
            assert_eq!(masks.y & masks.z, 0);
            assert!(
                is_contiguous_from_zero(masks.union()),
                "{width}x{height}x{depth}: {masks:?}"
            );
        }
    }

    #[test]
    fn masks_too_large() {
        assert!(matches!(
            SwizzleMasks::generate(u32::MAX, u32::MAX, u32::MAX),
            Err(SwizzleError::DimensionsTooLarge { .. })
        ));
    }

    #[test]
    fn masked_offsets_order() {
        let values: Vec<u64> = masked_offsets(0b0101).take(6).collect();
        assert_eq!(values, [0b0000, 0b0001, 0b0100, 0b0101, 0, 0b0001]);

        let values: Vec<u64> = masked_offsets(0).take(3).collect();
        assert_eq!(values, [0, 0, 0]);
    }

    #[test]
    fn masked_offsets_match_decrement_form() {
        for mask in [0b1u64, 0b1010, 0b1001_0010, 0b1110_1010, 0x5555] {
            let mut expected = 0u64;
            for value in masked_offsets(mask).take(300) {
                assert_eq!(value, expected);
                expected = expected.wrapping_sub(mask) & mask;
            }
        }
    }

    #[test]
    fn unswizzle_2x2_is_identity() {
        let tiled: Vec<u8> = (0..16).collect();
        let mut linear = vec![0; 16];
        unswizzle_box(&tiled, 2, 2, 1, &mut linear, 8, 16, 4).unwrap();
        assert_eq!(&linear[0..4], &[0x00, 0x01, 0x02, 0x03]);
        assert_eq!(&linear[4..8], &[0x04, 0x05, 0x06, 0x07]);
        assert_eq!(&linear[8..12], &[0x08, 0x09, 0x0A, 0x0B]);
        assert_eq!(&linear[12..16], &[0x0C, 0x0D, 0x0E, 0x0F]);
    }

    #[test]
    fn unswizzle_4x4() {
        // Pixel n of the tiled buffer is filled with n
        let tiled: Vec<u8> = (0..16u8).flat_map(|i| [i; 4]).collect();
        let mut linear = vec![0; 64];
        unswizzle_rect(&tiled, 4, 4, &mut linear, 16, 4).unwrap();

        let order: Vec<u8> = linear.chunks_exact(4).map(|p| p[0]).collect();
        assert_eq!(
            order,
            [0, 1, 4, 5, 2, 3, 6, 7, 8, 9, 12, 13, 10, 11, 14, 15]
        );
    }

    fn morton3(x: usize, y: usize, z: usize) -> usize {
        (0..3)
            .map(|i| {
                (((x >> i) & 1) << (3 * i))
                    | (((y >> i) & 1) << (3 * i + 1))
                    | (((z >> i) & 1) << (3 * i + 2))
            })
            .sum()
    }

    #[test]
    fn unswizzle_8x8x8_reproduces_linear() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut linear = vec![0u8; 8 * 8 * 8 * 4];
        rng.fill(&mut linear[..]);

        let mut tiled = vec![0u8; linear.len()];
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..8 {
                    let src = ((z * 8 + y) * 8 + x) * 4;
                    let dst = morton3(x, y, z) * 4;
                    tiled[dst..dst + 4].copy_from_slice(&linear[src..src + 4]);
                }
            }
        }

        let mut result = vec![0u8; linear.len()];
        unswizzle_box(&tiled, 8, 8, 8, &mut result, 32, 256, 4).unwrap();
        assert_eq!(result, linear);
    }

    #[test]
    fn swizzle_unswizzle_padded_rows() {
        let mut rng = StdRng::seed_from_u64(3);
        let (width, height) = (16u32, 8u32);
        let row_pitch = 80;

        let mut linear = vec![0u8; row_pitch * height as usize];
        rng.fill(&mut linear[..]);

        let mut tiled = vec![0u8; (width * height * 4) as usize];
        swizzle_box(&linear, width, height, 1, row_pitch, 0, &mut tiled, 4).unwrap();

        let mut result = vec![0u8; linear.len()];
        unswizzle_rect(&tiled, width, height, &mut result, row_pitch, 4).unwrap();
        for y in 0..height as usize {
            let row = y * row_pitch..y * row_pitch + width as usize * 4;
            assert_eq!(result[row.clone()], linear[row]);
        }
        // Padding is never written
        assert!(result[64..80].iter().all(|&b| b == 0));
    }

    #[test]
    fn unswizzle_truncated_source() {
        let tiled = vec![0xAB; 4 * 4 * 4 - 4];
        let mut linear = vec![0; 64];
        let result = unswizzle_rect(&tiled, 4, 4, &mut linear, 16, 4);
        assert_eq!(
            result,
            Err(SwizzleError::SourceTruncated {
                offset: 60,
                needed: 4,
                actual: 60
            })
        );
        // Everything before the missing texel was copied
        assert_eq!(&linear[..4], &[0xAB; 4]);
    }

    #[test]
    fn unswizzle_non_power_of_two_needs_padded_source() {
        // x = 0b101, y = 0b010: texel (2, 1) lives at index 6
        let mut linear = vec![0; 3 * 2 * 4];
        assert!(matches!(
            unswizzle_rect(&[0; 6 * 4], 3, 2, &mut linear, 12, 4),
            Err(SwizzleError::SourceTruncated { offset: 24, .. })
        ));
        assert!(unswizzle_rect(&[0; 7 * 4], 3, 2, &mut linear, 12, 4).is_ok());
    }

    #[test]
    fn unswizzle_small_destination() {
        let tiled = vec![0; 64];
        let mut linear = vec![0; 60];
        assert!(matches!(
            unswizzle_rect(&tiled, 4, 4, &mut linear, 16, 4),
            Err(SwizzleError::DestinationTooSmall { offset: 60, .. })
        ));
    }

    #[test]
    fn unswizzle_zero_dimensions() {
        let mut linear = vec![];
        assert!(unswizzle_box(&[], 0, 4, 1, &mut linear, 0, 0, 4).is_ok());
        assert!(unswizzle_box(&[], 4, 4, 0, &mut linear, 16, 64, 4).is_ok());
    }

    #[test]
    fn nv2a_deswizzler_short_source() {
        let format = lookup_texture(0x06).unwrap();
        assert_eq!(
            Nv2aDeswizzler.deswizzle(&[0; 60], 4, 4, 1, format),
            Err(SwizzleError::SourceTruncated {
                offset: 60,
                needed: 4,
                actual: 60
            })
        );
        assert!(matches!(
            Nv2aDeswizzler.deswizzle(&[0; 64], 1 << 31, 1 << 31, 1 << 31, format),
            Err(SwizzleError::DimensionsTooLarge { .. })
        ));
    }

    #[test]
    fn nv2a_deswizzler_tight_output() {
        let format = lookup_texture(0x06).unwrap();
        let tiled: Vec<u8> = (0..16u8).flat_map(|i| [i; 4]).collect();
        let linear = Nv2aDeswizzler.deswizzle(&tiled, 4, 4, 1, format).unwrap();
        assert_eq!(linear.len(), 64);
        assert_eq!(&linear[4..8], &[1; 4]);
        assert_eq!(&linear[16..20], &[2; 4]);
    }
}
