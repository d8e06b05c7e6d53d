//! ETC1 and ETC1A4 block codec.
//!
//! Blocks cover 4×4 pixels and are laid out row-major over the block grid.
//! Each color block is the standard 64-bit ETC1 word stored little-endian:
//!
//! ```text
//! 63..40  base colors (individual: 2 × RGB444, differential: RGB555 + dRGB333)
//! 39..37  modifier table, sub-block 1
//! 36..34  modifier table, sub-block 2
//! 33      differential flag
//! 32      flip flag (0: 2×4 side by side, 1: 4×2 stacked)
//! 31..16  modifier index MSBs, pixel i = x * 4 + y
//! 15..0   modifier index LSBs
//! ```
//!
//! ETC1A4 prefixes every color block with a 64-bit alpha block holding one
//! 4-bit alpha per pixel at bit `4 * (x * 4 + y)`.

use byteorder::{ByteOrder, LittleEndian};

use super::direct::{expand, quantize, Image, Rgba};

const MODIFIERS: [[i32; 2]; 8] = [
    [2, 8],
    [5, 17],
    [9, 29],
    [13, 42],
    [18, 60],
    [24, 80],
    [33, 106],
    [47, 183],
];

const BLOCK_PIXELS: usize = 16;

/// Block grid dimensions for an image.
#[inline]
fn grid(width: u16, height: u16) -> (usize, usize) {
    ((width as usize).div_ceil(4), (height as usize).div_ceil(4))
}

/// Signed modifier for a 2-bit pixel index.
#[inline]
fn modifier(table: usize, index: u32) -> i32 {
    let [a, b] = MODIFIERS[table];
    match index {
        0 => a,
        1 => b,
        2 => -a,
        _ => -b,
    }
}

#[inline]
fn apply(base: [i32; 3], delta: i32) -> [i32; 3] {
    base.map(|c| (c + delta).clamp(0, 255))
}

/// Sign-extend a 3-bit two's complement delta.
#[inline]
fn delta3(bits: u64) -> i32 {
    ((bits as i32 & 7) << 29) >> 29
}

#[inline]
fn in_first_subblock(flip: bool, x: usize, y: usize) -> bool {
    if flip {
        y < 2
    } else {
        x < 2
    }
}

// ----------------------------------------------------------------------------
// Decode
// ----------------------------------------------------------------------------

/// Decode one color block into 16 pixels indexed `x * 4 + y`.
fn decode_block(word: u64) -> [[u8; 3]; BLOCK_PIXELS] {
    let diff = word >> 33 & 1 != 0;
    let flip = word >> 32 & 1 != 0;
    let tables = [(word >> 37 & 7) as usize, (word >> 34 & 7) as usize];

    let bases: [[i32; 3]; 2] = if diff {
        let base = [word >> 59 & 0x1F, word >> 51 & 0x1F, word >> 43 & 0x1F];
        let delta = [delta3(word >> 56), delta3(word >> 48), delta3(word >> 40)];
        let first = base.map(|c| expand(c as u32, 5) as i32);
        let mut second = [0i32; 3];
        for c in 0..3 {
            let level = (base[c] as i32 + delta[c]).clamp(0, 31);
            second[c] = expand(level as u32, 5) as i32;
        }
        [first, second]
    } else {
        let nibble = |shift: u32| expand((word >> shift & 0xF) as u32, 4) as i32;
        [
            [nibble(60), nibble(52), nibble(44)],
            [nibble(56), nibble(48), nibble(40)],
        ]
    };

    let mut out = [[0u8; 3]; BLOCK_PIXELS];
    for x in 0..4 {
        for y in 0..4 {
            let i = x * 4 + y;
            let sub = usize::from(!in_first_subblock(flip, x, y));
            let index = ((word >> (16 + i) & 1) << 1 | (word >> i & 1)) as u32;
            let rgb = apply(bases[sub], modifier(tables[sub], index));
            out[i] = rgb.map(|c| c as u8);
        }
    }
    out
}

/// Decode an ETC1 or ETC1A4 payload; its size has already been checked.
pub(crate) fn decode(width: u16, height: u16, payload: &[u8], with_alpha: bool) -> Image {
    let (bw, bh) = grid(width, height);
    let stride = if with_alpha { 16 } else { 8 };
    let mut image = Image::filled(width, height, Rgba::WHITE);

    for (n, block) in payload.chunks_exact(stride).take(bw * bh).enumerate() {
        let (bx, by) = (n % bw, n / bw);
        let (alpha, color) = if with_alpha {
            (Some(LittleEndian::read_u64(&block[..8])), LittleEndian::read_u64(&block[8..]))
        } else {
            (None, LittleEndian::read_u64(block))
        };
        let rgb = decode_block(color);

        for x in 0..4 {
            for y in 0..4 {
                let (px, py) = (bx * 4 + x, by * 4 + y);
                if px >= width as usize || py >= height as usize {
                    continue;
                }
                let i = x * 4 + y;
                let a = alpha.map_or(255, |bits| (bits >> (4 * i) & 0xF) as u8 * 17);
                let [r, g, b] = rgb[i];
                image.set_pixel(px, py, Rgba::new(r, g, b, a));
            }
        }
    }
    image
}

// ----------------------------------------------------------------------------
// Encode
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct SubBlockFit {
    table: usize,
    indices: [u32; BLOCK_PIXELS],
    error: u64,
}

/// Best modifier table and per-pixel indices for one sub-block.
fn fit_subblock(
    pixels: &[[i32; 3]; BLOCK_PIXELS],
    base: [i32; 3],
    member: impl Fn(usize) -> bool,
) -> SubBlockFit {
    let mut best = SubBlockFit {
        table: 0,
        indices: [0; BLOCK_PIXELS],
        error: u64::MAX,
    };
    for table in 0..MODIFIERS.len() {
        let mut fit = SubBlockFit {
            table,
            indices: [0; BLOCK_PIXELS],
            error: 0,
        };
        for (i, px) in pixels.iter().enumerate().filter(|(i, _)| member(*i)) {
            let (index, error) = (0..4u32)
                .map(|index| {
                    let c = apply(base, modifier(table, index));
                    let error: i32 = (0..3).map(|k| (c[k] - px[k]).pow(2)).sum();
                    (index, error as u64)
                })
                .min_by_key(|&(_, error)| error)
                .unwrap_or((0, 0));
            fit.indices[i] = index;
            fit.error += error;
        }
        if fit.error < best.error {
            best = fit;
        }
    }
    best
}

fn average(pixels: &[[i32; 3]; BLOCK_PIXELS], member: impl Fn(usize) -> bool) -> [u8; 3] {
    let mut sum = [0i32; 3];
    for px in pixels.iter().enumerate().filter(|(i, _)| member(*i)).map(|(_, p)| p) {
        for k in 0..3 {
            sum[k] += px[k];
        }
    }
    // Each sub-block holds 8 pixels
    sum.map(|s| ((s + 4) / 8) as u8)
}

/// Encode 16 pixels indexed `x * 4 + y` into an ETC1 word.
fn encode_block(pixels: &[[i32; 3]; BLOCK_PIXELS]) -> u64 {
    let mut best: Option<(u64, u64)> = None;

    for flip in [false, true] {
        let first = |i: usize| in_first_subblock(flip, i / 4, i % 4);
        let second = |i: usize| !in_first_subblock(flip, i / 4, i % 4);
        let averages = [average(pixels, first), average(pixels, second)];

        for diff in [false, true] {
            let (bases, color_bits) = if diff {
                let q1 = averages[0].map(|c| quantize(c, 5) as i32);
                let q2 = averages[1].map(|c| quantize(c, 5) as i32);
                let delta = [0, 1, 2].map(|k| (q2[k] - q1[k]).clamp(-4, 3));
                let bases = [
                    q1.map(|q| expand(q as u32, 5) as i32),
                    [0, 1, 2].map(|k| expand((q1[k] + delta[k]) as u32, 5) as i32),
                ];
                let mut bits = 0u64;
                for (k, shift) in [59u32, 51, 43].into_iter().enumerate() {
                    bits |= (q1[k] as u64) << shift;
                    bits |= ((delta[k] & 7) as u64) << (shift - 3);
                }
                (bases, bits)
            } else {
                let q1 = averages[0].map(|c| quantize(c, 4));
                let q2 = averages[1].map(|c| quantize(c, 4));
                let bases = [
                    q1.map(|q| expand(q, 4) as i32),
                    q2.map(|q| expand(q, 4) as i32),
                ];
                let mut bits = 0u64;
                for (k, shift) in [60u32, 52, 44].into_iter().enumerate() {
                    bits |= (q1[k] as u64) << shift;
                    bits |= (q2[k] as u64) << (shift - 4);
                }
                (bases, bits)
            };

            let fits = [
                fit_subblock(pixels, bases[0], first),
                fit_subblock(pixels, bases[1], second),
            ];
            let error = fits[0].error + fits[1].error;
            if best.is_some_and(|(best_error, _)| best_error <= error) {
                continue;
            }

            let mut word = color_bits
                | (fits[0].table as u64) << 37
                | (fits[1].table as u64) << 34
                | u64::from(diff) << 33
                | u64::from(flip) << 32;
            for i in 0..BLOCK_PIXELS {
                let sub = usize::from(!first(i));
                let index = fits[sub].indices[i] as u64;
                word |= (index >> 1) << (16 + i) | (index & 1) << i;
            }
            best = Some((error, word));
        }
    }
    best.map_or(0, |(_, word)| word)
}

/// Encode an image to ETC1 or ETC1A4 blocks.
pub(crate) fn encode(image: &Image, with_alpha: bool) -> Vec<u8> {
    let (bw, bh) = grid(image.width(), image.height());
    let stride = if with_alpha { 16 } else { 8 };
    let mut out = Vec::with_capacity(bw * bh * stride);
    if image.width() == 0 || image.height() == 0 {
        return out;
    }

    let mut colors = [[0i32; 3]; BLOCK_PIXELS];
    for by in 0..bh {
        for bx in 0..bw {
            let mut alpha = 0u64;
            for x in 0..4 {
                for y in 0..4 {
                    let i = x * 4 + y;
                    let p = image.pixel_clamped(bx * 4 + x, by * 4 + y);
                    colors[i] = [p.r as i32, p.g as i32, p.b as i32];
                    alpha |= (quantize(p.a, 4) as u64) << (4 * i);
                }
            }
            if with_alpha {
                out.extend_from_slice(&alpha.to_le_bytes());
            }
            out.extend_from_slice(&encode_block(&colors).to_le_bytes());
        }
    }
    out
}
