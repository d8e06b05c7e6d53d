//! RGBA image model and the uncompressed pixel formats.

use byteorder::{ByteOrder, LittleEndian};
use bytemuck::{Pod, Zeroable};

use super::format::PixelFormat;
use crate::util::{Error, Result};

/// One RGBA8 pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn gray(l: u8) -> Self {
        Self::new(l, l, l, 255)
    }

    /// Rec. 601 luma in 8.8 fixed point; exact for gray pixels.
    #[inline]
    pub fn luminance(self) -> u8 {
        ((self.r as u32 * 77 + self.g as u32 * 150 + self.b as u32 * 29 + 128) >> 8) as u8
    }
}

/// Decoded image, row-major with the top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u16,
    height: u16,
    pixels: Vec<Rgba>,
}

impl Image {
    pub fn new(width: u16, height: u16, pixels: Vec<Rgba>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::invalid(format!(
                "image {width}x{height} needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-color image.
    pub fn filled(width: u16, height: u16, color: Rgba) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width as usize * height as usize],
        }
    }

    /// Wrap tightly packed RGBA8 bytes.
    pub fn from_rgba8(width: u16, height: u16, bytes: &[u8]) -> Result<Self> {
        let pixels: &[Rgba] = bytemuck::try_cast_slice(bytes)
            .map_err(|e| Error::invalid(format!("RGBA8 buffer: {e}")))?;
        Self::new(width, height, pixels.to_vec())
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Pixel at (x, y), `None` when out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }
        Some(self.pixels[y * self.width as usize + x])
    }

    /// Pixel with coordinates clamped to the image edge.
    #[inline]
    pub(crate) fn pixel_clamped(&self, x: usize, y: usize) -> Rgba {
        let x = x.min(self.width as usize - 1);
        let y = y.min(self.height as usize - 1);
        self.pixels[y * self.width as usize + x]
    }

    #[inline]
    pub(crate) fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        let w = self.width as usize;
        self.pixels[y * w + x] = color;
    }

    /// Raw RGBA8 bytes.
    pub fn as_rgba8(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    #[cfg(feature = "png")]
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.as_rgba8().to_vec())
    }
}

// ----------------------------------------------------------------------------
// Channel quantization
// ----------------------------------------------------------------------------

/// Expand an n-bit channel to 8 bits by bit replication.
#[inline]
pub(crate) fn expand(value: u32, bits: u32) -> u8 {
    let v = value << (8 - bits);
    (v | (v >> bits)) as u8
}

/// Nearest n-bit level for an 8-bit channel.
#[inline]
pub(crate) fn quantize(value: u8, bits: u32) -> u32 {
    let max = (1u32 << bits) - 1;
    (value as u32 * max + 127) / 255
}

// ----------------------------------------------------------------------------
// Decode / encode
// ----------------------------------------------------------------------------

/// Decode an uncompressed payload; its size has already been checked.
pub(crate) fn decode(format: PixelFormat, width: u16, height: u16, payload: &[u8]) -> Result<Image> {
    let count = width as usize * height as usize;
    let pixels: Vec<Rgba> = match format {
        PixelFormat::Rgba8 => bytemuck::cast_slice::<u8, Rgba>(payload).to_vec(),
        PixelFormat::Rbgr888 => payload
            .chunks_exact(3)
            .map(|p| Rgba::new(p[2], p[1], p[0], 255))
            .collect(),
        PixelFormat::Rgba4 => words(payload)
            .map(|v| {
                Rgba::new(
                    expand(v >> 12 & 0xF, 4),
                    expand(v >> 8 & 0xF, 4),
                    expand(v >> 4 & 0xF, 4),
                    expand(v & 0xF, 4),
                )
            })
            .collect(),
        PixelFormat::Rgba5551 => words(payload)
            .map(|v| {
                Rgba::new(
                    expand(v >> 11 & 0x1F, 5),
                    expand(v >> 6 & 0x1F, 5),
                    expand(v >> 1 & 0x1F, 5),
                    if v & 1 != 0 { 255 } else { 0 },
                )
            })
            .collect(),
        PixelFormat::Rgb565 => words(payload)
            .map(|v| {
                Rgba::new(
                    expand(v >> 11 & 0x1F, 5),
                    expand(v >> 5 & 0x3F, 6),
                    expand(v & 0x1F, 5),
                    255,
                )
            })
            .collect(),
        PixelFormat::La8 => payload
            .chunks_exact(2)
            .map(|p| Rgba::new(p[1], p[1], p[1], p[0]))
            .collect(),
        PixelFormat::L8 => payload.iter().map(|&l| Rgba::gray(l)).collect(),
        PixelFormat::A8 => payload.iter().map(|&a| Rgba::new(255, 255, 255, a)).collect(),
        PixelFormat::L4 => payload
            .iter()
            .flat_map(|&b| [b & 0xF, b >> 4])
            .take(count)
            .map(|n| Rgba::gray(n * 17))
            .collect(),
        PixelFormat::Etc1 | PixelFormat::Etc1A4 => {
            return Err(Error::invalid(format!("{format} is not a direct format")));
        }
    };
    Image::new(width, height, pixels)
}

fn words(payload: &[u8]) -> impl Iterator<Item = u32> + '_ {
    payload
        .chunks_exact(2)
        .map(|p| LittleEndian::read_u16(p) as u32)
}

/// Encode into an uncompressed payload.
pub(crate) fn encode(format: PixelFormat, image: &Image) -> Result<Vec<u8>> {
    let pixels = image.pixels();
    let mut out = Vec::with_capacity(format.payload_size(image.width() as usize, image.height() as usize));
    fn push_word(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&(v as u16).to_le_bytes());
    }

    match format {
        PixelFormat::Rgba8 => out.extend_from_slice(image.as_rgba8()),
        PixelFormat::Rbgr888 => {
            for p in pixels {
                out.extend_from_slice(&[p.b, p.g, p.r]);
            }
        }
        PixelFormat::Rgba4 => {
            for p in pixels {
                let v = quantize(p.r, 4) << 12
                    | quantize(p.g, 4) << 8
                    | quantize(p.b, 4) << 4
                    | quantize(p.a, 4);
                push_word(&mut out, v);
            }
        }
        PixelFormat::Rgba5551 => {
            for p in pixels {
                let v = quantize(p.r, 5) << 11
                    | quantize(p.g, 5) << 6
                    | quantize(p.b, 5) << 1
                    | u32::from(p.a >= 128);
                push_word(&mut out, v);
            }
        }
        PixelFormat::Rgb565 => {
            for p in pixels {
                let v = quantize(p.r, 5) << 11 | quantize(p.g, 6) << 5 | quantize(p.b, 5);
                push_word(&mut out, v);
            }
        }
        PixelFormat::La8 => {
            for p in pixels {
                out.extend_from_slice(&[p.a, p.luminance()]);
            }
        }
        PixelFormat::L8 => out.extend(pixels.iter().map(|p| p.luminance())),
        PixelFormat::A8 => out.extend(pixels.iter().map(|p| p.a)),
        PixelFormat::L4 => {
            for pair in pixels.chunks(2) {
                let lo = quantize(pair[0].luminance(), 4) as u8;
                let hi = pair.get(1).map_or(0, |p| quantize(p.luminance(), 4) as u8);
                out.push(lo | hi << 4);
            }
        }
        PixelFormat::Etc1 | PixelFormat::Etc1A4 => {
            return Err(Error::invalid(format!("{format} is not a direct format")));
        }
    }
    Ok(out)
}
