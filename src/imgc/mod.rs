//! IMGC texture codec (`.xi`).
//!
//! ## Layout
//!
//! ```text
//! 0x00  [u8;4]  magic "IMGC"
//! 0x04  u8      pixel format tag
//! 0x05  u8      flags (bit 0 = alpha present)
//! 0x06  u16     reserved
//! 0x08  u16     width
//! 0x0A  u16     height
//! 0x0C  u32     payload size
//! 0x10  payload
//! ```
//!
//! Uncompressed formats store pixels row-major, top row first. ETC1 and
//! ETC1A4 store 4×4 blocks row-major over the block grid; see [`etc1`].

mod direct;
mod etc1;
mod format;

pub use direct::{Image, Rgba};
pub use format::PixelFormat;

use tracing::debug;

use crate::util::{to_u32, ByteReader, ByteWriter, Error, Result};

pub const IMGC_MAGIC: &[u8; 4] = b"IMGC";

/// Size of the blob header.
pub const HEADER_SIZE: usize = 0x10;

/// Parsed blob header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureHeader {
    pub format_tag: u8,
    pub has_alpha: bool,
    pub width: u16,
    pub height: u16,
    pub payload_size: u32,
}

impl TextureHeader {
    pub fn read(r: &mut ByteReader<'_>) -> Result<Self> {
        r.expect_magic(IMGC_MAGIC, "IMGC")?;
        let format_tag = r.u8()?;
        let flags = r.u8()?;
        let _reserved = r.u16()?;
        Ok(Self {
            format_tag,
            has_alpha: flags & 1 != 0,
            width: r.u16()?,
            height: r.u16()?,
            payload_size: r.u32()?,
        })
    }

    pub fn write(&self, w: &mut ByteWriter) {
        w.bytes(IMGC_MAGIC);
        w.u8(self.format_tag);
        w.u8(u8::from(self.has_alpha));
        w.u16(0);
        w.u16(self.width);
        w.u16(self.height);
        w.u32(self.payload_size);
    }
}

/// Result of [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTexture {
    pub image: Image,
    pub format: PixelFormat,
    pub has_alpha: bool,
}

/// Read only the header of a texture blob.
pub fn read_header(blob: &[u8]) -> Result<TextureHeader> {
    TextureHeader::read(&mut ByteReader::new(blob))
}

/// Decode a texture blob to RGBA8.
pub fn decode(blob: &[u8]) -> Result<DecodedTexture> {
    let mut r = ByteReader::new(blob);
    let header = TextureHeader::read(&mut r)?;
    let format = PixelFormat::from_tag(header.format_tag)?;

    let expected = format.payload_size(header.width as usize, header.height as usize);
    if header.payload_size as usize != expected {
        return Err(Error::invalid(format!(
            "{format} {}x{} payload is {} bytes, expected {expected}",
            header.width, header.height, header.payload_size
        )));
    }
    let payload = r.bytes(expected)?;

    let image = match format {
        PixelFormat::Etc1 => etc1::decode(header.width, header.height, payload, false),
        PixelFormat::Etc1A4 => etc1::decode(header.width, header.height, payload, true),
        _ => direct::decode(format, header.width, header.height, payload)?,
    };
    debug!(
        "decoded IMGC {format} {}x{} ({} bytes)",
        header.width, header.height, expected
    );
    Ok(DecodedTexture {
        image,
        format,
        has_alpha: header.has_alpha,
    })
}

/// Encode an image in the given pixel format.
pub fn encode(image: &Image, format: PixelFormat) -> Result<Vec<u8>> {
    let payload = match format {
        PixelFormat::Etc1 => etc1::encode(image, false),
        PixelFormat::Etc1A4 => etc1::encode(image, true),
        _ => direct::encode(format, image)?,
    };
    let header = TextureHeader {
        format_tag: format.tag(),
        has_alpha: format.has_alpha(),
        width: image.width(),
        height: image.height(),
        payload_size: to_u32(payload.len(), "texture payload size")?,
    };

    let mut w = ByteWriter::with_capacity(HEADER_SIZE + payload.len());
    header.write(&mut w);
    w.bytes(&payload);
    debug!(
        "encoded IMGC {format} {}x{} ({} bytes)",
        image.width(),
        image.height(),
        payload.len()
    );
    Ok(w.into_inner())
}
