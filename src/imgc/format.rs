//! Pixel format tags.

use std::fmt;
use std::str::FromStr;

use crate::util::{Error, Result};

/// Pixel formats the texture codec implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PixelFormat {
    Rgba8 = 0x00,
    Rgba4 = 0x01,
    Rgba5551 = 0x02,
    Rbgr888 = 0x03,
    Rgb565 = 0x04,
    La8 = 0x0B,
    L8 = 0x0D,
    A8 = 0x0F,
    Etc1 = 0x1B,
    Etc1A4 = 0x1C,
    L4 = 0x26,
}

impl PixelFormat {
    pub const ALL: [PixelFormat; 11] = [
        PixelFormat::Rgba8,
        PixelFormat::Rgba4,
        PixelFormat::Rgba5551,
        PixelFormat::Rbgr888,
        PixelFormat::Rgb565,
        PixelFormat::La8,
        PixelFormat::L8,
        PixelFormat::A8,
        PixelFormat::L4,
        PixelFormat::Etc1,
        PixelFormat::Etc1A4,
    ];

    /// Map a stored tag; unknown tags are an unsupported-format error.
    pub fn from_tag(tag: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.tag() == tag)
            .ok_or_else(|| Error::unsupported(format!("pixel format tag {tag:#04x}")))
    }

    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Host-facing name.
    pub const fn name(self) -> &'static str {
        match self {
            PixelFormat::Rgba8 => "RGBA8",
            PixelFormat::Rgba4 => "RGBA4",
            PixelFormat::Rgba5551 => "RGBA5551",
            PixelFormat::Rbgr888 => "RBGR888",
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::La8 => "LA8",
            PixelFormat::L8 => "L8",
            PixelFormat::A8 => "A8",
            PixelFormat::L4 => "L4",
            PixelFormat::Etc1 => "ETC1",
            PixelFormat::Etc1A4 => "ETC1A4",
        }
    }

    pub const fn bits_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 32,
            PixelFormat::Rbgr888 => 24,
            PixelFormat::Rgba4 | PixelFormat::Rgba5551 | PixelFormat::Rgb565 | PixelFormat::La8 => 16,
            PixelFormat::L8 | PixelFormat::A8 | PixelFormat::Etc1A4 => 8,
            PixelFormat::L4 | PixelFormat::Etc1 => 4,
        }
    }

    #[inline]
    pub const fn is_compressed(self) -> bool {
        matches!(self, PixelFormat::Etc1 | PixelFormat::Etc1A4)
    }

    /// Whether the format stores an alpha channel.
    pub const fn has_alpha(self) -> bool {
        matches!(
            self,
            PixelFormat::Rgba8
                | PixelFormat::Rgba4
                | PixelFormat::Rgba5551
                | PixelFormat::La8
                | PixelFormat::A8
                | PixelFormat::Etc1A4
        )
    }

    /// Payload size for a `width` × `height` image.
    pub fn payload_size(self, width: usize, height: usize) -> usize {
        match self {
            PixelFormat::Etc1 | PixelFormat::Etc1A4 => {
                let blocks = width.div_ceil(4) * height.div_ceil(4);
                blocks * if self == PixelFormat::Etc1 { 8 } else { 16 }
            }
            PixelFormat::L4 => (width * height).div_ceil(2),
            _ => width * height * self.bits_per_pixel() / 8,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PixelFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unsupported(format!("pixel format {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        for format in PixelFormat::ALL {
            assert_eq!(PixelFormat::from_tag(format.tag()).unwrap(), format);
            assert_eq!(format.name().parse::<PixelFormat>().unwrap(), format);
        }
        assert_eq!(PixelFormat::L4.tag(), 0x26);
        assert_eq!(PixelFormat::Etc1A4.tag(), 0x1C);
        let err = PixelFormat::from_tag(0x99).unwrap_err();
        assert_eq!(err.kind(), crate::util::ErrorKind::Unsupported);
        assert!("BC7".parse::<PixelFormat>().is_err());
    }

    #[test]
    fn test_payload_size() {
        assert_eq!(PixelFormat::Rgba8.payload_size(4, 4), 64);
        assert_eq!(PixelFormat::Rbgr888.payload_size(2, 2), 12);
        assert_eq!(PixelFormat::Rgb565.payload_size(3, 3), 18);
        assert_eq!(PixelFormat::L4.payload_size(2, 2), 2);
        assert_eq!(PixelFormat::L4.payload_size(3, 1), 2);
        // 5×5 rounds up to a 2×2 block grid
        assert_eq!(PixelFormat::Etc1.payload_size(5, 5), 32);
        assert_eq!(PixelFormat::Etc1A4.payload_size(8, 4), 32);
    }
}
