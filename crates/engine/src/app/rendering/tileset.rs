use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::warn;

use crate::world::Rgb;

/// Side of one glyph cell in pixels.
pub const CELL_PX: u32 = 16;
const GLYPHS_PER_ROW: u32 = 16;
const ATLAS_PX: u32 = CELL_PX * GLYPHS_PER_ROW;

const FONT_WIDTH: u32 = 3;
const FONT_HEIGHT: u32 = 5;
const FONT_SCALE: u32 = 3;
const FONT_LEFT: u32 = (CELL_PX - FONT_WIDTH * FONT_SCALE) / 2;
const FONT_TOP: u32 = (CELL_PX - FONT_HEIGHT * FONT_SCALE) / 2;
const FULL_BLOCK: u8 = 0xDB;

// Rows for '!'..='~', three bits per row, most significant bit leftmost.
const FONT_ROWS: [[u8; FONT_HEIGHT as usize]; 94] = [
    [0b010, 0b010, 0b010, 0b000, 0b010],
    [0b101, 0b101, 0b000, 0b000, 0b000],
    [0b101, 0b111, 0b101, 0b111, 0b101],
    [0b111, 0b110, 0b111, 0b011, 0b111],
    [0b101, 0b001, 0b010, 0b100, 0b101],
    [0b010, 0b101, 0b010, 0b101, 0b011],
    [0b010, 0b010, 0b000, 0b000, 0b000],
    [0b001, 0b010, 0b010, 0b010, 0b001],
    [0b100, 0b010, 0b010, 0b010, 0b100],
    [0b000, 0b101, 0b010, 0b101, 0b000],
    [0b000, 0b010, 0b111, 0b010, 0b000],
    [0b000, 0b000, 0b000, 0b010, 0b100],
    [0b000, 0b000, 0b111, 0b000, 0b000],
    [0b000, 0b000, 0b000, 0b000, 0b010],
    [0b001, 0b001, 0b010, 0b100, 0b100],
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
    [0b000, 0b010, 0b000, 0b010, 0b000],
    [0b000, 0b010, 0b000, 0b010, 0b100],
    [0b001, 0b010, 0b100, 0b010, 0b001],
    [0b000, 0b111, 0b000, 0b111, 0b000],
    [0b100, 0b010, 0b001, 0b010, 0b100],
    [0b111, 0b001, 0b011, 0b000, 0b010],
    [0b111, 0b101, 0b111, 0b100, 0b111],
    [0b010, 0b101, 0b111, 0b101, 0b101],
    [0b110, 0b101, 0b110, 0b101, 0b110],
    [0b111, 0b100, 0b100, 0b100, 0b111],
    [0b110, 0b101, 0b101, 0b101, 0b110],
    [0b111, 0b100, 0b110, 0b100, 0b111],
    [0b111, 0b100, 0b110, 0b100, 0b100],
    [0b111, 0b100, 0b101, 0b101, 0b111],
    [0b101, 0b101, 0b111, 0b101, 0b101],
    [0b111, 0b010, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b001, 0b101, 0b111],
    [0b101, 0b101, 0b110, 0b101, 0b101],
    [0b100, 0b100, 0b100, 0b100, 0b111],
    [0b101, 0b111, 0b111, 0b101, 0b101],
    [0b101, 0b111, 0b111, 0b111, 0b101],
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b110, 0b101, 0b110, 0b100, 0b100],
    [0b111, 0b101, 0b101, 0b111, 0b001],
    [0b110, 0b101, 0b110, 0b101, 0b101],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b010, 0b010, 0b010, 0b010],
    [0b101, 0b101, 0b101, 0b101, 0b111],
    [0b101, 0b101, 0b101, 0b101, 0b010],
    [0b101, 0b101, 0b111, 0b111, 0b101],
    [0b101, 0b101, 0b010, 0b101, 0b101],
    [0b101, 0b101, 0b010, 0b010, 0b010],
    [0b111, 0b001, 0b010, 0b100, 0b111],
    [0b110, 0b100, 0b100, 0b100, 0b110],
    [0b100, 0b100, 0b010, 0b001, 0b001],
    [0b011, 0b001, 0b001, 0b001, 0b011],
    [0b010, 0b101, 0b000, 0b000, 0b000],
    [0b000, 0b000, 0b000, 0b000, 0b111],
    [0b100, 0b010, 0b000, 0b000, 0b000],
    [0b000, 0b111, 0b001, 0b111, 0b111],
    [0b100, 0b100, 0b110, 0b101, 0b110],
    [0b000, 0b111, 0b100, 0b100, 0b111],
    [0b001, 0b001, 0b111, 0b101, 0b111],
    [0b000, 0b111, 0b110, 0b100, 0b111],
    [0b011, 0b100, 0b110, 0b100, 0b100],
    [0b000, 0b111, 0b101, 0b111, 0b001],
    [0b100, 0b100, 0b110, 0b101, 0b101],
    [0b010, 0b000, 0b010, 0b010, 0b010],
    [0b001, 0b000, 0b001, 0b101, 0b010],
    [0b100, 0b101, 0b110, 0b101, 0b101],
    [0b100, 0b100, 0b100, 0b100, 0b111],
    [0b000, 0b110, 0b111, 0b101, 0b101],
    [0b000, 0b110, 0b101, 0b101, 0b101],
    [0b000, 0b111, 0b101, 0b101, 0b111],
    [0b000, 0b110, 0b101, 0b110, 0b100],
    [0b000, 0b111, 0b101, 0b111, 0b001],
    [0b000, 0b110, 0b101, 0b100, 0b100],
    [0b000, 0b111, 0b110, 0b001, 0b111],
    [0b010, 0b111, 0b010, 0b010, 0b011],
    [0b000, 0b101, 0b101, 0b101, 0b111],
    [0b000, 0b101, 0b101, 0b101, 0b010],
    [0b000, 0b101, 0b101, 0b111, 0b010],
    [0b000, 0b101, 0b010, 0b010, 0b101],
    [0b000, 0b101, 0b101, 0b111, 0b001],
    [0b000, 0b111, 0b001, 0b010, 0b111],
    [0b011, 0b010, 0b110, 0b010, 0b011],
    [0b010, 0b010, 0b010, 0b010, 0b010],
    [0b110, 0b010, 0b011, 0b010, 0b110],
    [0b000, 0b011, 0b110, 0b000, 0b000],
];

#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("failed to open tileset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode tileset {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("tileset {path} is {width}x{height}; expected {expected}x{expected}")]
    Dimensions {
        path: PathBuf,
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// 16x16 grid of 16x16-pixel glyphs in RGBA, indexed by glyph code.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    rgba: Vec<u8>,
}

impl GlyphAtlas {
    pub fn load(path: &Path) -> Result<Self, TilesetError> {
        let decoded = ImageReader::open(path)
            .map_err(|source| TilesetError::Open {
                path: path.to_path_buf(),
                source,
            })?
            .decode()
            .map_err(|source| TilesetError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        let image = decoded.to_rgba8();
        if image.width() != ATLAS_PX || image.height() != ATLAS_PX {
            return Err(TilesetError::Dimensions {
                path: path.to_path_buf(),
                width: image.width(),
                height: image.height(),
                expected: ATLAS_PX,
            });
        }
        Ok(Self {
            rgba: image.into_raw(),
        })
    }

    /// Loads the tileset, or falls back to the built-in atlas with a warning.
    pub fn load_or_fallback(path: &Path) -> Self {
        match Self::load(path) {
            Ok(atlas) => atlas,
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "tileset_load_failed_using_fallback"
                );
                Self::fallback()
            }
        }
    }

    /// Built-in atlas: printable ASCII from a scaled 3x5 font, plus a solid
    /// full block at 0xDB. Every other code is blank.
    pub fn fallback() -> Self {
        let mut rgba = vec![0u8; (ATLAS_PX * ATLAS_PX * 4) as usize];
        for code in b'!'..=b'~' {
            let rows = FONT_ROWS[(code - b'!') as usize];
            for (font_y, bits) in rows.iter().enumerate() {
                for font_x in 0..FONT_WIDTH {
                    if bits & (1 << (FONT_WIDTH - 1 - font_x)) == 0 {
                        continue;
                    }
                    for sy in 0..FONT_SCALE {
                        for sx in 0..FONT_SCALE {
                            let x = FONT_LEFT + font_x * FONT_SCALE + sx;
                            let y = FONT_TOP + font_y as u32 * FONT_SCALE + sy;
                            set_opaque(&mut rgba, code, x, y);
                        }
                    }
                }
            }
        }
        for y in 0..CELL_PX {
            for x in 0..CELL_PX {
                set_opaque(&mut rgba, FULL_BLOCK, x, y);
            }
        }
        Self { rgba }
    }

    /// RGBA texel at pixel (`x`, `y`) inside glyph `code`.
    pub fn texel(&self, code: u8, x: u32, y: u32) -> [u8; 4] {
        let offset = texel_offset(code, x % CELL_PX, y % CELL_PX);
        [
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
            self.rgba[offset + 3],
        ]
    }
}

fn texel_offset(code: u8, x: u32, y: u32) -> usize {
    let atlas_x = (code as u32 % GLYPHS_PER_ROW) * CELL_PX + x;
    let atlas_y = (code as u32 / GLYPHS_PER_ROW) * CELL_PX + y;
    ((atlas_y * ATLAS_PX + atlas_x) * 4) as usize
}

fn set_opaque(rgba: &mut [u8], code: u8, x: u32, y: u32) {
    let offset = texel_offset(code, x, y);
    rgba[offset..offset + 4].copy_from_slice(&[255, 255, 255, 255]);
}

/// Glyph texel tinted by `fg` and alpha-blended over `bg`.
pub fn shade(texel: [u8; 4], fg: Rgb, bg: Rgb) -> [u8; 4] {
    let alpha = u32::from(texel[3]);
    let channel = |texel: u8, fg: u8, bg: u8| -> u8 {
        let tinted = u32::from(texel) * u32::from(fg) / 255;
        ((tinted * alpha + u32::from(bg) * (255 - alpha)) / 255) as u8
    };
    [
        channel(texel[0], fg.r, bg.r),
        channel(texel[1], fg.g, bg.g),
        channel(texel[2], fg.b, bg.b),
        255,
    ]
}
