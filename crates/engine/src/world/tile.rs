use serde::Deserialize;

use super::entity::EntityHandle;

/// 16-entry palette index. The numeric values are the 4-bit fields packed
/// into [`Glyph::color`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    Black = 0x0,
    Blue = 0x1,
    Green = 0x2,
    Cyan = 0x3,
    Red = 0x4,
    Magenta = 0x5,
    Brown = 0x6,
    LightGray = 0x7,
    DarkGray = 0x8,
    LightBlue = 0x9,
    LightGreen = 0xA,
    LightCyan = 0xB,
    LightRed = 0xC,
    LightMagenta = 0xD,
    Yellow = 0xE,
    White = 0xF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

/// Static color table resolving palette indices, after DF Lee's colour scheme v2.
pub const PALETTE: [Rgb; 16] = [
    rgb(21, 19, 15),
    rgb(45, 90, 160),
    rgb(80, 135, 20),
    rgb(25, 140, 140),
    rgb(160, 20, 10),
    rgb(135, 60, 130),
    rgb(150, 75, 55),
    rgb(178, 175, 172),
    rgb(116, 110, 113),
    rgb(105, 135, 225),
    rgb(125, 185, 55),
    rgb(60, 205, 190),
    rgb(220, 50, 20),
    rgb(190, 110, 185),
    rgb(230, 170, 30),
    rgb(232, 227, 232),
];

pub fn palette_rgb(index: u8) -> Rgb {
    PALETTE[(index & 0x0f) as usize]
}

/// What a single screen cell shows: a tileset glyph and a packed color byte
/// (foreground in the high nibble, background in the low nibble).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Glyph {
    pub glyph: u8,
    pub color: u8,
}

impl Glyph {
    pub const BLANK: Self = Self { glyph: 0, color: 0 };

    pub const fn new(glyph: u8, fg: Color, bg: Color) -> Self {
        Self {
            glyph,
            color: ((fg as u8) << 4) | bg as u8,
        }
    }

    pub const fn fg(self) -> u8 {
        self.color >> 4
    }

    pub const fn bg(self) -> u8 {
        self.color & 0x0f
    }
}

/// One map position: display glyph, passability and the occupying entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapTile {
    pub glyph: Glyph,
    pub passable: bool,
    pub occupant: EntityHandle,
}

impl MapTile {
    pub const fn terrain(glyph: Glyph, passable: bool) -> Self {
        Self {
            glyph,
            passable,
            occupant: EntityHandle::NONE,
        }
    }

    pub fn is_occupied(&self) -> bool {
        !self.occupant.is_none()
    }
}

/// Impassable tile injected outside a bordered world.
pub const BORDER_TILE: MapTile =
    MapTile::terrain(Glyph::new(0xDB, Color::White, Color::Black), false);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    Grass,
    Ground,
    Rock,
}

impl TerrainKind {
    pub const fn tile(self) -> MapTile {
        match self {
            TerrainKind::Grass => {
                MapTile::terrain(Glyph::new(b'"', Color::Green, Color::Black), true)
            }
            TerrainKind::Ground => {
                MapTile::terrain(Glyph::new(b'.', Color::Brown, Color::Black), true)
            }
            TerrainKind::Rock => {
                MapTile::terrain(Glyph::new(b'#', Color::DarkGray, Color::Black), false)
            }
        }
    }
}
