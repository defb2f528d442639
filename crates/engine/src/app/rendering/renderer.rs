use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::surface::{DisplaySurface, DrawCall, SurfaceError};
use super::tileset::{shade, GlyphAtlas, CELL_PX};

/// Pixel-buffer surface: a fixed `columns x rows` grid of tileset cells,
/// scaled by `pixels` to whatever size the window has.
pub struct TilesetSurface {
    pixels: Pixels<'static>,
    atlas: GlyphAtlas,
    frame_width: u32,
    frame_height: u32,
}

impl TilesetSurface {
    pub fn new(
        window: Arc<Window>,
        columns: u32,
        rows: u32,
        atlas: GlyphAtlas,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let frame_width = columns * CELL_PX;
        let frame_height = rows * CELL_PX;
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels = Pixels::new(frame_width, frame_height, surface)?;
        Ok(Self {
            pixels,
            atlas,
            frame_width,
            frame_height,
        })
    }

    /// Resizes the presentation surface only; the cell frame and its contents
    /// are kept, so a re-present is enough. Returns `false` for a zero-sized
    /// (minimized) window, which is left alone.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, SurfaceError> {
        if width == 0 || height == 0 {
            return Ok(false);
        }
        self.pixels
            .resize_surface(width, height)
            .map_err(|source| SurfaceError::Resize {
                width,
                height,
                source,
            })?;
        Ok(true)
    }
}

impl DisplaySurface for TilesetSurface {
    fn draw_cell(&mut self, call: DrawCall) {
        let frame_width = self.frame_width;
        let frame_height = self.frame_height;
        blit_cell(
            self.pixels.frame_mut(),
            frame_width,
            frame_height,
            &self.atlas,
            call,
        );
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.pixels.render().map_err(SurfaceError::Render)
    }
}

fn blit_cell(frame: &mut [u8], width: u32, height: u32, atlas: &GlyphAtlas, call: DrawCall) {
    let left = call.column.saturating_mul(CELL_PX);
    let top = call.row.saturating_mul(CELL_PX);
    if left >= width || top >= height {
        return;
    }
    let row_bytes = width as usize * 4;
    for y in 0..CELL_PX.min(height - top) {
        let row_offset = (top + y) as usize * row_bytes;
        for x in 0..CELL_PX.min(width - left) {
            let offset = row_offset + (left + x) as usize * 4;
            let Some(pixel) = frame.get_mut(offset..offset + 4) else {
                return;
            };
            pixel.copy_from_slice(&shade(atlas.texel(call.glyph, x, y), call.fg, call.bg));
        }
    }
}
