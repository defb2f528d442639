use thiserror::Error;

use crate::world::Rgb;

/// One cell redraw: background fill plus the glyph modulated by `fg`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    pub column: u32,
    pub row: u32,
    pub glyph: u8,
    pub fg: Rgb,
    pub bg: Rgb,
}

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("failed to present frame: {0}")]
    Render(#[source] pixels::Error),
    #[error("failed to resize surface to {width}x{height}: {source}")]
    Resize {
        width: u32,
        height: u32,
        #[source]
        source: pixels::TextureError,
    },
}

/// Backend that turns cell draw calls into pixels on screen.
pub trait DisplaySurface {
    fn draw_cell(&mut self, call: DrawCall);

    fn present(&mut self) -> Result<(), SurfaceError>;
}

/// Headless surface that keeps every draw call it receives.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
    presents: u64,
}

impl RecordingSurface {
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }

    pub fn take_calls(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }
}

impl DisplaySurface for RecordingSurface {
    fn draw_cell(&mut self, call: DrawCall) {
        self.calls.push(call);
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        self.presents = self.presents.saturating_add(1);
        Ok(())
    }
}
