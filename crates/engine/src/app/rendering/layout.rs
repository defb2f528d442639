use thiserror::Error;

/// Narrowest message panel that still shows a readable line.
pub const MIN_PANEL_WIDTH: u32 = 8;
const MARGIN: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRect {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl CellRect {
    pub fn contains(&self, column: u32, row: u32) -> bool {
        column >= self.left
            && row >= self.top
            && column - self.left < self.width
            && row - self.top < self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("screen must be at least 1x1 cells, got {width}x{height}")]
    EmptyScreen { width: u32, height: u32 },
    #[error("viewport needs {needed} rows but the screen has {available}")]
    ViewportTooTall { needed: u64, available: u32 },
    #[error("message panel would be {available} columns wide; at least {minimum} are required")]
    PanelTooNarrow { available: u64, minimum: u32 },
}

/// Screen split into the gameplay viewport (left, vertically centered) and
/// the message panel filling the columns to its right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub screen_width: u32,
    pub screen_height: u32,
    pub view_half_width: u32,
    pub view_half_height: u32,
    pub view: CellRect,
    pub panel: CellRect,
}

impl ScreenLayout {
    pub fn new(
        screen_width: u32,
        screen_height: u32,
        view_half_width: u32,
        view_half_height: u32,
    ) -> Result<Self, LayoutError> {
        if screen_width == 0 || screen_height == 0 {
            return Err(LayoutError::EmptyScreen {
                width: screen_width,
                height: screen_height,
            });
        }

        let view_width = u64::from(view_half_width) * 2 + 1;
        let view_height = u64::from(view_half_height) * 2 + 1;
        if view_height > u64::from(screen_height) {
            return Err(LayoutError::ViewportTooTall {
                needed: view_height,
                available: screen_height,
            });
        }

        let panel_left = u64::from(MARGIN) * 2 + view_width;
        let panel_width = u64::from(screen_width).saturating_sub(panel_left + u64::from(MARGIN));
        if panel_width < u64::from(MIN_PANEL_WIDTH) {
            return Err(LayoutError::PanelTooNarrow {
                available: panel_width,
                minimum: MIN_PANEL_WIDTH,
            });
        }

        // Every value below is bounded by the screen size checked above.
        let view_width = view_width as u32;
        let view_height = view_height as u32;
        Ok(Self {
            screen_width,
            screen_height,
            view_half_width,
            view_half_height,
            view: CellRect {
                left: MARGIN,
                top: (screen_height - view_height) / 2,
                width: view_width,
                height: view_height,
            },
            panel: CellRect {
                left: panel_left as u32,
                top: MARGIN.min(screen_height - 1),
                width: panel_width as u32,
                height: screen_height.saturating_sub(MARGIN * 2).max(1),
            },
        })
    }
}
