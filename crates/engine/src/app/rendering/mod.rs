mod frame;
mod layout;
mod log_panel;
mod renderer;
mod screen_buffer;
mod surface;
mod tileset;
mod transform;

pub use frame::{FrameRenderer, FrameStats};
pub use layout::{CellRect, LayoutError, ScreenLayout, MIN_PANEL_WIDTH};
pub use log_panel::{draw_log_panel, layout_panel, wrap_message, MessageLog};
pub use renderer::TilesetSurface;
pub use screen_buffer::ScreenBuffer;
pub use surface::{DisplaySurface, DrawCall, RecordingSurface, SurfaceError};
pub use tileset::{shade, GlyphAtlas, TilesetError, CELL_PX};
pub use transform::Viewport;
