mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;
mod session;

pub use input::{InputAction, Intent};
pub use loop_runner::{run_app, AppError, LoopConfig, DEFAULT_TILESET_FILE};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    draw_log_panel, layout_panel, shade, wrap_message, CellRect, DisplaySurface, DrawCall,
    FrameRenderer, FrameStats, GlyphAtlas, LayoutError, MessageLog, RecordingSurface,
    ScreenBuffer, ScreenLayout, SurfaceError, TilesetError, TilesetSurface, Viewport, CELL_PX,
    MIN_PANEL_WIDTH,
};
pub use scene::{Scene, SceneError};
pub use session::{Session, TurnReport};
