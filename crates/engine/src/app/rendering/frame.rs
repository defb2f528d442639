use crate::world::{Position, World};

use super::layout::ScreenLayout;
use super::log_panel::{draw_log_panel, MessageLog};
use super::screen_buffer::ScreenBuffer;
use super::surface::{DisplaySurface, SurfaceError};
use super::transform::Viewport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub cells_changed: usize,
    pub cells_drawn: usize,
    pub presented: bool,
}

/// Owns the screen buffer and turns world state into the minimal set of
/// surface draw calls each frame.
#[derive(Debug)]
pub struct FrameRenderer {
    layout: ScreenLayout,
    buffer: ScreenBuffer,
    present_pending: bool,
}

impl FrameRenderer {
    pub fn new(layout: ScreenLayout) -> Self {
        Self {
            buffer: ScreenBuffer::new(layout.screen_width, layout.screen_height),
            layout,
            present_pending: false,
        }
    }

    pub fn layout(&self) -> &ScreenLayout {
        &self.layout
    }

    pub fn buffer(&self) -> &ScreenBuffer {
        &self.buffer
    }

    pub fn viewport_for(&self, center: Position) -> Viewport {
        Viewport::centered_on(center, &self.layout)
    }

    /// Writes the view around `center` and the message panel into the buffer.
    /// Returns how many cells changed.
    pub fn compose(&mut self, world: &mut World, center: Position, log: &MessageLog) -> usize {
        let viewport = self.viewport_for(center);
        let mut changed = 0;
        for (column, row, position) in viewport.cells() {
            if self.buffer.write(column, row, world.resolve(position)) {
                changed += 1;
            }
        }
        changed + draw_log_panel(&mut self.buffer, self.layout.panel, log)
    }

    pub fn flush<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S) -> usize {
        self.buffer.flush(surface)
    }

    /// Composes, flushes dirty cells and presents in one step. Nothing is
    /// presented when no cell changed, unless a present was requested.
    pub fn render_frame<S: DisplaySurface + ?Sized>(
        &mut self,
        world: &mut World,
        center: Position,
        log: &MessageLog,
        surface: &mut S,
    ) -> Result<FrameStats, SurfaceError> {
        let cells_changed = self.compose(world, center, log);
        let cells_drawn = self.flush(surface);
        let presented = cells_drawn > 0 || self.present_pending;
        if presented {
            surface.present()?;
            self.present_pending = false;
        }
        Ok(FrameStats {
            cells_changed,
            cells_drawn,
            presented,
        })
    }

    /// Makes the next frame present even if no cell is dirty. The surface
    /// keeps its pixels, so a resized swapchain only needs a re-present.
    pub fn request_present(&mut self) {
        self.present_pending = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RecordingSurface;
    use crate::config::WorldConfig;
    use crate::world::{Color, EntityType, Glyph, MapTile, TerrainKind};

    static MARKER: EntityType = EntityType {
        name: "Marker",
        glyph: Glyph::new(b'M', Color::Yellow, Color::Black),
        max_hp: 1,
        damage: 0,
    };

    fn setup() -> (World, FrameRenderer) {
        let config = WorldConfig::default();
        let layout = config.layout().expect("layout");
        (World::new(&config).expect("world"), FrameRenderer::new(layout))
    }

    fn floor(world: &mut World, position: Position) {
        let tile = world.chunks_mut().get_mutable_tile(position);
        *tile = MapTile {
            occupant: tile.occupant,
            ..TerrainKind::Ground.tile()
        };
    }

    #[test]
    fn first_frame_draws_every_cell() {
        let (mut world, mut frame) = setup();
        let log = MessageLog::with_capacity(4);
        let mut surface = RecordingSurface::default();
        let stats = frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("frame");
        assert_eq!(stats.cells_drawn, 80 * 45);
        assert_eq!(surface.presents(), 1);
    }

    #[test]
    fn unchanged_world_redraws_nothing() {
        let (mut world, mut frame) = setup();
        let log = MessageLog::with_capacity(4);
        let mut surface = RecordingSurface::default();
        frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("first");
        let stats = frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("second");
        assert_eq!(stats, FrameStats::default());
        assert_eq!(surface.presents(), 1);
    }

    #[test]
    fn moving_entity_redraws_only_two_cells() {
        let (mut world, mut frame) = setup();
        let log = MessageLog::with_capacity(4);
        let mut surface = RecordingSurface::default();
        floor(&mut world, Position::new(2, 2));
        floor(&mut world, Position::new(3, 2));
        let handle = world.spawn(&MARKER, Position::new(2, 2)).expect("spawn");
        frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("first");
        surface.take_calls();

        assert!(world.move_entity(handle, Position::new(1, 0)).is_moved());
        let stats = frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("second");
        assert_eq!(stats.cells_drawn, 2);
        let viewport = frame.viewport_for(Position::ORIGIN);
        let (column, row) = viewport
            .world_to_screen(Position::new(3, 2))
            .expect("visible");
        assert!(surface
            .calls()
            .iter()
            .any(|call| call.column == column && call.row == row && call.glyph == b'M'));
    }

    #[test]
    fn entity_shadows_terrain_in_view() {
        let (mut world, mut frame) = setup();
        floor(&mut world, Position::ORIGIN);
        world.spawn(&MARKER, Position::ORIGIN).expect("spawn");
        frame.compose(&mut world, Position::ORIGIN, &MessageLog::with_capacity(1));
        let (column, row) = frame
            .viewport_for(Position::ORIGIN)
            .world_to_screen(Position::ORIGIN)
            .expect("visible");
        assert_eq!(frame.buffer().get(column, row), Some(MARKER.glyph));
    }

    #[test]
    fn new_log_message_redraws_panel_cells_only() {
        let (mut world, mut frame) = setup();
        let mut log = MessageLog::with_capacity(4);
        let mut surface = RecordingSurface::default();
        frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("first");
        surface.take_calls();

        log.push("hi");
        let stats = frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("second");
        assert_eq!(stats.cells_drawn, 2);
        let panel = frame.layout().panel;
        assert!(surface
            .calls()
            .iter()
            .all(|call| panel.contains(call.column, call.row)));
    }

    #[test]
    fn requested_present_happens_once_without_redrawing() {
        let (mut world, mut frame) = setup();
        let log = MessageLog::with_capacity(1);
        let mut surface = RecordingSurface::default();
        frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("first");
        surface.take_calls();

        frame.request_present();
        let stats = frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("after resize");
        assert_eq!(stats.cells_drawn, 0);
        assert!(stats.presented);
        assert_eq!(surface.presents(), 2);
        assert!(surface.calls().is_empty());

        let idle = frame
            .render_frame(&mut world, Position::ORIGIN, &log, &mut surface)
            .expect("idle");
        assert!(!idle.presented);
        assert_eq!(surface.presents(), 2);
    }
}
