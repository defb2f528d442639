use crate::world::Position;

use super::layout::{CellRect, ScreenLayout};

/// World-space window centered on `center`, mapped onto the layout's view rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub center: Position,
    pub half_width: u32,
    pub half_height: u32,
    pub screen: CellRect,
}

impl Viewport {
    pub fn centered_on(center: Position, layout: &ScreenLayout) -> Self {
        Self {
            center,
            half_width: layout.view_half_width,
            half_height: layout.view_half_height,
            screen: layout.view,
        }
    }

    pub fn screen_to_world(&self, column: u32, row: u32) -> Option<Position> {
        if !self.screen.contains(column, row) {
            return None;
        }
        let dx = (column - self.screen.left) as i64 - i64::from(self.half_width);
        let dy = (row - self.screen.top) as i64 - i64::from(self.half_height);
        self.center.offset(Position::new(dx as i32, dy as i32))
    }

    pub fn world_to_screen(&self, world: Position) -> Option<(u32, u32)> {
        let dx = i64::from(world.x) - i64::from(self.center.x);
        let dy = i64::from(world.y) - i64::from(self.center.y);
        if dx.unsigned_abs() > u64::from(self.half_width)
            || dy.unsigned_abs() > u64::from(self.half_height)
        {
            return None;
        }
        let column = i64::from(self.screen.left) + i64::from(self.half_width) + dx;
        let row = i64::from(self.screen.top) + i64::from(self.half_height) + dy;
        Some((column as u32, row as u32))
    }

    /// Every view cell with the world position it shows, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, Position)> + '_ {
        let rect = self.screen;
        (rect.top..rect.top + rect.height).flat_map(move |row| {
            (rect.left..rect.left + rect.width).filter_map(move |column| {
                self.screen_to_world(column, row)
                    .map(|world| (column, row, world))
            })
        })
    }
}
