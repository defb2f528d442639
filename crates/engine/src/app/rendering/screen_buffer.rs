use crate::world::{palette_rgb, Glyph};

use super::surface::{DisplaySurface, DrawCall};

const WORD_BITS: usize = u64::BITS as usize;

/// What the surface last showed, cell by cell, plus one dirty bit per cell.
///
/// Every cell starts dirty so the first flush paints the whole screen.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    width: u32,
    height: u32,
    cells: Vec<Glyph>,
    dirty: Vec<u64>,
}

impl ScreenBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        let mut buffer = Self {
            width,
            height,
            cells: vec![Glyph::BLANK; len],
            dirty: vec![0; len.div_ceil(WORD_BITS)],
        };
        buffer.mark_all_dirty();
        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, column: u32, row: u32) -> Option<Glyph> {
        self.index(column, row).map(|index| self.cells[index])
    }

    /// Stores `glyph` and marks the cell dirty if it differs from what is
    /// stored. Returns whether the cell changed; off-screen writes are ignored.
    pub fn write(&mut self, column: u32, row: u32, glyph: Glyph) -> bool {
        let Some(index) = self.index(column, row) else {
            return false;
        };
        if self.cells[index] == glyph {
            return false;
        }
        self.cells[index] = glyph;
        self.dirty[index / WORD_BITS] |= 1 << (index % WORD_BITS);
        true
    }

    pub fn is_dirty(&self, column: u32, row: u32) -> bool {
        self.index(column, row)
            .is_some_and(|index| self.dirty[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn mark_all_dirty(&mut self) {
        let len = self.cells.len();
        self.dirty.fill(u64::MAX);
        let tail = len % WORD_BITS;
        if tail != 0 {
            if let Some(last) = self.dirty.last_mut() {
                *last = (1 << tail) - 1;
            }
        }
    }

    /// Issues one draw call per dirty cell, clearing each bit as it goes.
    /// Returns the number of cells drawn.
    pub fn flush<S: DisplaySurface + ?Sized>(&mut self, surface: &mut S) -> usize {
        let mut drawn = 0;
        for word_index in 0..self.dirty.len() {
            let mut word = self.dirty[word_index];
            while word != 0 {
                let bit = word.trailing_zeros() as usize;
                word &= word - 1;
                let index = word_index * WORD_BITS + bit;
                let glyph = self.cells[index];
                surface.draw_cell(DrawCall {
                    column: (index % self.width as usize) as u32,
                    row: (index / self.width as usize) as u32,
                    glyph: glyph.glyph,
                    fg: palette_rgb(glyph.fg()),
                    bg: palette_rgb(glyph.bg()),
                });
                drawn += 1;
            }
            self.dirty[word_index] = 0;
        }
        drawn
    }

    fn index(&self, column: u32, row: u32) -> Option<usize> {
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + column as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::RecordingSurface;
    use crate::world::{Color, PALETTE};

    const AT: Glyph = Glyph::new(b'@', Color::White, Color::Black);

    #[test]
    fn every_cell_starts_dirty() {
        let buffer = ScreenBuffer::new(7, 10);
        assert_eq!(buffer.dirty_count(), 70);
        assert!(buffer.is_dirty(6, 9));
    }

    #[test]
    fn first_flush_draws_whole_screen_then_nothing() {
        let mut buffer = ScreenBuffer::new(9, 8);
        let mut surface = RecordingSurface::default();
        assert_eq!(buffer.flush(&mut surface), 72);
        assert_eq!(surface.calls().len(), 72);
        assert_eq!(buffer.dirty_count(), 0);

        assert_eq!(buffer.flush(&mut surface), 0);
        assert_eq!(surface.calls().len(), 72);
    }

    #[test]
    fn identical_write_never_sets_dirty_bit() {
        let mut buffer = ScreenBuffer::new(4, 4);
        buffer.flush(&mut RecordingSurface::default());

        assert!(!buffer.write(1, 2, Glyph::BLANK));
        assert_eq!(buffer.dirty_count(), 0);
    }

    #[test]
    fn repeated_write_marks_dirty_once() {
        let mut buffer = ScreenBuffer::new(4, 4);
        buffer.flush(&mut RecordingSurface::default());

        assert!(buffer.write(1, 2, AT));
        assert!(!buffer.write(1, 2, AT));
        assert_eq!(buffer.dirty_count(), 1);

        let mut surface = RecordingSurface::default();
        assert_eq!(buffer.flush(&mut surface), 1);
        assert_eq!(
            surface.calls(),
            &[DrawCall {
                column: 1,
                row: 2,
                glyph: b'@',
                fg: PALETTE[Color::White as usize],
                bg: PALETTE[Color::Black as usize],
            }]
        );

        assert!(!buffer.write(1, 2, AT));
        assert_eq!(buffer.dirty_count(), 0);
    }

    #[test]
    fn writing_back_previous_value_is_a_change() {
        let mut buffer = ScreenBuffer::new(3, 3);
        buffer.flush(&mut RecordingSurface::default());
        buffer.write(0, 0, AT);
        buffer.flush(&mut RecordingSurface::default());

        assert!(buffer.write(0, 0, Glyph::BLANK));
        assert!(buffer.is_dirty(0, 0));
        assert_eq!(buffer.get(0, 0), Some(Glyph::BLANK));
    }

    #[test]
    fn color_only_change_is_dirty() {
        let mut buffer = ScreenBuffer::new(2, 2);
        buffer.write(0, 1, AT);
        buffer.flush(&mut RecordingSurface::default());

        assert!(buffer.write(0, 1, Glyph::new(b'@', Color::Red, Color::Black)));
    }

    #[test]
    fn off_screen_writes_are_ignored() {
        let mut buffer = ScreenBuffer::new(2, 2);
        buffer.flush(&mut RecordingSurface::default());
        assert!(!buffer.write(2, 0, AT));
        assert!(!buffer.write(0, 2, AT));
        assert_eq!(buffer.get(2, 0), None);
        assert_eq!(buffer.dirty_count(), 0);
    }

    #[test]
    fn mark_all_dirty_ignores_padding_bits() {
        let mut buffer = ScreenBuffer::new(80, 45);
        buffer.flush(&mut RecordingSurface::default());
        buffer.mark_all_dirty();
        assert_eq!(buffer.dirty_count(), 80 * 45);
        assert_eq!(buffer.flush(&mut RecordingSurface::default()), 80 * 45);
    }
}
