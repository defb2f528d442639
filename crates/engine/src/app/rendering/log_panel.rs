use std::collections::VecDeque;

use crate::world::{Color, Glyph};

use super::layout::CellRect;
use super::screen_buffer::ScreenBuffer;

const TEXT_FG: Color = Color::LightGray;
const LATEST_FG: Color = Color::White;
const TEXT_BG: Color = Color::Black;

/// Bounded message history, most recent first.
#[derive(Debug, Clone)]
pub struct MessageLog {
    capacity: usize,
    messages: VecDeque<String>,
}

impl MessageLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            messages: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Prepends `message`, dropping the oldest entry once full.
    pub fn push(&mut self, message: impl Into<String>) {
        if self.messages.len() == self.capacity {
            self.messages.pop_back();
        }
        self.messages.push_front(message.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.messages.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Breaks `message` into lines of at most `width` characters, preferring
/// word boundaries and hard-splitting words longer than a line.
pub fn wrap_message(message: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in message.split_whitespace() {
        let mut chars: Vec<char> = word.chars().collect();
        if current_len > 0 && current_len + 1 + chars.len() <= width {
            current.push(' ');
            current.extend(chars.iter());
            current_len += 1 + chars.len();
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }
        while chars.len() > width {
            let rest = chars.split_off(width);
            lines.push(chars.into_iter().collect());
            chars = rest;
        }
        current_len = chars.len();
        current.extend(chars);
    }
    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Panel lines top to bottom: newest message first, each wrapped to
/// `width`, truncated to `height` lines. The flag marks the newest message.
pub fn layout_panel(log: &MessageLog, width: usize, height: usize) -> Vec<(String, bool)> {
    let mut lines = Vec::with_capacity(height);
    for (index, message) in log.iter().enumerate() {
        for line in wrap_message(message, width) {
            if lines.len() == height {
                return lines;
            }
            lines.push((line, index == 0));
        }
    }
    lines
}

/// Writes the laid-out panel into `rect`, blanking unused cells.
pub fn draw_log_panel(buffer: &mut ScreenBuffer, rect: CellRect, log: &MessageLog) -> usize {
    let lines = layout_panel(log, rect.width as usize, rect.height as usize);
    let blank = Glyph::new(b' ', TEXT_FG, TEXT_BG);
    let mut changed = 0;
    for row in 0..rect.height {
        let line = lines.get(row as usize);
        let fg = match line {
            Some((_, true)) => LATEST_FG,
            _ => TEXT_FG,
        };
        let mut text = line.map(|(text, _)| text.chars()).into_iter().flatten();
        for column in 0..rect.width {
            let glyph = text
                .next()
                .map(|ch| Glyph::new(cell_code(ch), fg, TEXT_BG))
                .unwrap_or(blank);
            if buffer.write(rect.left + column, rect.top + row, glyph) {
                changed += 1;
            }
        }
    }
    changed
}

fn cell_code(ch: char) -> u8 {
    if ch.is_ascii() && !ch.is_ascii_control() {
        ch as u8
    } else {
        b'?'
    }
}
