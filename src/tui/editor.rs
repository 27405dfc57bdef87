// Multi-line script buffer behind the editor pane.

use unicode_width::UnicodeWidthChar;

use crate::script::Script;

#[derive(Debug, Clone, Default)]
pub struct ScriptEditor {
    text: Vec<char>,
    cursor: usize,
}

impl ScriptEditor {
    pub fn from_text(text: &str) -> Self {
        let mut editor = Self::default();
        editor.insert_str(text);
        editor.cursor = 0;
        editor
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn script(&self) -> Script {
        Script::new(self.text())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += 1;
    }

    /// Insert pasted text; CRLF and lone CR become LF.
    pub fn insert_str(&mut self, s: &str) {
        let normalized = s.replace("\r\n", "\n").replace('\r', "\n");
        for c in normalized.chars() {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.text.remove(self.cursor);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.len());
    }

    pub fn home(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    pub fn end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    pub fn move_up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            self.cursor = 0;
            return;
        }
        let col = self.cursor - start;
        let prev_start = self.line_start(start - 1);
        let prev_len = (start - 1) - prev_start;
        self.cursor = prev_start + col.min(prev_len);
    }

    pub fn move_down(&mut self) {
        let start = self.line_start(self.cursor);
        let end = self.line_end(self.cursor);
        if end == self.text.len() {
            self.cursor = end;
            return;
        }
        let col = self.cursor - start;
        let next_start = end + 1;
        let next_len = self.line_end(next_start) - next_start;
        self.cursor = next_start + col.min(next_len);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Zero-based line of the cursor and its display column.
    pub fn cursor_position(&self) -> (usize, usize) {
        let line = self.text[..self.cursor].iter().filter(|c| **c == '\n').count();
        let start = self.line_start(self.cursor);
        let col = self.text[start..self.cursor]
            .iter()
            .map(|c| c.width().unwrap_or(0))
            .sum();
        (line, col)
    }

    fn line_start(&self, idx: usize) -> usize {
        self.text[..idx]
            .iter()
            .rposition(|c| *c == '\n')
            .map(|p| p + 1)
            .unwrap_or(0)
    }

    fn line_end(&self, idx: usize) -> usize {
        self.text[idx..]
            .iter()
            .position(|c| *c == '\n')
            .map(|p| idx + p)
            .unwrap_or(self.text.len())
    }
}
