/// Text inserted by each virtual keyboard key, in display order
pub const SHORTCUTS: [&str; 18] = [
    "sin(", "cos(", "tan(", "sqrt(", "log(", "exp(", "pi", "e", "^2", "^3", "^(", "(", ")", "/",
    "*", "-", "+", " ^ ",
];

/// Returns the shortcut text for key `index`, if there is such a key
pub fn shortcut(index: usize) -> Option<&'static str> {
    SHORTCUTS.get(index).copied()
}

/// An editable single-line text field with a selection.
///
/// Positions count characters, not bytes. `start == end` is a plain cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionField {
    value: String,
    start: usize,
    end: usize,
}

impl ExpressionField {
    /// Creates a field holding `value` with the cursor at its end
    pub fn new(value: &str) -> Self {
        let mut field = Self::default();
        field.set_value(value);
        field
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Current selection as `(start, end)` character positions
    pub fn selection(&self) -> (usize, usize) {
        (self.start, self.end)
    }

    /// Replaces the whole text and puts the cursor at the end
    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        let len = self.char_len();
        self.start = len;
        self.end = len;
    }

    /// Selects `[start, end)`; positions past the end are clamped and a
    /// reversed pair is swapped.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.char_len();
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.start = start.min(len);
        self.end = end.min(len);
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.select(pos, pos);
    }

    /// Inserts `text` in place of the current selection and moves the
    /// cursor just after the inserted text.
    pub fn insert_at_cursor(&mut self, text: &str) {
        let start_byte = self.byte_offset(self.start);
        let end_byte = self.byte_offset(self.end);

        let mut value = String::with_capacity(self.value.len() + text.len());
        value.push_str(&self.value[..start_byte]);
        value.push_str(text);
        value.push_str(&self.value[end_byte..]);
        self.value = value;

        let pos = self.start + text.chars().count();
        self.start = pos;
        self.end = pos;
    }

    /// Inserts the text of virtual key `index`.
    ///
    /// # Returns
    /// * `bool` - False when no key has that index (the field is untouched)
    pub fn press_key(&mut self, index: usize) -> bool {
        match shortcut(index) {
            Some(text) => {
                self.insert_at_cursor(text);
                true
            }
            None => false,
        }
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_pos)
            .map_or(self.value.len(), |(i, _)| i)
    }
}
