use crate::util::unicode;

/// Single-line text input with a grapheme-aware cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    text: String,
    /// Byte offset, always on a grapheme boundary
    cursor: usize,
}

impl TextField {
    pub fn with_text(text: &str) -> Self {
        TextField {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in terminal cells
    pub fn cursor_col(&self) -> usize {
        unicode::byte_offset_to_display_col(&self.text, self.cursor)
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn delete_word(&mut self) {
        let start = unicode::word_boundary_left(&self.text, self.cursor);
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    pub fn left(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }
}

/// Field with keyboard focus in the entry form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Description,
    Time,
    Date,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Description => FormField::Time,
            FormField::Time => FormField::Date,
            FormField::Date => FormField::Description,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            FormField::Description => FormField::Date,
            FormField::Time => FormField::Description,
            FormField::Date => FormField::Time,
        }
    }
}

/// Whether submitting creates a task or patches an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

/// The add/edit modal. The date lives on the screen's calendar, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryForm {
    pub mode: FormMode,
    pub description: TextField,
    pub time: TextField,
    pub focus: FormField,
}

impl EntryForm {
    pub fn create() -> Self {
        EntryForm {
            mode: FormMode::Create,
            description: TextField::default(),
            time: TextField::default(),
            focus: FormField::Description,
        }
    }

    pub fn edit(id: &str, description: &str, time: &str) -> Self {
        EntryForm {
            mode: FormMode::Edit { id: id.to_string() },
            description: TextField::with_text(description),
            time: TextField::with_text(time),
            focus: FormField::Description,
        }
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    /// The text field with focus, if focus is on one
    pub fn focused_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            FormField::Description => Some(&mut self.description),
            FormField::Time => Some(&mut self.time),
            FormField::Date => None,
        }
    }
}
