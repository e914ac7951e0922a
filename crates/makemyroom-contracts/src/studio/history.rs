use crate::images::ImageRef;

/// Linear undo/redo history over generated images.
///
/// Slot 0 is always `None` and stands for the unedited upload. Pushing after
/// an undo drops every entry past the cursor; there is no branching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<Option<ImageRef>>,
    cursor: usize,
    generation: u64,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: vec![None],
            cursor: 0,
            generation: 0,
        }
    }

    pub fn push(&mut self, image: ImageRef) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Some(image));
        self.cursor = self.entries.len() - 1;
        self.generation += 1;
    }

    /// Returns whether the cursor moved.
    pub fn undo(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Returns whether the cursor moved.
    pub fn redo(&mut self) -> bool {
        if self.cursor + 1 >= self.entries.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn current(&self) -> Option<&ImageRef> {
        self.entries.get(self.cursor).and_then(Option::as_ref)
    }

    /// The entry one step behind the cursor, `None` at slot 0 or on the placeholder.
    pub fn previous(&self) -> Option<&ImageRef> {
        let index = self.cursor.checked_sub(1)?;
        self.entries.get(index).and_then(Option::as_ref)
    }

    pub fn entries(&self) -> &[Option<ImageRef>] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether anything beyond the placeholder was ever pushed.
    pub fn has_generated(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Bumped on every push. Undo and redo only move the cursor over the same
    /// entries, so `(generation, cursor)` names one position in one lineage.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
