use std::cell::{Cell, RefCell};

/// The one shared style container keyframe rules are written into.
pub trait StyleSheet {
    /// Replace the whole sheet text in one mutation.
    fn replace_text(&self, css: &str);

    /// Append one complete rule to a live sheet.
    fn insert_rule(&self, rule: &str);
}

/// In-memory sheet that records how often it was mutated.
#[derive(Debug, Default)]
pub struct MemoryStyleSheet {
    contents: RefCell<String>,
    mutations: Cell<usize>,
}

impl MemoryStyleSheet {
    /// Empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current sheet text.
    pub fn css(&self) -> String {
        self.contents.borrow().clone()
    }

    /// Number of `replace_text` / `insert_rule` calls so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.get()
    }
}

impl StyleSheet for MemoryStyleSheet {
    fn replace_text(&self, css: &str) {
        *self.contents.borrow_mut() = css.to_string();
        self.mutations.set(self.mutations.get() + 1);
    }

    fn insert_rule(&self, rule: &str) {
        self.contents.borrow_mut().push_str(rule);
        self.mutations.set(self.mutations.get() + 1);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/sheet.rs"]
mod tests;
