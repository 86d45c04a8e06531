//! Content-addressed `@keyframes` registry shared by every controller.
//!
//! Names are derived from a 32-bit non-cryptographic hash of the compiled body. Two different
//! bodies that collide are treated as the same animation; with the small, heavily reused name
//! space this is accepted rather than detected.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::{
    host::timer::{Scheduler, TaskId},
    keyframes::compile::CompiledRules,
    style::sheet::StyleSheet,
};

/// Default namespace tag prepended to every generated keyframes name.
pub const DEFAULT_NAME_PREFIX: &str = "ea_";

/// A registered `@keyframes` name; always a valid CSS identifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyframesName(String);

impl KeyframesName {
    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyframesName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How pending rules reach the style sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FlushStrategy {
    /// Rewrite the whole sheet from every registered rule.
    Rebuild,
    /// Insert only rules added since the last flush.
    #[default]
    Incremental,
}

/// djb2-xor string hash, base-36 encoded.
///
/// Walks UTF-16 code units from the end: `h = h * 33 ^ unit` in wrapping 32-bit arithmetic,
/// starting from 5381, then reads the result as unsigned.
pub fn string_hash(s: &str) -> String {
    let units: Vec<u16> = s.encode_utf16().collect();
    let mut value: i32 = 5381;
    for &unit in units.iter().rev() {
        value = value.wrapping_mul(33) ^ i32::from(unit);
    }
    to_base36(value as u32)
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::with_capacity(7);
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

struct RegistryState {
    prefix: String,
    strategy: FlushStrategy,
    sheet: Rc<dyn StyleSheet>,
    scheduler: Rc<dyn Scheduler>,
    // Insertion order, so rebuilt sheets list rules in first-use order.
    entries: Vec<(KeyframesName, String)>,
    names: HashSet<KeyframesName>,
    flushed: usize,
    flush_task: Option<TaskId>,
}

impl RegistryState {
    fn rule(name: &KeyframesName, body: &str) -> String {
        format!("@keyframes {name}{{{body}}}")
    }

    fn write_pending(&mut self) {
        match self.strategy {
            FlushStrategy::Rebuild => {
                let css: String = self
                    .entries
                    .iter()
                    .map(|(name, body)| Self::rule(name, body))
                    .collect();
                self.sheet.replace_text(&css);
            }
            FlushStrategy::Incremental => {
                for (name, body) in &self.entries[self.flushed..] {
                    self.sheet.insert_rule(&Self::rule(name, body));
                }
            }
        }
        self.flushed = self.entries.len();
    }
}

/// Shared handle to the keyframes registry; clones refer to the same registry.
///
/// Entries are only ever added. Inserts made in the same tick are coalesced into a single
/// deferred sheet write.
#[derive(Clone)]
pub struct StyleRegistry {
    inner: Rc<RefCell<RegistryState>>,
}

impl StyleRegistry {
    /// Registry writing into `sheet` and deferring writes through `scheduler`.
    pub fn new(
        sheet: Rc<dyn StyleSheet>,
        scheduler: Rc<dyn Scheduler>,
        strategy: FlushStrategy,
    ) -> Self {
        Self::with_prefix(sheet, scheduler, strategy, DEFAULT_NAME_PREFIX)
    }

    /// Like [`StyleRegistry::new`] with a custom name prefix.
    pub fn with_prefix(
        sheet: Rc<dyn StyleSheet>,
        scheduler: Rc<dyn Scheduler>,
        strategy: FlushStrategy,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(RegistryState {
                prefix: prefix.into(),
                strategy,
                sheet,
                scheduler,
                entries: Vec::new(),
                names: HashSet::new(),
                flushed: 0,
                flush_task: None,
            })),
        }
    }

    /// Name `rules` would be registered under, without registering it.
    pub fn name_for(&self, rules: &CompiledRules) -> KeyframesName {
        let prefix = self.inner.borrow().prefix.clone();
        KeyframesName(format!("{prefix}{}", string_hash(&rules.text())))
    }

    /// Register `rules` if unseen and return its name.
    pub fn insert(&self, rules: &CompiledRules) -> KeyframesName {
        let name = self.name_for(rules);
        let mut state = self.inner.borrow_mut();
        if state.names.contains(&name) {
            return name;
        }
        tracing::debug!(name = %name, "registering keyframes");
        state.names.insert(name.clone());
        state.entries.push((name.clone(), rules.text()));
        if state.flush_task.is_none() {
            let weak: Weak<RefCell<RegistryState>> = Rc::downgrade(&self.inner);
            let task = state.scheduler.schedule_after(
                0.0,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        StyleRegistry { inner }.flush();
                    }
                }),
            );
            state.flush_task = Some(task);
        }
        name
    }

    /// Write pending rules now instead of waiting for the deferred flush.
    #[tracing::instrument(skip(self))]
    pub fn flush(&self) {
        let mut state = self.inner.borrow_mut();
        if let Some(task) = state.flush_task.take() {
            state.scheduler.cancel(task);
        }
        if state.flushed == state.entries.len() {
            return;
        }
        tracing::debug!(
            pending = state.entries.len() - state.flushed,
            "flushing keyframes"
        );
        state.write_pending();
    }

    /// Whether rules are waiting for a flush.
    pub fn is_dirty(&self) -> bool {
        let state = self.inner.borrow();
        state.flushed < state.entries.len()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &KeyframesName) -> bool {
        self.inner.borrow().names.contains(name)
    }

    /// Registered body for `name`.
    pub fn body(&self, name: &KeyframesName) -> Option<String> {
        self.inner
            .borrow()
            .entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, body)| body.clone())
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    /// `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full sheet text for every registered rule, flushed or not.
    pub fn css(&self) -> String {
        self.inner
            .borrow()
            .entries
            .iter()
            .map(|(name, body)| RegistryState::rule(name, body))
            .collect()
    }
}

impl fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("StyleRegistry")
            .field("prefix", &state.prefix)
            .field("strategy", &state.strategy)
            .field("entries", &state.entries.len())
            .field("flushed", &state.flushed)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/style/registry.rs"]
mod tests;
