//! Shared batch bookkeeping.
//!
//! The live tree is the source of truth: operation *k* validates
//! against text already mutated by operations 1..k-1. The context is a
//! derived ledger over those mutations — which names each file gained
//! and lost so far — consulted to suppress false conflicts (a name the
//! batch itself relocated away) and to report batch effects.

use std::collections::{BTreeMap, BTreeSet};

/// Cumulative effect of the operations already applied in this batch.
/// Lives only for the duration of one `execute_operation` /
/// `execute_batch` call.
#[derive(Debug, Default)]
pub struct BatchContext {
    /// destination file → names now present there
    added: BTreeMap<String, BTreeSet<String>>,
    /// source file → names removed from there
    removed: BTreeMap<String, BTreeSet<String>>,
}

impl BatchContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_added(&mut self, file: &str, name: &str) {
        self.added
            .entry(file.to_string())
            .or_default()
            .insert(name.to_string());
        if let Some(set) = self.removed.get_mut(file) {
            set.remove(name);
        }
    }

    pub fn record_removed(&mut self, file: &str, name: &str) {
        self.removed
            .entry(file.to_string())
            .or_default()
            .insert(name.to_string());
        if let Some(set) = self.added.get_mut(file) {
            set.remove(name);
        }
    }

    pub fn record_moved(&mut self, name: &str, source: &str, dest: &str, copy_only: bool) {
        self.record_added(dest, name);
        if !copy_only {
            self.record_removed(source, name);
        }
    }

    #[must_use]
    pub fn was_added_to(&self, file: &str, name: &str) -> bool {
        self.added.get(file).is_some_and(|s| s.contains(name))
    }

    #[must_use]
    pub fn was_removed_from(&self, file: &str, name: &str) -> bool {
        self.removed.get(file).is_some_and(|s| s.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_records_both_sides() {
        let mut ctx = BatchContext::new();
        ctx.record_moved("formatUserName", "src/u.ts", "src/a.ts", false);
        assert!(ctx.was_added_to("src/a.ts", "formatUserName"));
        assert!(ctx.was_removed_from("src/u.ts", "formatUserName"));
    }

    #[test]
    fn copy_only_keeps_source() {
        let mut ctx = BatchContext::new();
        ctx.record_moved("f", "src/u.ts", "src/a.ts", true);
        assert!(ctx.was_added_to("src/a.ts", "f"));
        assert!(!ctx.was_removed_from("src/u.ts", "f"));
    }

    #[test]
    fn re_adding_clears_removal() {
        let mut ctx = BatchContext::new();
        // name passes through: moved out of a file, then back in
        ctx.record_moved("f", "src/a.ts", "src/b.ts", false);
        assert!(ctx.was_removed_from("src/a.ts", "f"));
        ctx.record_moved("f", "src/b.ts", "src/a.ts", false);
        assert!(ctx.was_added_to("src/a.ts", "f"));
        assert!(!ctx.was_removed_from("src/a.ts", "f"));
        assert!(ctx.was_removed_from("src/b.ts", "f"));
    }
}
