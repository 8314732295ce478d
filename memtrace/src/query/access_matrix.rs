//! The variable-by-thread access matrix.

use crate::domain::VarId;
use crate::symbols::{DebugContext, SourceLocation};
use memtrace_common::Event;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Read/write direction bits for one (variable, thread) cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccessMask(u8);

impl AccessMask {
    const READ: u8 = 1;
    const WRITE: u8 = 2;

    pub fn add_read(&mut self) {
        self.0 |= Self::READ;
    }

    pub fn add_write(&mut self) {
        self.0 |= Self::WRITE;
    }

    pub fn merge(&mut self, other: AccessMask) {
        self.0 |= other.0;
    }

    /// Rendered cell: `R`, `W`, `R/W`, or `-` for untouched.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match (self.0 & Self::READ != 0, self.0 & Self::WRITE != 0) {
            (true, true) => "R/W",
            (true, false) => "R",
            (false, true) => "W",
            (false, false) => "-",
        }
    }
}

/// One (variable, thread) cell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadAccess {
    pub mask: AccessMask,
    pub count: u64,
}

/// One matrix row: a variable and its per-thread traffic.
#[derive(Debug, Clone)]
pub struct MatrixEntry {
    pub name: String,
    pub src_loc: SourceLocation,
    pub size: u64,
    pub threads: BTreeMap<u32, ThreadAccess>,
}

impl MatrixEntry {
    #[must_use]
    pub fn total_accesses(&self) -> u64 {
        self.threads.values().map(|cell| cell.count).sum()
    }
}

/// Variable-by-thread access matrix, built from resolved Read/Write
/// records.
#[derive(Debug, Default)]
pub struct AccessMatrix {
    entries: BTreeMap<VarId, MatrixEntry>,
    threads: BTreeSet<u32>,
}

impl AccessMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one resolved access into the matrix. Unresolved records and
    /// non-access records are ignored.
    pub fn record(&mut self, debug: &DebugContext, event: &Event) {
        if !event.is_access() {
            return;
        }
        let Some(memory) = event.memory() else { return };
        let var_id = VarId(memory.var_id);
        if !var_id.is_resolved() {
            return;
        }
        let Some(var) = debug.find_var(var_id) else { return };
        let entry = self.entries.entry(var_id).or_insert_with(|| MatrixEntry {
            name: var.name.clone(),
            src_loc: var.src_loc.clone(),
            size: var.size,
            threads: BTreeMap::new(),
        });
        let cell = entry.threads.entry(memory.thread_id).or_default();
        cell.count += 1;
        match event {
            Event::Read(_) => cell.mask.add_read(),
            Event::Write(_) => cell.mask.add_write(),
            _ => {}
        }
        self.threads.insert(memory.thread_id);
    }

    /// Collapse rows that denote the same source-level variable: same
    /// name declared at the same known location (a recursion's many
    /// frame instances, or an allocation loop's many blocks). Rows with
    /// an unknown location are never merged, they may be anything.
    pub fn merge(&mut self) {
        let mut canonical: HashMap<(String, SourceLocation), VarId> = HashMap::new();
        let mut merged: Vec<(VarId, VarId)> = Vec::new();
        for (&id, entry) in &self.entries {
            if !entry.src_loc.is_known() {
                continue;
            }
            let key = (entry.name.clone(), entry.src_loc.clone());
            match canonical.get(&key) {
                Some(&target) => merged.push((id, target)),
                None => {
                    canonical.insert(key, id);
                }
            }
        }
        for (from, into) in merged {
            let Some(row) = self.entries.remove(&from) else { continue };
            let Some(target) = self.entries.get_mut(&into) else { continue };
            for (thread_id, cell) in row.threads {
                let merged_cell = target.threads.entry(thread_id).or_default();
                merged_cell.count += cell.count;
                merged_cell.mask.merge(cell.mask);
            }
        }
    }

    #[must_use]
    pub fn entries(&self) -> &BTreeMap<VarId, MatrixEntry> {
        &self.entries
    }

    /// All thread ids that contributed at least one access.
    #[must_use]
    pub fn threads(&self) -> &BTreeSet<u32> {
        &self.threads
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
