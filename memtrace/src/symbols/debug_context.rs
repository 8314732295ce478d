//! The symbol table: owns every `FuncInfo`/`VarInfo` by id.
//!
//! Ids are assigned by the context's own sequences, so they are unique,
//! stable for the context's lifetime, and deterministic across runs (no
//! process-wide counters). Lookups return `None` on a miss; unresolved
//! symbols are a normal outcome (PLT stubs, uninstrumented regions), not
//! an error.

use crate::codec::{read_str, write_str};
use crate::domain::{FormatError, FuncId, VarId};
use crate::symbols::types::{FuncInfo, NewVar, SourceLocation, StorageType, VarInfo};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::info;
use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};

const DEBUG_INFO_MAGIC: u32 = 0x4D54_6462; // "MTdb"
const DEBUG_INFO_VERSION: u32 = 1;

/// Immutable-after-build table of functions and variables.
///
/// "After build" includes the resolution pass: Alloc events register
/// Dynamic variables through [`DebugContext::add_dynamic_var`]. Static
/// and Auto entries are never removed; Dynamic entries are kept even
/// after their heap block is freed so that query passes can still name
/// accesses resolved while the block was live.
#[derive(Debug, Default)]
pub struct DebugContext {
    funcs: BTreeMap<FuncId, FuncInfo>,
    vars: BTreeMap<VarId, VarInfo>,
    inst_bindings: HashMap<u64, SourceLocation>,
    next_func_id: i32,
    next_var_id: i32,
    dyn_seq: u32,
}

impl DebugContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function; returns its assigned id.
    pub fn add_func(&mut self, name: impl Into<String>, stack_offset: i64) -> FuncId {
        let id = FuncId(self.next_func_id);
        self.next_func_id += 1;
        self.funcs.insert(id, FuncInfo { id, name: name.into(), stack_offset, vars: Vec::new() });
        id
    }

    /// Register a variable; returns its assigned id. If the variable
    /// names a parent function, it is appended to that function's `vars`
    /// back-references.
    pub fn add_var(&mut self, var: NewVar) -> VarId {
        let id = VarId(self.next_var_id);
        self.next_var_id += 1;
        if let Some(parent) = var.parent {
            if let Some(func) = self.funcs.get_mut(&parent) {
                func.vars.push(id);
            }
        }
        self.vars.insert(
            id,
            VarInfo {
                id,
                storage: var.storage,
                name: var.name,
                size: var.size,
                type_size: var.type_size,
                stack_offset: var.stack_offset,
                src_loc: var.src_loc,
                parent: var.parent,
            },
        );
        id
    }

    /// Register the Dynamic variable backing a fresh heap block. The
    /// synthetic name carries a context-owned sequence number.
    pub fn add_dynamic_var(&mut self, addr: u64, size: u64, src_loc: SourceLocation) -> VarId {
        let seq = self.dyn_seq;
        self.dyn_seq += 1;
        #[allow(clippy::cast_possible_wrap)]
        self.add_var(NewVar {
            storage: StorageType::Dynamic,
            name: format!("__dyn_{seq}"),
            size,
            type_size: size,
            stack_offset: addr as i64,
            src_loc,
            parent: None,
        })
    }

    /// First function with this name, in id order.
    #[must_use]
    pub fn find_func_by_name(&self, name: &str) -> Option<&FuncInfo> {
        self.funcs.values().find(|f| f.name == name)
    }

    #[must_use]
    pub fn find_func(&self, id: FuncId) -> Option<&FuncInfo> {
        self.funcs.get(&id)
    }

    #[must_use]
    pub fn find_var(&self, id: VarId) -> Option<&VarInfo> {
        self.vars.get(&id)
    }

    /// Static variable containing `addr`, by absolute address. Linear
    /// scan; static variable counts are small.
    #[must_use]
    pub fn find_var_by_address(&self, addr: u64) -> Option<&VarInfo> {
        self.vars.values().find(|v| {
            #[allow(clippy::cast_sign_loss)]
            let var_addr = v.stack_offset as u64;
            v.storage == StorageType::Static && var_addr <= addr && addr < var_addr + v.size
        })
    }

    /// Bind an instruction address to its source location. First binding
    /// wins; the capture layer may report the same instruction many
    /// times.
    pub fn set_inst_binding(&mut self, inst_addr: u64, src_loc: SourceLocation) {
        self.inst_bindings.entry(inst_addr).or_insert(src_loc);
    }

    #[must_use]
    pub fn inst_binding(&self, inst_addr: u64) -> Option<&SourceLocation> {
        self.inst_bindings.get(&inst_addr)
    }

    pub fn funcs(&self) -> impl Iterator<Item = &FuncInfo> {
        self.funcs.values()
    }

    pub fn vars(&self) -> impl Iterator<Item = &VarInfo> {
        self.vars.values()
    }

    /// Serialize to a binary stream: header, function table, variable
    /// table, instruction→source bindings.
    pub fn save<W: Write>(&self, w: &mut W) -> Result<(), FormatError> {
        w.write_u32::<LittleEndian>(DEBUG_INFO_MAGIC)?;
        w.write_u32::<LittleEndian>(DEBUG_INFO_VERSION)?;
        w.write_u32::<LittleEndian>(self.dyn_seq)?;

        w.write_u32::<LittleEndian>(u32::try_from(self.funcs.len()).unwrap_or(u32::MAX))?;
        for func in self.funcs.values() {
            write_str(w, &func.name)?;
            w.write_i64::<LittleEndian>(func.stack_offset)?;
            w.write_i32::<LittleEndian>(func.id.0)?;
        }

        w.write_u32::<LittleEndian>(u32::try_from(self.vars.len()).unwrap_or(u32::MAX))?;
        for var in self.vars.values() {
            w.write_i32::<LittleEndian>(var.id.0)?;
            w.write_u8(var.storage.as_raw())?;
            w.write_i32::<LittleEndian>(var.parent.map_or(-1, |p| p.0))?;
            write_str(w, &var.name)?;
            w.write_u64::<LittleEndian>(var.size)?;
            w.write_u64::<LittleEndian>(var.type_size)?;
            w.write_i64::<LittleEndian>(var.stack_offset)?;
            write_str(w, &var.src_loc.file)?;
            w.write_i32::<LittleEndian>(var.src_loc.line)?;
        }

        w.write_u32::<LittleEndian>(u32::try_from(self.inst_bindings.len()).unwrap_or(u32::MAX))?;
        // HashMap iteration order is unstable; sort so identical
        // contexts serialize to identical bytes.
        let mut bindings: Vec<_> = self.inst_bindings.iter().collect();
        bindings.sort_by_key(|(addr, _)| **addr);
        for (addr, loc) in bindings {
            w.write_u64::<LittleEndian>(*addr)?;
            write_str(w, &loc.file)?;
            w.write_i32::<LittleEndian>(loc.line)?;
        }
        Ok(())
    }

    /// Deserialize. Load order: all functions, then all variables (their
    /// parent ids are resolved against the already-loaded functions),
    /// then instruction→source bindings. Any format mismatch is fatal —
    /// no partial load.
    pub fn load<R: Read>(r: &mut R) -> Result<Self, FormatError> {
        let magic = r.read_u32::<LittleEndian>()?;
        if magic != DEBUG_INFO_MAGIC {
            return Err(FormatError::BadMagic { kind: "debug-info", found: magic });
        }
        let version = r.read_u32::<LittleEndian>()?;
        if version != DEBUG_INFO_VERSION {
            return Err(FormatError::UnsupportedVersion {
                kind: "debug-info",
                found: version,
                expected: DEBUG_INFO_VERSION,
            });
        }

        let mut ctx = DebugContext::new();
        ctx.dyn_seq = r.read_u32::<LittleEndian>()?;

        let n_funcs = r.read_u32::<LittleEndian>()?;
        for _ in 0..n_funcs {
            let name = read_str(r)?;
            let stack_offset = r.read_i64::<LittleEndian>()?;
            let id = FuncId(r.read_i32::<LittleEndian>()?);
            ctx.funcs.insert(id, FuncInfo { id, name, stack_offset, vars: Vec::new() });
            ctx.next_func_id = ctx.next_func_id.max(id.0 + 1);
        }

        let n_vars = r.read_u32::<LittleEndian>()?;
        for _ in 0..n_vars {
            let id = VarId(r.read_i32::<LittleEndian>()?);
            let raw_storage = r.read_u8()?;
            let storage = StorageType::from_raw(raw_storage)
                .ok_or(FormatError::UnknownStorageType(raw_storage))?;
            let parent_id = r.read_i32::<LittleEndian>()?;
            let name = read_str(r)?;
            let size = r.read_u64::<LittleEndian>()?;
            let type_size = r.read_u64::<LittleEndian>()?;
            let stack_offset = r.read_i64::<LittleEndian>()?;
            let file = read_str(r)?;
            let line = r.read_i32::<LittleEndian>()?;

            let parent = if parent_id < 0 {
                None
            } else {
                let parent = FuncId(parent_id);
                let func = ctx
                    .funcs
                    .get_mut(&parent)
                    .ok_or(FormatError::UnknownParent { var_id: id.0, parent_id })?;
                func.vars.push(id);
                Some(parent)
            };
            ctx.vars.insert(
                id,
                VarInfo {
                    id,
                    storage,
                    name,
                    size,
                    type_size,
                    stack_offset,
                    src_loc: SourceLocation { file, line },
                    parent,
                },
            );
            ctx.next_var_id = ctx.next_var_id.max(id.0 + 1);
        }

        let n_bindings = r.read_u32::<LittleEndian>()?;
        for _ in 0..n_bindings {
            let inst_addr = r.read_u64::<LittleEndian>()?;
            let file = read_str(r)?;
            let line = r.read_i32::<LittleEndian>()?;
            ctx.inst_bindings.insert(inst_addr, SourceLocation { file, line });
        }

        info!(
            "debug context loaded: {} functions, {} variables, {} bindings",
            ctx.funcs.len(),
            ctx.vars.len(),
            ctx.inst_bindings.len()
        );
        Ok(ctx)
    }
}
