//! Report generation: each report is one full filtered replay of the
//! annotated log.

use crate::domain::{TraceError, VarId};
use crate::locality::{SpatialLocality, TemporalLocality};
use crate::pattern::{Access, AccessKind, MatchInfo, PatternAnalyzer, StatShape};
use crate::query::access_matrix::AccessMatrix;
use crate::query::context::QueryContext;
use crate::symbols::DebugContext;
use crate::trace::EventLog;
use log::info;
use memtrace_common::Event;
use std::collections::BTreeMap;

/// Spatial and temporal scores of one filtered access stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalityReport {
    pub spatial: f64,
    pub temporal: f64,
}

/// Detected patterns of one variable.
#[derive(Debug, Clone)]
pub struct PatternReport {
    pub var: VarId,
    pub name: String,
    pub matches: Vec<MatchInfo>,
    pub shapes: Vec<StatShape>,
}

/// Runs report queries over an annotated log. Each query resets the log
/// and replays it once under the context's filters.
pub struct QueryManager<'a> {
    log: &'a mut EventLog,
    debug: &'a DebugContext,
    ctx: QueryContext,
}

impl<'a> QueryManager<'a> {
    pub fn new(log: &'a mut EventLog, debug: &'a DebugContext, ctx: QueryContext) -> Self {
        Self { log, debug, ctx }
    }

    /// The variable-by-thread access matrix, with same-declaration rows
    /// merged.
    pub fn access_matrix(&mut self) -> Result<AccessMatrix, TraceError> {
        let mut matrix = AccessMatrix::new();
        self.log.reset()?;
        while self.log.has_next() {
            let event = self.log.next(self.debug)?;
            if !event.is_access() {
                continue;
            }
            if self.accepted(&event) {
                matrix.record(self.debug, &event);
            }
        }
        matrix.merge();
        info!("access matrix: {} rows, {} threads", matrix.entries().len(), matrix.threads().len());
        Ok(matrix)
    }

    /// Locality scores over the filtered access stream.
    pub fn localities(&mut self) -> Result<LocalityReport, TraceError> {
        let mut spatial = SpatialLocality::new();
        let mut temporal = TemporalLocality::default();
        self.log.reset()?;
        while self.log.has_next() {
            let event = self.log.next(self.debug)?;
            if !event.is_access() || !self.accepted(&event) {
                continue;
            }
            // Unresolved traffic (PLT stubs, uninstrumented regions) is
            // not attributable to any variable and stays out of the
            // scores.
            if let Some(memory) = event.memory() {
                if VarId(memory.var_id).is_resolved() {
                    spatial.record(memory.addr);
                    temporal.record(memory.addr);
                }
            }
        }
        Ok(LocalityReport { spatial: spatial.score(), temporal: temporal.score() })
    }

    /// Per-variable pattern detection; `top_n` bounds the shapes
    /// reported per variable. Variables with nothing detected are
    /// omitted.
    pub fn access_patterns(&mut self, top_n: usize) -> Result<Vec<PatternReport>, TraceError> {
        let mut analyzers: BTreeMap<VarId, PatternAnalyzer> = BTreeMap::new();
        self.log.reset()?;
        while self.log.has_next() {
            let event = self.log.next(self.debug)?;
            if !event.is_access() || !self.accepted(&event) {
                continue;
            }
            let Some(memory) = event.memory() else { continue };
            let var_id = VarId(memory.var_id);
            if !var_id.is_resolved() {
                continue;
            }
            let Some(var) = self.debug.find_var(var_id) else { continue };
            let analyzer = analyzers
                .entry(var_id)
                .or_insert_with(|| PatternAnalyzer::new(var.type_size));
            let kind = if matches!(event, Event::Read(_)) {
                AccessKind::Read
            } else {
                AccessKind::Write
            };
            analyzer.process(&Access::new(memory.addr, memory.size, kind, var.name.clone()));
        }
        let reports: Vec<PatternReport> = analyzers
            .into_iter()
            .filter_map(|(var, analyzer)| {
                let matches = analyzer.matches();
                let shapes = analyzer.stat_shapes(top_n);
                if matches.is_empty() && shapes.is_empty() {
                    return None;
                }
                let name = self
                    .debug
                    .find_var(var)
                    .map_or_else(|| var.to_string(), |v| v.name.clone());
                Some(PatternReport { var, name, matches, shapes })
            })
            .collect();
        Ok(reports)
    }

    fn accepted(&self, event: &Event) -> bool {
        self.ctx.accept(event, self.log.top_func(event.thread_id()))
    }
}
