//! # Memtrace - Offline Memory-Access Trace Analysis
//!
//! Memtrace consumes the event log captured by an instrumentation plugin
//! (function entry/exit, memory reads/writes, heap allocation/free) plus a
//! statically-extracted symbol table, and answers three questions:
//!
//! 1. which named variable does each memory access touch,
//! 2. what repeating access shapes and locality characteristics does a
//!    variable exhibit, and
//! 3. how is memory shared across threads.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              Capture Plugin (separate tool)                  │
//! │   emits fixed-width event records + debug-info file          │
//! └──────────────────────┬───────────────────────────────────────┘
//!                        │ event log + symbol table
//!                        ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Memtrace (This Crate)                       │
//! │                                                              │
//! │  ┌───────────┐    ┌────────────┐    ┌─────────────────┐      │
//! │  │ Event Log │───▶│  Resolver  │───▶│   Query Layer   │      │
//! │  │ (paged)   │    │ (annotate) │    │ (filtered replay│      │
//! │  └─────┬─────┘    └─────┬──────┘    │  + aggregation) │      │
//! │        │                │           └───┬─────────┬───┘      │
//! │        ▼                ▼               ▼         ▼          │
//! │  ┌───────────┐    ┌───────────┐   ┌─────────┐ ┌──────────┐   │
//! │  │Call Stacks│    │  Symbols  │   │ Pattern │ │ Locality │   │
//! │  │(per thread│    │(DebugCtxt)│   │ Engine  │ │Estimators│   │
//! │  └───────────┘    └───────────┘   └─────────┘ └──────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`symbols`]: the symbol model — functions, variables, source
//!   locations, and their binary serialization
//! - [`trace`]: the paged event log, per-thread call-stack
//!   reconstruction, and session metadata
//! - [`resolver`]: the one-time resolution pass that annotates each
//!   memory event with the variable it targets
//! - [`pattern`]: sliding-window matchers for stride, repeated-shape,
//!   and read/write-coupling patterns
//! - [`locality`]: spatial and temporal locality estimators
//! - [`query`]: filtered replay, per-variable per-thread access matrix,
//!   and report orchestration
//! - [`export`]: JSON report export
//! - [`domain`]: core ids and error types
//!
//! ## Typical Usage
//!
//! ```no_run
//! use memtrace::config::AnalysisConfig;
//! use memtrace::query::{QueryContext, QueryManager};
//! use memtrace::resolver;
//! use memtrace::symbols::DebugContext;
//! use memtrace::trace::EventLog;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AnalysisConfig::default();
//! let mut debug = DebugContext::load(&mut std::fs::File::open("app.dbg")?)?;
//! let mut log = EventLog::new("app.trace", 1_000_000, &config)?;
//!
//! // One-time pass: patch variable ids into the log.
//! resolver::annotate(&mut log, &mut debug, &config)?;
//!
//! // Query passes: each one replays the annotated log.
//! let ctx = QueryContext::default();
//! let mut queries = QueryManager::new(&mut log, &debug, ctx);
//! let matrix = queries.access_matrix()?;
//! let locality = queries.localities()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod export;
pub mod locality;
pub mod pattern;
pub mod query;
pub mod resolver;
pub mod symbols;
pub mod trace;

mod codec;
