// src/process/mod.rs
pub mod datasets;
pub mod extract;
pub mod integrate;
pub mod raw_table;
pub mod reader;
pub mod utils;

pub use datasets::{DatasetOptions, Processed};
pub use extract::{extract, Dated, Observation, Overflow, SlotLayout, SpanCheck, YearAxis};
pub use integrate::{integrate, JoinPolicy, PositionalJoin};
pub use raw_table::{Cell, RawTable};
