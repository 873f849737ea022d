//! Slot model: specification parsing, slot records, and the run-scoped
//! slot table.

mod slot;
mod spec;
mod table;

pub use slot::{Slot, SlotKind, SlotState};
pub use spec::{SlotEntry, default_entries, parse_spec};
pub use table::SlotTable;
