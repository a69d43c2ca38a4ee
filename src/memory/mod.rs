//! Memory Module
//!
//! Raw byte storage shared by sources, writers and packages.
//!
//! ## Responsibilities
//! - Growable byte arenas with page-granular capacity
//! - Process-wide accounting of arena capacity
//!
//! ## Allocation Policy
//! ```text
//! capacity = round_up(requested, page_size)     (0 for an empty arena)
//!
//! reset / resize / reserve   grow only
//! shrink_to_fit              the only operation that lowers capacity
//! allocation failure         abort (never a recoverable error)
//! ```

mod arena;
mod stats;

pub use arena::ByteArena;
pub use stats::AllocationStats;
