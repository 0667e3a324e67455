pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod notify;
pub mod store;

pub use error::{BatchError, BatchOperation, Result, VariationError};

// Export logic types
pub use logic::{
    compute_diff, compute_missing, compute_to_delete, ensure_decimal_places, generate,
    visible_combinations, BatchCommitter, CombinationRow, PendingDiff, RecordDefaults, RowState,
    VariationSession,
};

// Export all model types
pub use model::*;

pub use notify::{LogNotifier, Notifier, Severity};

// Export store types
pub use store::{CombinationBackend, HttpBackend, MemoryBackend};
