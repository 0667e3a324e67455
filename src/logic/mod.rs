pub mod commit;
pub mod decimal;
pub mod diff;
pub mod generate;
pub mod resolve;
pub mod search;
pub mod session;

pub use commit::BatchCommitter;
pub use decimal::*;
pub use diff::*;
pub use generate::generate;
pub use resolve::*;
pub use search::{visible_combinations, COMBINATION_LIMIT};
pub use session::{CombinationRow, RowState, VariationSession};
