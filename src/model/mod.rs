pub mod combination;
pub mod definitions;
pub mod identity;
pub mod record;

pub use combination::*;
pub use definitions::*;
pub use identity::*;
pub use record::*;
