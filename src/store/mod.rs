pub mod http;
pub mod memory;
pub mod traits;

pub use http::HttpBackend;
pub use memory::{combination_hash, BackendRequest, MemoryBackend};
pub use traits::*;
