//! Connection management: PRAGMAs and the writer + reader pool.

pub mod pool;
pub mod pragmas;

pub use pool::ConnectionPool;
pub use pragmas::{apply_pragmas, apply_readonly_pragmas};
