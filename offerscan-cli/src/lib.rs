// All core functionality is in offerscan-core
// This CLI acts as a thin wrapper around the core library

pub mod output;

// Re-export core types for convenience
pub use offerscan_core::*;
