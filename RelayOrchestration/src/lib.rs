pub mod errors;
pub mod orchestrator;
pub mod store;

pub use errors::{StoreError, StoreResult};
pub use orchestrator::RelayOrchestrator;
pub use store::ProcessedTxStore;
