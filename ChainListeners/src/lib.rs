pub mod cursor;
pub mod errors;
pub mod stellar;
pub mod types;
pub mod xrpl;

pub use cursor::{CursorStore, CURSOR_NOW};
pub use errors::{ListenerError, ListenerResult};
pub use stellar::{HorizonClient, StellarPoller};
pub use types::{RawTransaction, SourceChain};
pub use xrpl::XrplSubscriber;

/// How many raw transactions may queue between a listener and its
/// orchestrator before the listener blocks.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
