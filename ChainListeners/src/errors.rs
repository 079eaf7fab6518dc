use thiserror::Error;

pub type ListenerResult<T> = Result<T, ListenerError>;

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Invalid listener config: {0}")]
    InvalidConfig(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Failed to decode chain response: {0}")]
    Decode(String),
    #[error("Subscription error: {0}")]
    Subscription(String),
    #[error("Cursor store error: {0}")]
    CursorStore(String),
    #[error("Event channel closed")]
    ChannelClosed,
}
