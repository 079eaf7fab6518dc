use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway transport error: {0}")]
    Transport(String),
    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
    #[error("Credit rejected by gateway: {0}")]
    CreditRejected(String),
}
