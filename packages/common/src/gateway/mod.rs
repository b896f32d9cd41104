mod error;
mod traits;

pub mod openai;

pub use error::GatewayError;
pub use openai::{GatewayConfig, OpenAiGateway};
pub use traits::VisionGateway;
