mod gateway;
mod speech;

pub use gateway::{ChatMessage, ChatStream, GatewayClient, SseDecoder};
pub use speech::SpeechClient;
