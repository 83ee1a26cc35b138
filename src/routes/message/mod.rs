mod handler;
mod model;

pub use handler::{ChatFrame, history, send_message, subscribe};
pub use model::{ChatMessage, SendMessageRequest, SendMessageResponse, validate_content};
