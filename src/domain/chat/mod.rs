//! Chat requests, responses, stream events and stored chat records

mod repository;
mod request;
mod response;

pub use repository::{in_memory::InMemoryChatRecordRepository, ChatRecord, ChatRecordRepository};
pub use request::ChatRequest;
pub use response::{ChatResponse, StreamEvent};
