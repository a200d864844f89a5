mod executor;
mod llm_client;
mod message;
pub mod providers;

pub use executor::*;
pub use llm_client::*;
pub use message::*;
