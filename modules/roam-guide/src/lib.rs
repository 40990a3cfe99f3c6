pub mod app;
pub mod chat;
pub mod community;
pub mod feed;
pub mod geo;
pub mod grounding;
pub mod image_search;
pub mod normalizer;
pub mod prompts;
pub mod recommendation;
pub mod state;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
pub mod voting;

pub use app::App;
pub use state::{Action, AppState, Effect, FeedTicket};
pub use traits::TextGenerator;
