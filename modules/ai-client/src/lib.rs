pub mod error;
pub mod gemini;
pub mod traits;
pub mod util;

pub use error::AiError;
pub use gemini::{ChatReply, Gemini, GroundingChunk, StructuredOutput, WebSource};
pub use traits::{Message, MessageRole};
pub use util::{strip_code_blocks, truncate_to_char_boundary};
