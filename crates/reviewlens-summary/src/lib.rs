//! Review summarization: the chat-completions client and the shared parser
//! that turns either structured JSON or labelled free text into an
//! [`Analysis`].

pub mod analysis;
pub mod error;
pub mod openai;

pub use analysis::{parse_analysis, Analysis, StructuredAnalysis, SummaryResponse};
pub use error::SummaryError;
pub use openai::{OpenAiSummarizer, Summarizer};
