pub mod adapters;
pub mod error;
pub mod http;
pub mod normalize;
pub mod orchestrator;
pub mod poll;
pub mod resolver;
pub mod retry;
pub mod sanitize;

pub use adapters::{
    build_providers, AdapterSettings, GooglePlacesProvider, OutscraperProvider, RawReviewBatch,
    ReviewProvider, SerpApiProvider,
};
pub use error::ProviderError;
pub use normalize::{normalize, NormalizedInput};
pub use orchestrator::{PipelineError, ProviderAttemptOutcome, ReviewFetch, ReviewPipeline};
pub use poll::{classify_poll_body, poll_until_ready, PollConfig, PollStatus};
pub use resolver::{GooglePlacesLookup, PlaceCandidate, PlaceLookup, PlaceResolver, ResolutionResult};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use sanitize::{sanitize, DEFAULT_MAX_REVIEWS};
