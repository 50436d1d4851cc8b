mod serpapi;

pub use serpapi::{summarize, SerpApiClient, NO_RESULT};
