pub mod client;

pub use client::{FetchedBody, HttpClient, HttpClientConfig, HttpError};
