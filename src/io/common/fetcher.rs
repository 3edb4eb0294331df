use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport failure fetching {url}: {message}")]
    Transport { url: String, message: String },

    #[error("server answered {code} for {url}")]
    Status { url: String, code: u16 },
}

/// The network seam of the pipeline. Implementations are synchronous; the
/// codec loaders hop them onto the blocking pool. Tests substitute in-memory
/// fakes here.
pub trait RawPayloadFetcher: Send + Sync {
    /// Downloads the whole payload behind `url`.
    fn fetch_raw_owned(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
