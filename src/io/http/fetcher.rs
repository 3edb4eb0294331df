use std::io::Read;

use log::{debug, trace};

use crate::io::common::fetcher::{FetchError, RawPayloadFetcher};

/// Plain GET against the signed asset URL. There is deliberately no
/// wall-clock timeout: the pipeline bounds failures by attempt count, and a
/// slow but progressing download should not be cut off.
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RawPayloadFetcher for HttpFetcher {
    fn fetch_raw_owned(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {url}");
        let response = self.agent.get(url).call().map_err(|error| match error {
            ureq::Error::Status(code, _) => FetchError::Status {
                url: url.to_owned(),
                code,
            },
            ureq::Error::Transport(transport) => FetchError::Transport {
                url: url.to_owned(),
                message: transport.to_string(),
            },
        })?;

        let total = response
            .header("Content-Length")
            .and_then(|value| value.parse::<u64>().ok());

        let mut reader = response.into_reader();
        let mut data = Vec::new();
        let mut chunk = [0u8; 64 * 1024];
        let mut reported_pct = 0;
        loop {
            let n = reader.read(&mut chunk).map_err(|error| FetchError::Transport {
                url: url.to_owned(),
                message: error.to_string(),
            })?;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);

            if let Some(total) = total.filter(|&t| t > 0) {
                let pct = (data.len() as u64 * 100 / total).min(100);
                if pct >= reported_pct + 10 {
                    reported_pct = pct;
                    debug!("{pct}% loaded ({url})");
                }
            }
        }
        trace!("fetched {} bytes from {url}", data.len());
        Ok(data)
    }
}
