//! Progress stream URL: base URL + templated job path + token query parameter.
//!
//! The push channel cannot carry an `Authorization` header, so the bearer
//! token travels in the request target.

use url::Url;

use crate::config::HarvestConfig;

const JOB_ID_PLACEHOLDER: &str = "{job_id}";

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid API base URL {url:?}: {source}")]
    InvalidBase {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("API base URL {0:?} cannot carry a path")]
    CannotBeABase(String),
    #[error("progress path template {0:?} has no {{job_id}} placeholder")]
    MissingPlaceholder(String),
    #[error("job id is empty")]
    EmptyJobId,
}

#[derive(Debug, Clone)]
pub struct ProgressEndpoint {
    base: Url,
    path_template: String,
    token_param: String,
}

impl ProgressEndpoint {
    pub fn new(
        base_url: &str,
        path_template: impl Into<String>,
        token_param: impl Into<String>,
    ) -> Result<Self, EndpointError> {
        let base = Url::parse(base_url).map_err(|source| EndpointError::InvalidBase {
            url: base_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(EndpointError::CannotBeABase(base_url.to_string()));
        }
        let path_template = path_template.into();
        if !path_template.contains(JOB_ID_PLACEHOLDER) {
            return Err(EndpointError::MissingPlaceholder(path_template));
        }
        Ok(Self {
            base,
            path_template,
            token_param: token_param.into(),
        })
    }

    pub fn from_config(cfg: &HarvestConfig) -> Result<Self, EndpointError> {
        Self::new(&cfg.api_base_url, cfg.progress_path.clone(), cfg.token_param.clone())
    }

    /// Stream URL for `job_id`, authenticated with `token`. The job id is
    /// percent-encoded as a single path segment.
    pub fn url_for(&self, job_id: &str, token: &str) -> Result<Url, EndpointError> {
        let job_id = job_id.trim();
        if job_id.is_empty() {
            return Err(EndpointError::EmptyJobId);
        }
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| EndpointError::CannotBeABase(self.base.to_string()))?;
            segments.pop_if_empty();
            for segment in self.path_template.split('/').filter(|s| !s.is_empty()) {
                segments.push(&segment.replace(JOB_ID_PLACEHOLDER, job_id));
            }
        }
        url.query_pairs_mut().append_pair(&self.token_param, token);
        Ok(url)
    }
}
