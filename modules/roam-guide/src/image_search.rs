use std::fmt::Display;

use roam_common::RoamError;
use url::Url;

/// Templated photo-search endpoint: `{base}/{keywords}?lock={slot}`.
#[derive(Debug, Clone)]
pub struct ImageSearch {
    base: Url,
}

impl ImageSearch {
    pub fn new(base_url: &str) -> Result<Self, RoamError> {
        let base = Url::parse(base_url)
            .map_err(|e| RoamError::Config(format!("invalid image base url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(RoamError::Config(format!(
                "image base url '{base_url}' cannot take path segments"
            )));
        }
        Ok(Self { base })
    }

    /// Percent-encode `keywords` into the path. `lock` keeps items that share
    /// keywords from resolving to the same fallback photo.
    pub fn url_for(&self, keywords: &str, lock: impl Display) -> String {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(keywords.trim());
        }
        url.query_pairs_mut()
            .append_pair("lock", &lock.to_string());
        url.to_string()
    }
}
