use ai_client::GroundingChunk;
use roam_common::GroundingSource;

const DEFAULT_SOURCE_TITLE: &str = "Source";

/// Citations in upstream order. Chunks without a web URI are dropped; a
/// missing title becomes "Source". The full list is returned so display
/// limits stay a presentation choice.
pub fn extract_sources(chunks: &[GroundingChunk]) -> Vec<GroundingSource> {
    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.web.as_ref()?;
            let uri = web.uri.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
            let title = web
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(DEFAULT_SOURCE_TITLE);
            Some(GroundingSource {
                title: title.to_string(),
                uri: uri.to_string(),
            })
        })
        .collect()
}
