//! APT `Packages` index download.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::catalog::AssetStore;
use crate::error::FeedError;
use crate::Result;

/// Download the index at `url` as text, gunzipping it when the URL ends in
/// `.gz`.
pub async fn fetch_package_index<S>(store: &S, url: &str) -> Result<String>
where
    S: AssetStore + ?Sized,
{
    let bytes = store.fetch_bytes(url).await?;
    let bytes = if url.ends_with(".gz") {
        debug!("Decompressing gzipped index");
        gunzip(&bytes)?
    } else {
        bytes
    };
    String::from_utf8(bytes).map_err(|e| FeedError::Decode(e.to_string()))
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| FeedError::Decode(format!("invalid gzip data: {}", e)))?;
    Ok(out)
}
