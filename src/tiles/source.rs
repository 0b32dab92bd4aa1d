use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::tiles::key::TileKey;

/// Source of encoded tile bytes for keys missing from the disk cache.
pub trait TileFetcher: Send + Sync {
    /// Return the encoded image for `key`.
    fn fetch(&self, key: TileKey) -> GpsMapResult<Vec<u8>>;
}

/// Downloads tiles from a templated URL (`$x`, `$y`, `$z`).
#[derive(Debug)]
pub struct HttpTileFetcher {
    url_template: String,
    client: reqwest::blocking::Client,
}

const USER_AGENT: &str = concat!("gpsmap/", env!("CARGO_PKG_VERSION"));

impl HttpTileFetcher {
    pub fn new(url_template: impl Into<String>) -> GpsMapResult<Self> {
        let url_template = url_template.into();
        if url_template.trim().is_empty() {
            return Err(GpsMapError::validation("tile URL template is empty"));
        }
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GpsMapError::tile(format!("HTTP client error: {e}")))?;
        Ok(Self {
            url_template,
            client,
        })
    }

    /// Build a fetcher from a map descriptor file (`<map><url>...</url></map>`).
    pub fn from_descriptor(path: &Path) -> GpsMapResult<Self> {
        let url = load_map_url(path)?;
        tracing::info!(url = %url, "using map URL");
        Self::new(url)
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn url_for(&self, key: TileKey) -> String {
        expand_url(&self.url_template, key)
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch(&self, key: TileKey) -> GpsMapResult<Vec<u8>> {
        let url = self.url_for(key);
        tracing::debug!(%url, "downloading tile");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| GpsMapError::tile(format!("download of {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(GpsMapError::tile(format!(
                "download of {url} failed: HTTP {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .map_err(|e| GpsMapError::tile(format!("reading {url} failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Substitute tile coordinates into a URL template.
pub fn expand_url(template: &str, key: TileKey) -> String {
    template
        .replace("$x", &key.x.to_string())
        .replace("$y", &key.y.to_string())
        .replace("$z", &key.zoom.to_string())
}

/// Read the URL template out of a map descriptor file.
pub fn load_map_url(path: &Path) -> GpsMapResult<String> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read map descriptor '{}'", path.display()))?;
    parse_map_url(&xml)
        .map_err(|e| GpsMapError::parse(format!("'{}': {e}", path.display())))
}

/// Extract the text of `map/url` from descriptor XML.
pub fn parse_map_url(xml: &str) -> GpsMapResult<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut url = String::new();
    loop {
        match reader
            .read_event()
            .map_err(|e| GpsMapError::parse(format!("map descriptor XML error: {e}")))?
        {
            Event::Start(e) => path.push(e.local_name().as_ref().to_vec()),
            Event::End(_) => {
                path.pop();
            }
            Event::Text(t) if path == [b"map".to_vec(), b"url".to_vec()] => {
                let text = t
                    .unescape()
                    .map_err(|e| GpsMapError::parse(format!("map descriptor text error: {e}")))?;
                url.push_str(&text);
            }
            Event::CData(t) if path == [b"map".to_vec(), b"url".to_vec()] => {
                url.push_str(&String::from_utf8_lossy(&t));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(GpsMapError::parse("map descriptor has no map/url"));
    }
    Ok(url)
}
