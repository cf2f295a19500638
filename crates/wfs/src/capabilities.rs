//! WFS GetCapabilities lookup.

use std::time::Duration;

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::{WfsError, WfsResult};
use crate::servers::server_url;

/// A feature type advertised by a WFS server.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureType {
    /// Layer name used in requests
    pub name: String,
    /// Human-readable title
    pub title: String,
}

/// Source of GetCapabilities documents.
#[async_trait]
pub trait CapabilitiesSource: Send + Sync {
    /// The capabilities XML of the WFS endpoint `url`.
    async fn capabilities(&self, url: &str) -> WfsResult<String>;
}

/// Fetches capabilities over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCapabilities {
    client: Client,
}

impl HttpCapabilities {
    pub fn new() -> WfsResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CapabilitiesSource for HttpCapabilities {
    #[instrument(skip(self))]
    async fn capabilities(&self, url: &str) -> WfsResult<String> {
        let response = self
            .client
            .get(url)
            .query(&[("service", "WFS"), ("request", "GetCapabilities")])
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        debug!(bytes = body.len(), "Fetched capabilities");
        Ok(body)
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    Name,
    Title,
}

/// All feature types of a GetCapabilities document, in document order.
pub fn parse_feature_types(xml: &str) -> WfsResult<Vec<FeatureType>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut feature_types = Vec::new();
    let mut current: Option<FeatureType> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"FeatureType" => current = Some(FeatureType::default()),
                b"Name" if current.is_some() => field = Some(Field::Name),
                b"Title" if current.is_some() => field = Some(Field::Title),
                _ => field = None,
            },
            Ok(Event::Text(t)) => {
                if let (Some(feature), Some(field)) = (current.as_mut(), field) {
                    let text = t
                        .unescape()
                        .map_err(|e| WfsError::Capabilities(e.to_string()))?;
                    match field {
                        Field::Name => feature.name.push_str(&text),
                        Field::Title => feature.title.push_str(&text),
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"FeatureType" => {
                    if let Some(feature) = current.take() {
                        feature_types.push(feature);
                    }
                    field = None;
                }
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(WfsError::Capabilities(format!(
                    "XML parsing error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(feature_types)
}

/// Name of the layer whose title is `title`, if the document has one.
pub fn get_layer(title: &str, xml: &str) -> WfsResult<Option<String>> {
    Ok(parse_feature_types(xml)?
        .into_iter()
        .find(|feature| feature.title == title)
        .map(|feature| feature.name))
}

/// Name of the layer titled `title` on the named server.
#[instrument(skip(source))]
pub async fn find_layer(
    source: &dyn CapabilitiesSource,
    server: &str,
    title: &str,
) -> WfsResult<Option<String>> {
    let url = server_url(server)?;
    let xml = source.capabilities(url).await?;
    get_layer(title, &xml)
}
