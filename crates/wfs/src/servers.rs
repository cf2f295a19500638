//! Known WFS endpoints.

use crate::error::{WfsError, WfsResult};

/// Short server names and their WFS endpoints.
pub static SERVERS: &[(&str, &str)] = &[
    (
        "fiskdir",
        "https://gis.fiskeridir.no/server/services/FiskeridirWFS/MapServer/WFSServer",
    ),
    ("imr_fisk", "https://kart.hi.no/data/ows"),
];

/// Endpoint URL of a named server.
pub fn server_url(name: &str) -> WfsResult<&'static str> {
    SERVERS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, url)| *url)
        .ok_or_else(|| WfsError::UnknownServer(name.to_string()))
}
