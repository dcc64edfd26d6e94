use serde::{Deserialize, Serialize};

/// One hit from the Nominatim `/search?format=json` endpoint.
///
/// Nominatim encodes coordinates as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}
