//! Client for the bike registry's serial search API.

use serde::Deserialize;

use crate::error::LookupError;

/// One registry record. Fields the registry sometimes omits are `Option`s;
/// the composer turns a missing required field into `ComposeError` rather
/// than posting a malformed reply.
#[derive(Debug, Clone, Deserialize)]
pub struct Bike {
    #[serde(default)]
    pub stolen: bool,
    #[serde(default)]
    pub frame_colors: Vec<String>,
    #[serde(default)]
    pub manufacturer_name: Option<String>,
    #[serde(default)]
    pub frame_model: Option<String>,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BikesResponse {
    #[serde(default)]
    bikes: Vec<Bike>,
}

/// Serial search against the registry. Two endpoints: exact matches, and
/// "close" serials consulted only when the exact search comes up empty.
pub trait SerialLookup {
    fn search(&self, serial: &str) -> Result<Vec<Bike>, LookupError>;
    fn close_serials(&self, serial: &str) -> Result<Vec<Bike>, LookupError>;
}

/// Blocking HTTP client for the Bike Index v1 API.
pub struct BikeIndexClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BikeIndexClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            base_url: base_url.into(),
        }
    }

    fn get_bikes(&self, path: &str, serial: &str) -> Result<Vec<Bike>, LookupError> {
        let url = format!("{}/{path}", self.base_url.trim_end_matches('/'));
        let mut response = self
            .agent
            .get(&url)
            .query("serial", serial)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(code) => LookupError::Status(code),
                other => LookupError::Http(other.to_string()),
            })?;
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| LookupError::Http(e.to_string()))?;
        let parsed: BikesResponse = serde_json::from_str(&body)?;
        Ok(parsed.bikes)
    }
}

impl SerialLookup for BikeIndexClient {
    fn search(&self, serial: &str) -> Result<Vec<Bike>, LookupError> {
        self.get_bikes("bikes", serial)
    }

    fn close_serials(&self, serial: &str) -> Result<Vec<Bike>, LookupError> {
        self.get_bikes("bikes/close_serials", serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bikes_response() {
        let body = r#"{
            "bikes": [
                {
                    "stolen": true,
                    "frame_colors": ["Black", "Red"],
                    "manufacturer_name": "Surly",
                    "frame_model": "Steamroller",
                    "serial": "XJ12345",
                    "url": "https://bikeindex.org/bikes/1234"
                }
            ]
        }"#;
        let parsed: BikesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.bikes.len(), 1);
        let bike = &parsed.bikes[0];
        assert!(bike.stolen);
        assert_eq!(bike.frame_colors[0], "Black");
        assert_eq!(bike.serial, "XJ12345");
    }

    #[test]
    fn parse_partial_record() {
        // Missing fields deserialize; the composer rejects them later.
        let body = r#"{"bikes": [{"serial": "ZZZ"}]}"#;
        let parsed: BikesResponse = serde_json::from_str(body).unwrap();
        let bike = &parsed.bikes[0];
        assert!(!bike.stolen);
        assert!(bike.frame_colors.is_empty());
        assert!(bike.manufacturer_name.is_none());
        assert!(bike.url.is_none());
    }

    #[test]
    fn parse_empty_response() {
        let parsed: BikesResponse = serde_json::from_str(r#"{"bikes": []}"#).unwrap();
        assert!(parsed.bikes.is_empty());
    }

    #[test]
    fn missing_bikes_key_defaults_to_empty() {
        let parsed: BikesResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.bikes.is_empty());
    }
}
