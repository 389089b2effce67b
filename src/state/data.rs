//! Shared data structures for the catalog
//!
//! These structs are the persisted shape of the collection: what the
//! library serializes is exactly what lives in memory, field for field.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned to a coin when it is added
pub type CoinId = i64;

/// Errors raised while decoding an embedded payload
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("not a data URL")]
    NotDataUrl,

    #[error("only base64 data URLs are supported")]
    NotBase64,

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Represents a single coin in the collection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coin {
    /// Unique, monotonically assigned at creation
    pub id: CoinId,
    pub name: String,
    pub date: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub ruler: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub diameter: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub obverse: String,
    #[serde(default)]
    pub reverse: String,
    /// Photographs as data URLs, in display order (first one is the thumbnail)
    #[serde(default)]
    pub images: Vec<String>,
    /// Optional 3D model attachment
    #[serde(rename = "model3D", default, skip_serializing_if = "Option::is_none")]
    pub model_3d: Option<MeshPayload>,
    /// When the coin was added; only used for sorting
    pub added_date: DateTime<Utc>,
}

impl Coin {
    /// The representative image, if any photographs are attached
    pub fn thumbnail(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Fields consulted by the search box
    pub fn searchable_fields(&self) -> [&str; 5] {
        [
            &self.name,
            &self.date,
            &self.origin,
            &self.ruler,
            &self.description,
        ]
    }
}

/// A coin as submitted by the add form, before it has an identity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewCoin {
    pub name: String,
    pub date: String,
    pub origin: String,
    pub ruler: String,
    pub material: String,
    pub weight: String,
    pub diameter: String,
    pub description: String,
    pub obverse: String,
    pub reverse: String,
    pub images: Vec<String>,
    pub model_3d: Option<MeshPayload>,
}

impl NewCoin {
    /// Name of the first required field that is blank, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("name")
        } else if self.date.trim().is_empty() {
            Some("date")
        } else {
            None
        }
    }

    /// Attach an identity and timestamp, producing a stored coin
    pub fn into_coin(self, id: CoinId, added_date: DateTime<Utc>) -> Coin {
        Coin {
            id,
            name: self.name,
            date: self.date,
            origin: self.origin,
            ruler: self.ruler,
            material: self.material,
            weight: self.weight,
            diameter: self.diameter,
            description: self.description,
            obverse: self.obverse,
            reverse: self.reverse,
            images: self.images,
            model_3d: self.model_3d,
            added_date,
        }
    }
}

/// Raw bytes of an uploaded 3D model plus its original filename and type hint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MeshPayload {
    /// The model bytes as a base64 data URL
    pub data: String,
    /// Original filename; its extension selects the loader
    pub name: String,
    /// Content-type hint recorded at upload
    #[serde(rename = "type", default)]
    pub content_type: String,
}

impl MeshPayload {
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, bytes: &[u8]) -> Self {
        let content_type = content_type.into();
        Self {
            data: encode_data_url(&content_type, bytes),
            name: name.into(),
            content_type,
        }
    }

    /// Decode the embedded model bytes
    pub fn bytes(&self) -> Result<Vec<u8>, PayloadError> {
        decode_data_url(&self.data).map(|(_, bytes)| bytes)
    }

    /// Lowercased filename extension, without the dot
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

/// Encode bytes as `data:<mime>;base64,<payload>`
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let mime = if mime.is_empty() {
        "application/octet-stream"
    } else {
        mime
    };
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), PayloadError> {
    let rest = url.strip_prefix("data:").ok_or(PayloadError::NotDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(PayloadError::NotDataUrl)?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or(PayloadError::NotBase64)?;

    let bytes = STANDARD.decode(payload.trim())?;
    Ok((mime.to_string(), bytes))
}
