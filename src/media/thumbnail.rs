use iced::widget::image::Handle;
use image::{imageops::FilterType, Rgba, RgbaImage};
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::state::data::{decode_data_url, Coin, CoinId, PayloadError};

/// Size of generated thumbnails (square bounding box)
const THUMBNAIL_SIZE: u32 = 256;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decode an embedded photo and shrink it to fit the thumbnail box
pub fn thumbnail_image(data_url: &str) -> Result<RgbaImage, ThumbnailError> {
    let (_, bytes) = decode_data_url(data_url)?;
    let img = image::load_from_memory(&bytes)?;
    Ok(img
        .resize(THUMBNAIL_SIZE, THUMBNAIL_SIZE, FilterType::Lanczos3)
        .to_rgba8())
}

/// Full-size handle for an embedded photo (decoded lazily by iced)
pub fn full_image_handle(data_url: &str) -> Result<Handle, PayloadError> {
    let (_, bytes) = decode_data_url(data_url)?;
    Ok(Handle::from_bytes(bytes))
}

/// Grey card with a bronze disc, shown for coins without photographs
pub fn placeholder_image() -> RgbaImage {
    let center = THUMBNAIL_SIZE as f32 / 2.0;
    let radius = THUMBNAIL_SIZE as f32 * 0.35;

    RgbaImage::from_fn(THUMBNAIL_SIZE, THUMBNAIL_SIZE, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance > radius {
            Rgba([221, 221, 221, 255])
        } else if distance > radius - 8.0 {
            // rim
            Rgba([140, 106, 58, 255])
        } else {
            Rgba([184, 141, 79, 255])
        }
    })
}

fn to_handle(img: RgbaImage) -> Handle {
    Handle::from_rgba(img.width(), img.height(), img.into_raw())
}

/// Decoded thumbnails for the grid, keyed by coin id
pub struct ThumbnailCache {
    placeholder: Handle,
    thumbs: HashMap<CoinId, Handle>,
}

impl ThumbnailCache {
    pub fn new() -> Self {
        Self {
            placeholder: to_handle(placeholder_image()),
            thumbs: HashMap::new(),
        }
    }

    /// Build a cache for every coin that has a photograph
    pub fn for_coins<'a>(coins: impl IntoIterator<Item = &'a Coin>) -> Self {
        let mut cache = Self::new();
        for coin in coins {
            cache.insert(coin);
        }
        cache
    }

    /// Decode a coin's representative photo.
    ///
    /// Photos that fail to decode fall back to the placeholder.
    pub fn insert(&mut self, coin: &Coin) {
        let Some(data_url) = coin.thumbnail() else {
            return;
        };

        match thumbnail_image(data_url) {
            Ok(img) => {
                self.thumbs.insert(coin.id, to_handle(img));
            }
            Err(e) => warn!("⚠️  No thumbnail for coin {} ({}): {}", coin.id, coin.name, e),
        }
    }

    pub fn remove(&mut self, id: CoinId) {
        self.thumbs.remove(&id);
    }

    /// Thumbnail for a coin, or the placeholder
    pub fn get(&self, id: CoinId) -> &Handle {
        self.thumbs.get(&id).unwrap_or(&self.placeholder)
    }

    pub fn len(&self) -> usize {
        self.thumbs.len()
    }
}

impl Default for ThumbnailCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{encode_data_url, NewCoin};
    use chrono::Utc;
    use image::ImageFormat;
    use std::io::Cursor;

    fn png_data_url(width: u32, height: u32) -> String {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        encode_data_url("image/png", &bytes)
    }

    fn coin_with_images(id: CoinId, images: Vec<String>) -> Coin {
        NewCoin {
            name: "Sestertius".to_string(),
            date: "64 AD".to_string(),
            images,
            ..Default::default()
        }
        .into_coin(id, Utc::now())
    }

    #[test]
    fn test_thumbnail_fits_box_and_keeps_aspect() {
        let thumb = thumbnail_image(&png_data_url(600, 300)).unwrap();
        assert_eq!(thumb.width(), 256);
        assert_eq!(thumb.height(), 128);
    }

    #[test]
    fn test_thumbnail_rejects_garbage() {
        let url = encode_data_url("image/png", b"definitely not a png");
        assert!(matches!(thumbnail_image(&url), Err(ThumbnailError::Decode(_))));
        assert!(matches!(
            thumbnail_image("not a data url"),
            Err(ThumbnailError::Payload(_))
        ));
    }

    #[test]
    fn test_placeholder_has_a_disc() {
        let img = placeholder_image();
        assert_eq!(img.dimensions(), (256, 256));
        assert_eq!(img.get_pixel(0, 0), &Rgba([221, 221, 221, 255]));
        assert_eq!(img.get_pixel(128, 128), &Rgba([184, 141, 79, 255]));
    }

    #[test]
    fn test_cache_only_holds_decodable_photos() {
        let with_photo = coin_with_images(1, vec![png_data_url(40, 40)]);
        let without_photo = coin_with_images(2, Vec::new());
        let broken_photo = coin_with_images(3, vec![encode_data_url("image/png", b"junk")]);

        let mut cache = ThumbnailCache::for_coins([&with_photo, &without_photo, &broken_photo]);
        assert_eq!(cache.len(), 1);

        cache.remove(1);
        assert_eq!(cache.len(), 0);
    }
}
