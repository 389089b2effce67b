//! File ingestion for the add form
//!
//! Picked files are read in full, then embedded into the coin as base64
//! data URLs so the collection never references paths on disk.

use image::ImageFormat;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::state::data::{encode_data_url, MeshPayload, NewCoin};

/// Image types accepted by the photo picker
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Model types accepted by the 3D picker
pub const MODEL_EXTENSIONS: &[&str] = &["glb", "gltf", "obj"];

const OCTET_STREAM: &str = "application/octet-stream";

/// A file the user picked, read fully into memory
#[derive(Debug, Clone, PartialEq)]
pub struct PickedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Files attached to a submission, not yet embedded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachments {
    pub images: Vec<PickedFile>,
    pub model: Option<PickedFile>,
}

/// MIME type of an image, sniffed from its content with the extension as fallback
pub fn image_mime(file: &PickedFile) -> Cow<'static, str> {
    if let Ok(format) = image::guess_format(&file.bytes) {
        match format {
            ImageFormat::Png
            | ImageFormat::Jpeg
            | ImageFormat::Gif
            | ImageFormat::WebP
            | ImageFormat::Bmp => return Cow::Borrowed(format.to_mime_type()),
            _ => {}
        }
    }

    guess_from_name(&file.name)
}

/// Content-type hint recorded alongside a model
pub fn model_content_type(name: &str) -> Cow<'static, str> {
    // mime_guess has no model/* entry for these
    match extension(name).as_str() {
        "glb" => Cow::Borrowed("model/gltf-binary"),
        "obj" => Cow::Borrowed("model/obj"),
        _ => guess_from_name(name),
    }
}

fn guess_from_name(name: &str) -> Cow<'static, str> {
    mime_guess::from_path(name)
        .first()
        .map_or(Cow::Borrowed(OCTET_STREAM), |mime| {
            Cow::Owned(mime.essence_str().to_string())
        })
}

fn extension(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn embed_image(file: &PickedFile) -> String {
    encode_data_url(&image_mime(file), &file.bytes)
}

pub fn embed_model(file: &PickedFile) -> MeshPayload {
    MeshPayload::from_bytes(file.name.clone(), model_content_type(&file.name), &file.bytes)
}

/// Embed every attachment into the submitted coin, keeping the picked order
pub fn embed(mut new_coin: NewCoin, attachments: Attachments) -> NewCoin {
    new_coin
        .images
        .extend(attachments.images.iter().map(embed_image));

    if let Some(model) = &attachments.model {
        new_coin.model_3d = Some(embed_model(model));
    }

    debug!(
        "Embedded {} images{}",
        attachments.images.len(),
        if attachments.model.is_some() { " and a 3D model" } else { "" }
    );
    new_coin
}

/// Embed attachments on the blocking pool; resolves once every file is encoded
pub async fn embed_submission(new_coin: NewCoin, attachments: Attachments) -> Result<NewCoin, String> {
    tokio::task::spawn_blocking(move || embed(new_coin, attachments))
        .await
        .map_err(|e| format!("Task join error: {}", e))
}

/// Show the photo picker and read every selected file
pub async fn pick_images() -> Vec<PickedFile> {
    let Some(handles) = rfd::AsyncFileDialog::new()
        .set_title("Select Coin Photographs")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_files()
        .await
    else {
        return Vec::new();
    };

    let mut files = Vec::with_capacity(handles.len());
    for handle in handles {
        files.push(PickedFile {
            name: handle.file_name(),
            bytes: handle.read().await,
        });
    }

    info!("📸 Picked {} photographs", files.len());
    files
}

/// Show the model picker and read the selected file
pub async fn pick_model() -> Option<PickedFile> {
    let handle = rfd::AsyncFileDialog::new()
        .set_title("Select 3D Model")
        .add_filter("3D models", MODEL_EXTENSIONS)
        .pick_file()
        .await?;

    Some(PickedFile {
        name: handle.file_name(),
        bytes: handle.read().await,
    })
}

/// Show a folder picker
pub async fn pick_folder(title: &str) -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title(title)
        .pick_folder()
        .await
        .map(|handle| handle.path().to_path_buf())
}

/// Ask where to save `bytes`, suggesting `filename`.
///
/// Returns `Ok(None)` when the user cancels the dialog.
pub async fn save_with_dialog(filename: String, bytes: Vec<u8>) -> Result<Option<PathBuf>, String> {
    let Some(handle) = rfd::AsyncFileDialog::new()
        .set_file_name(filename.clone())
        .save_file()
        .await
    else {
        return Ok(None);
    };

    let path = handle.path().to_path_buf();
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;

    info!("💾 Saved {} to {}", filename, path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::decode_data_url;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn file(name: &str, bytes: &[u8]) -> PickedFile {
        PickedFile {
            name: name.to_string(),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_image_mime_prefers_content() {
        // A PNG with the wrong extension is still a PNG
        assert_eq!(image_mime(&file("photo.jpg", &PNG_SIGNATURE)), "image/png");
        assert_eq!(image_mime(&file("photo.JPEG", b"not an image")), "image/jpeg");
        assert_eq!(image_mime(&file("photo.webp", b"RIFF")), "image/webp");
        assert_eq!(image_mime(&file("photo", b"???")), "application/octet-stream");
    }

    #[test]
    fn test_model_content_type() {
        assert_eq!(model_content_type("coin.glb"), "model/gltf-binary");
        assert_eq!(model_content_type("coin.GLTF"), "model/gltf+json");
        assert_eq!(model_content_type("coin.obj"), "model/obj");
        assert_eq!(model_content_type("coin.bin"), "application/octet-stream");
        assert_eq!(model_content_type("coin"), "application/octet-stream");
    }

    #[test]
    fn test_embed_keeps_order_and_model() {
        let new_coin = NewCoin {
            name: "Drachm".to_string(),
            date: "200 BC".to_string(),
            ..Default::default()
        };
        let attachments = Attachments {
            images: vec![file("front.png", &PNG_SIGNATURE), file("back.bmp", b"BM..")],
            model: Some(file("drachm.obj", b"v 0 0 0\n")),
        };

        let embedded = embed(new_coin, attachments);

        assert_eq!(embedded.images.len(), 2);
        assert!(embedded.images[0].starts_with("data:image/png;base64,"));
        assert!(embedded.images[1].starts_with("data:image/bmp;base64,"));
        let (_, back) = decode_data_url(&embedded.images[1]).unwrap();
        assert_eq!(back, b"BM..".to_vec());

        let model = embedded.model_3d.unwrap();
        assert_eq!(model.name, "drachm.obj");
        assert_eq!(model.content_type, "model/obj");
        assert_eq!(model.bytes().unwrap(), b"v 0 0 0\n".to_vec());
    }

    #[tokio::test]
    async fn test_embed_submission_without_files() {
        let new_coin = NewCoin {
            name: "Denarius".to_string(),
            date: "100 BC".to_string(),
            ..Default::default()
        };

        let embedded = embed_submission(new_coin.clone(), Attachments::default())
            .await
            .unwrap();
        assert_eq!(embedded, new_coin);
    }
}
