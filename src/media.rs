//! Recipe image intake: multipart extraction, decode validation and
//! filesystem persistence under the configured media root.

use std::path::Path;

use bytes::BufMut;
use futures::TryStreamExt;
use image::ImageFormat;
use uuid::Uuid;
use warp::multipart::FormData;

use crate::error::ApiError;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Collects the bytes of the `image` multipart field.
pub async fn read_image_part(mut form: FormData) -> Result<Vec<u8>, ApiError> {
    while let Some(part) = form
        .try_next()
        .await
        .map_err(|_| ApiError::validation("image", INVALID_IMAGE))?
    {
        if part.name() != "image" {
            continue;
        }

        let data = part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| async move {
                acc.put(buf);
                Ok(acc)
            })
            .await
            .map_err(|_| ApiError::validation("image", INVALID_IMAGE))?;

        return Ok(data);
    }

    Err(ApiError::validation("image", "No file was submitted."))
}

/// The payload must decode as a real image, not merely carry an image
/// extension or content type.
pub fn validate_image(data: &[u8]) -> Result<ImageFormat, ApiError> {
    let format =
        image::guess_format(data).map_err(|_| ApiError::validation("image", INVALID_IMAGE))?;
    image::load_from_memory_with_format(data, format)
        .map_err(|_| ApiError::validation("image", INVALID_IMAGE))?;

    Ok(format)
}

/// Validates and persists the image, returning the media-relative reference
/// stored on the recipe. Filenames are random so uploads never collide.
pub async fn store_recipe_image(media_root: &Path, data: &[u8]) -> Result<String, ApiError> {
    let format = validate_image(data)?;
    let ext = format.extensions_str().first().copied().unwrap_or("img");
    let reference = format!("recipe/{}.{}", Uuid::new_v4(), ext);
    let path = media_root.join(&reference);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ApiError::Internal(format!("{e}")))?;
    }
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| ApiError::Internal(format!("{e}")))?;

    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn accepts_a_real_png() {
        assert_eq!(validate_image(&png_bytes()).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn rejects_non_image_payloads() {
        assert!(validate_image(b"not_an_image").is_err());
        // right magic bytes, garbage body
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend_from_slice(b"garbage");
        assert!(validate_image(&data).is_err());
    }

    #[tokio::test]
    async fn stores_image_under_media_root() {
        let media_root = std::env::temp_dir().join(format!("recette-test-{}", Uuid::new_v4()));
        let reference = store_recipe_image(&media_root, &png_bytes()).await.unwrap();

        assert!(reference.starts_with("recipe/"));
        assert!(reference.ends_with(".png"));
        assert!(media_root.join(&reference).exists());

        tokio::fs::remove_dir_all(&media_root).await.unwrap();
    }
}
