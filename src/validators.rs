use std::path::{Path, PathBuf};

use image::{io::Reader as ImageReader, ImageFormat};
use tracing::{error, info, warn};

use crate::{config::Settings, error::ApiError};

/// Checks size, then extension. Returns the lower-cased extension the file
/// will be stored under.
pub fn validate_file_upload(
    settings: &Settings,
    filename: &str,
    file_size: usize,
) -> Result<String, ApiError> {
    if file_size > settings.max_file_size {
        warn!(
            "File size exceeds limit: {} > {}",
            file_size, settings.max_file_size
        );
        return Err(ApiError::PayloadTooLarge {
            max_mb: settings.max_file_size as f64 / 1024.0 / 1024.0,
        });
    }

    let extension = file_extension(filename).unwrap_or_default();
    if !settings.allowed_extensions.contains(&extension) {
        warn!("Invalid file extension: {:?}", extension);
        return Err(ApiError::InvalidFileType {
            allowed: settings.allowed_extensions.clone(),
        });
    }

    Ok(extension)
}

/// Lower-cased extension after the last dot, if the name has one.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Re-opens a stored file and fully decodes it. Blocking.
pub fn validate_image(path: &Path) -> Result<ImageFormat, ApiError> {
    match decode(path) {
        Ok(format) => {
            info!("Image validation successful: {}", path.display());
            Ok(format)
        }
        Err(reason) => {
            error!("Image validation failed for {}: {}", path.display(), reason);
            Err(ApiError::InvalidImage)
        }
    }
}

pub async fn validate_image_async(path: PathBuf) -> Result<ImageFormat, ApiError> {
    tokio::task::spawn_blocking(move || validate_image(&path))
        .await
        .map_err(|err| {
            error!("Image validation task failed: {}", err);
            ApiError::Internal {
                operation: "process upload",
            }
        })?
}

fn decode(path: &Path) -> Result<ImageFormat, Box<dyn std::error::Error>> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format().ok_or("unrecognised image format")?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(format!("unsupported image format {:?}", format).into());
    }
    reader.decode()?;
    Ok(format)
}
