//! PNG output for rendered frames.

use std::path::Path;

use thiserror::Error;

use crate::ImageBuffer;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image buffer holds {actual} pixels, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Write `image` as an 8-bit RGB PNG, clamping every channel to `0..=255`.
///
/// Missing parent directories are created.
pub fn write_png(path: impl AsRef<Path>, image: &ImageBuffer) -> Result<(), OutputError> {
    let path = path.as_ref();
    let expected = image.width as usize * image.height as usize;
    if image.pixels.len() != expected {
        return Err(OutputError::BufferSize {
            expected,
            actual: image.pixels.len(),
        });
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image::save_buffer_with_format(
        path,
        &image.to_rgb8(),
        image.width,
        image.height,
        image::ColorType::Rgb8,
        image::ImageFormat::Png,
    )?;

    log::info!("Wrote {}", path.display());
    Ok(())
}
