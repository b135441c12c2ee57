//! QR code rasterization to PNG.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, Rgb, RgbImage};
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

/// Errors raised while turning a URL into an image file.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("Nothing to encode")]
    EmptyInput,

    /// Input rejected by the encoder, usually too long for the EC level.
    #[error("Cannot encode input: {0}")]
    Capacity(#[from] qrcode::types::QrError),

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Cannot write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Visual parameters of the generated code.
#[derive(Debug, Clone, Copy)]
pub struct QrOptions {
    pub ec_level: EcLevel,
    /// Quiet zone width in modules.
    pub margin: u32,
    /// Edge length of the square canvas in pixels.
    pub size: u32,
    pub dark: Rgb<u8>,
    pub light: Rgb<u8>,
}

impl Default for QrOptions {
    /// High error correction, 1-module margin, 400x400, black on white.
    fn default() -> Self {
        Self {
            ec_level: EcLevel::H,
            margin: 1,
            size: 400,
            dark: Rgb([0x00, 0x00, 0x00]),
            light: Rgb([0xff, 0xff, 0xff]),
        }
    }
}

/// Stateless QR renderer with fixed options.
#[derive(Debug, Clone, Default)]
pub struct QrEncoder {
    options: QrOptions,
}

impl QrEncoder {
    pub fn new(options: QrOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &QrOptions {
        &self.options
    }

    /// Encode `target_url` and write the PNG to `destination`.
    pub fn render(&self, target_url: &str, destination: &Path) -> Result<(), EncodingError> {
        let png = render_png(target_url, &self.options)?;
        std::fs::write(destination, png).map_err(|source| EncodingError::Write {
            path: destination.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %destination.display(), "QR code written");
        Ok(())
    }
}

/// Encode `target_url` into PNG bytes. Same input and options, same bytes.
pub fn render_png(target_url: &str, options: &QrOptions) -> Result<Vec<u8>, EncodingError> {
    if target_url.is_empty() {
        return Err(EncodingError::EmptyInput);
    }

    let code = QrCode::with_error_correction_level(target_url.as_bytes(), options.ec_level)?;
    let image = rasterize(&code, options);

    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// Scale the module grid onto the canvas, quiet zone included.
fn rasterize(code: &QrCode, options: &QrOptions) -> RgbImage {
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let total = modules + 2 * options.margin;
    let scale = options.size as f64 / total as f64;

    let module_at = |pixel: u32| -> Option<u32> {
        let index = (pixel as f64 / scale) as u32;
        index
            .checked_sub(options.margin)
            .filter(|&m| m < modules)
    };

    RgbImage::from_fn(options.size, options.size, |x, y| {
        match (module_at(x), module_at(y)) {
            (Some(mx), Some(my)) => {
                match colors[(my * modules + mx) as usize] {
                    Color::Dark => options.dark,
                    Color::Light => options.light,
                }
            }
            _ => options.light,
        }
    })
}
