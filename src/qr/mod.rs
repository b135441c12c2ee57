//! QR code generation.

pub mod encoder;

pub use encoder::{render_png, EncodingError, QrEncoder, QrOptions};
