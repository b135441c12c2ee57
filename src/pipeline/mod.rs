//! Request-to-delivery orchestration for QR emails.
//!
//! # Data Flow
//! ```text
//! SendEmailBody
//!     → request.rs (validation, default URL)
//!     → email.rs (allocate → render → compose → send → remove)
//!     → DeliveryResult
//! ```

pub mod email;
pub mod request;

pub use email::{EmailPipeline, PipelineError};
pub use request::{EmailRequest, SendEmailBody, ValidationError};
