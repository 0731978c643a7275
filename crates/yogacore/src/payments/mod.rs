//! Plans, payment links and payment completion

pub mod duration;
pub mod links;
pub mod signature;
pub mod webhook;

pub use duration::parse_plan_duration;
pub use links::{PaymentLinks, PaymentMethod};
pub use signature::{sign, verify_signature, SIGNATURE_HEADER};
pub use webhook::{process_payment_callback, PaymentCallback, PaymentError, PaymentReceipt};
