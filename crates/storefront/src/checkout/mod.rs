//! Checkout: shipping form and order submission.

pub mod form;
pub mod submission;

pub use form::{CheckoutForm, RequiredField};
pub use submission::{CheckoutError, OrderSubmission};
