//! Shared type definitions.

pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use email::{Email, EmailError};
pub use id::{IdentityId, OrderId, ProductId};
pub use money::{CURRENCY_CODE, CURRENCY_SYMBOL, format_amount, line_total};
pub use status::{OrderStatus, PaymentMethod};
