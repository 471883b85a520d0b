//! Domain models.

pub mod order;
pub mod session;
pub mod user;

pub use order::Order;
pub use session::{PendingRedirectCheckout, session_keys};
pub use user::UserProfile;
