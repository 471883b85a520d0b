//! Identity provider integration.
//!
//! Sign-in and sign-up go through a hosted identity provider; the signed-in
//! [`Identity`] lives in the session. Sign-in/sign-out transitions are
//! broadcast as [`binding::IdentityEvent`]s so the cart registry can bind and
//! unbind carts without route handlers knowing about it.

pub mod binding;
pub mod error;
pub mod provider;

pub use binding::{IdentityEvent, IdentityEvents, spawn_cart_binding};
pub use error::AuthError;
pub use provider::IdentityClient;

use serde::{Deserialize, Serialize};
use wavecrest_core::IdentityId;

/// A signed-in identity, as stored in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub email: String,
}
