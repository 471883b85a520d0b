//! User profile domain type.
//!
//! Profiles live in the external document store's `users` collection, keyed
//! by identity ID. The storefront reads them to pre-fill the checkout form;
//! it writes one only at sign-up.

use serde::{Deserialize, Serialize};

/// A saved user profile.
///
/// Every field defaults to an empty string when absent from the stored
/// document; the checkout form treats missing fields the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub phone: String,
}
