//! User profile documents.
//!
//! Profiles live under `/users/{identity}` and prefill the checkout form.
//! Reads go through a short-lived in-process cache since the profile is
//! fetched on every checkout page load.

use tracing::instrument;
use wavecrest_core::IdentityId;

use super::{DocStoreClient, DocStoreError, decode};
use crate::models::UserProfile;

impl DocStoreClient {
    /// Fetch a user profile, from cache when fresh.
    ///
    /// Returns `None` when no profile document exists for the identity.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError`] on transport or API failures.
    #[instrument(skip(self))]
    pub async fn fetch_profile(
        &self,
        identity: &IdentityId,
    ) -> Result<Option<UserProfile>, DocStoreError> {
        if let Some(profile) = self.profiles.get(identity.as_str()).await {
            return Ok(Some(profile));
        }

        let response = self
            .get(&format!("/users/{}", identity.as_str()))
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        match decode::<UserProfile>(status, &text) {
            Ok(profile) => {
                self.profiles
                    .insert(identity.as_str().to_owned(), profile.clone())
                    .await;
                Ok(Some(profile))
            }
            Err(DocStoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write a user profile document, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError`] on transport or API failures.
    #[instrument(skip(self, profile))]
    pub async fn write_profile(
        &self,
        identity: &IdentityId,
        profile: &UserProfile,
    ) -> Result<(), DocStoreError> {
        let response = self
            .put(&format!("/users/{}", identity.as_str()))
            .json(profile)
            .send()
            .await?;
        let status = response.status().as_u16();

        if !(200..300).contains(&status) {
            let text = response.text().await?;
            return Err(DocStoreError::Api {
                status,
                message: text.chars().take(200).collect(),
            });
        }

        self.profiles.invalidate(identity.as_str()).await;
        Ok(())
    }
}
