//! Profile endpoints.

use tracing::instrument;

use praxia_core::Result;
use praxia_core::error::InvalidInputError;
use praxia_core::models::{ConfirmGenderResponse, ProfileUpdate, UserProfile};

use crate::client::ApiClient;
use crate::endpoints;
use crate::request::{ApiRequest, FilePart, MultipartForm};

/// Profile endpoints.
#[derive(Debug, Clone, Copy)]
pub struct ProfileApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProfileApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<UserProfile> {
        self.client.request(ApiRequest::get(endpoints::PROFILE)).await
    }

    /// Update the editable profile fields. Unset fields are left unchanged.
    #[instrument(skip(self))]
    pub async fn update(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(InvalidInputError::Other {
                message: "profile update contains no fields".to_string(),
            }
            .into());
        }

        let request = ApiRequest::patch(endpoints::PROFILE).json(update)?;
        self.client.request(request).await
    }

    /// Lock the profile's gender so it can no longer be edited.
    #[instrument(skip(self))]
    pub async fn confirm_gender(&self) -> Result<ConfirmGenderResponse> {
        self.client
            .request(ApiRequest::post(endpoints::CONFIRM_GENDER))
            .await
    }

    #[instrument(skip(self, picture), fields(file = %picture.file_name))]
    pub async fn upload_picture(&self, picture: FilePart) -> Result<UserProfile> {
        let form = MultipartForm::new().file("profile_picture", picture);
        let request = ApiRequest::patch(endpoints::PROFILE).multipart(form);
        self.client.request(request).await
    }
}
