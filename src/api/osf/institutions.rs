use super::OsfClient;
use super::error::ApiError;
use super::types::{Document, EmbeddedNode, EmbeddedUser, Institution};

pub(crate) trait InstitutionsApi {
    /// Institutions the current user is affiliated with.
    async fn get_user_institutions(&self) -> Result<Vec<Institution>, ApiError>;
    async fn get_primary_institution(&self) -> Result<Option<Institution>, ApiError>;
}

impl InstitutionsApi for OsfClient {
    async fn get_user_institutions(&self) -> Result<Vec<Institution>, ApiError> {
        let url = self.v2_url(&format!("users/{}/", self.page.user_id));
        let doc: Document<EmbeddedUser> =
            self.get_typed(&url, &[("embed", "institutions")]).await?;
        Ok(doc.data.embeds.institutions.data)
    }

    async fn get_primary_institution(&self) -> Result<Option<Institution>, ApiError> {
        let url = self.v2_url(&format!("nodes/{}/", self.page.node_id));
        let doc: Document<EmbeddedNode> = self
            .get_typed(&url, &[("embed", "primary_institution")])
            .await?;
        Ok(doc.data.embeds.primary_institution.data)
    }
}
