use super::HttpCatalog;
use crate::error::ApiResult;
use crate::http::segment;
use crate::models::PersonDetail;

impl HttpCatalog {
    pub(super) async fn fetch_person(&self, id: &str) -> ApiResult<PersonDetail> {
        self.http
            .get(&format!("/persons/{}", segment(id)), &[])
            .await
    }
}
