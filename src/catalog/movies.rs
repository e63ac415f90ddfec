use super::{HttpCatalog, SearchQuery};
use crate::error::ApiResult;
use crate::http::segment;
use crate::models::{MovieDetail, MovieSummary, Review};
use crate::pagination::{CurrentEnvelope, Envelope, LegacyEnvelope, Page};

fn page_params(page: u32, limit: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("limit", limit.to_string())]
}

impl HttpCatalog {
    // `/movies` still answers with the legacy envelope.
    pub(super) async fn fetch_movies(&self, page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        let env: LegacyEnvelope<MovieSummary> =
            self.http.get("/movies", &page_params(page, limit)).await?;
        Ok(env.into_page())
    }

    pub(super) async fn fetch_movie(&self, id: &str) -> ApiResult<MovieDetail> {
        self.http
            .get(&format!("/movies/{}", segment(id)), &[])
            .await
    }

    pub(super) async fn fetch_top_rated(
        &self,
        category: &str,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        let mut params = vec![("category", category.to_string())];
        params.extend(page_params(page, limit));
        let env: CurrentEnvelope<MovieSummary> =
            self.http.get("/movies/top-rated", &params).await?;
        Ok(env.into_page())
    }

    pub(super) async fn fetch_most_popular(
        &self,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        let env: CurrentEnvelope<MovieSummary> = self
            .http
            .get("/movies/most-popular", &page_params(page, limit))
            .await?;
        Ok(env.into_page())
    }

    pub(super) async fn fetch_search(
        &self,
        query: &SearchQuery,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        let (key, value) = query.param();
        let mut params = vec![(key, value.trim().to_string())];
        params.extend(page_params(page, limit));
        let env: CurrentEnvelope<MovieSummary> = self.http.get("/movies/search", &params).await?;
        Ok(env.into_page())
    }

    pub(super) async fn fetch_reviews(
        &self,
        movie_id: &str,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<Review>> {
        let path = format!("/movies/{}/reviews", segment(movie_id));
        let env: CurrentEnvelope<Review> = self.http.get(&path, &page_params(page, limit)).await?;
        Ok(env.into_page())
    }
}
