use async_trait::async_trait;
use std::fmt;

use crate::error::ApiResult;
use crate::http::ApiClient;
use crate::models::{AuthPayload, FavoriteMovie, MovieDetail, MovieSummary, PersonDetail, Review, UserProfile};
use crate::pagination::Page;
use crate::validation::{LoginForm, ProfileForm, SignupForm};

mod movies;
mod persons;
mod users;

/// Every endpoint of the catalog backend the client uses.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_movies(&self, page: u32, limit: u32) -> ApiResult<Page<MovieSummary>>;
    async fn movie(&self, id: &str) -> ApiResult<MovieDetail>;
    async fn top_rated(
        &self,
        category: &str,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>>;
    async fn most_popular(&self, page: u32, limit: u32) -> ApiResult<Page<MovieSummary>>;
    async fn search(
        &self,
        query: &SearchQuery,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>>;
    async fn reviews(&self, movie_id: &str, page: u32, limit: u32) -> ApiResult<Page<Review>>;
    async fn person(&self, id: &str) -> ApiResult<PersonDetail>;

    async fn register(&self, form: &SignupForm) -> ApiResult<AuthPayload>;
    async fn login(&self, form: &LoginForm) -> ApiResult<AuthPayload>;
    async fn profile(&self) -> ApiResult<UserProfile>;
    async fn update_profile(&self, form: &ProfileForm) -> ApiResult<UserProfile>;
    async fn favorites(&self) -> ApiResult<Vec<FavoriteMovie>>;
    async fn add_favorite(&self, movie_id: &str) -> ApiResult<()>;
    async fn remove_favorite(&self, movie_id: &str) -> ApiResult<()>;
}

/// Search by movie title or by a person's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    Title(String),
    Person(String),
}

impl SearchQuery {
    pub fn param(&self) -> (&'static str, &str) {
        match self {
            SearchQuery::Title(t) => ("title", t.as_str()),
            SearchQuery::Person(p) => ("person", p.as_str()),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.param().1.trim().is_empty()
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery::Title(String::new())
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (key, value) = self.param();
        write!(f, "{key}={value}")
    }
}

/// [`CatalogApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpCatalog {
    http: ApiClient,
}

impl HttpCatalog {
    pub fn new(http: ApiClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &ApiClient {
        &self.http
    }
}

#[async_trait]
impl CatalogApi for HttpCatalog {
    async fn list_movies(&self, page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        self.fetch_movies(page, limit).await
    }

    async fn movie(&self, id: &str) -> ApiResult<MovieDetail> {
        self.fetch_movie(id).await
    }

    async fn top_rated(
        &self,
        category: &str,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        self.fetch_top_rated(category, page, limit).await
    }

    async fn most_popular(&self, page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        self.fetch_most_popular(page, limit).await
    }

    async fn search(
        &self,
        query: &SearchQuery,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        self.fetch_search(query, page, limit).await
    }

    async fn reviews(&self, movie_id: &str, page: u32, limit: u32) -> ApiResult<Page<Review>> {
        self.fetch_reviews(movie_id, page, limit).await
    }

    async fn person(&self, id: &str) -> ApiResult<PersonDetail> {
        self.fetch_person(id).await
    }

    async fn register(&self, form: &SignupForm) -> ApiResult<AuthPayload> {
        self.post_register(form).await
    }

    async fn login(&self, form: &LoginForm) -> ApiResult<AuthPayload> {
        self.post_login(form).await
    }

    async fn profile(&self) -> ApiResult<UserProfile> {
        self.fetch_profile().await
    }

    async fn update_profile(&self, form: &ProfileForm) -> ApiResult<UserProfile> {
        self.patch_profile(form).await
    }

    async fn favorites(&self) -> ApiResult<Vec<FavoriteMovie>> {
        self.fetch_favorites().await
    }

    async fn add_favorite(&self, movie_id: &str) -> ApiResult<()> {
        self.set_favorite(movie_id, true).await
    }

    async fn remove_favorite(&self, movie_id: &str) -> ApiResult<()> {
        self.set_favorite(movie_id, false).await
    }
}
