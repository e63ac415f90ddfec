//! Page sources for every paginated view, and constructors wiring them to
//! controllers with the page sizes each view uses.

use async_trait::async_trait;
use std::sync::Arc;

use super::list::{ListController, PageSource};
use super::{
    DEFAULT_TOP_RATED_CATEGORY, FAVORITES_PAGE_SIZE, FILMOGRAPHY_PAGE_SIZE, MOVIES_PAGE_SIZE,
    POPULAR_PAGE_SIZE, REVIEWS_PAGE_SIZE, SEARCH_PAGE_SIZE, TOP_RATED_PAGE_SIZE,
};
use crate::catalog::{CatalogApi, SearchQuery};
use crate::error::{ApiError, ApiResult};
use crate::models::{MovieSummary, Review};
use crate::pagination::{Page, Pagination};
use crate::session::Session;

pub struct MoviesSource {
    api: Arc<dyn CatalogApi>,
}

#[async_trait]
impl PageSource for MoviesSource {
    type Item = MovieSummary;
    type Query = ();

    async fn fetch_page(&self, _: &(), page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        self.api.list_movies(page, limit).await
    }
}

pub struct PopularSource {
    api: Arc<dyn CatalogApi>,
}

#[async_trait]
impl PageSource for PopularSource {
    type Item = MovieSummary;
    type Query = ();

    async fn fetch_page(&self, _: &(), page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        self.api.most_popular(page, limit).await
    }
}

/// Query is the category, e.g. `IMDB_TOP_50`.
pub struct TopRatedSource {
    api: Arc<dyn CatalogApi>,
}

#[async_trait]
impl PageSource for TopRatedSource {
    type Item = MovieSummary;
    type Query = String;

    async fn fetch_page(
        &self,
        category: &String,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        self.api.top_rated(category, page, limit).await
    }
}

pub struct SearchSource {
    api: Arc<dyn CatalogApi>,
}

#[async_trait]
impl PageSource for SearchSource {
    type Item = MovieSummary;
    type Query = SearchQuery;

    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page: u32,
        limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        // Nothing typed yet: show an empty result without a round trip.
        if query.is_blank() {
            return Ok(empty_page(page, limit));
        }
        self.api.search(query, page, limit).await
    }
}

/// Query is the movie id.
pub struct ReviewsSource {
    api: Arc<dyn CatalogApi>,
}

#[async_trait]
impl PageSource for ReviewsSource {
    type Item = Review;
    type Query = String;

    async fn fetch_page(&self, movie_id: &String, page: u32, limit: u32) -> ApiResult<Page<Review>> {
        self.api.reviews(movie_id, page, limit).await
    }
}

/// The favorites endpoint returns the whole list; pages are cut locally.
pub struct FavoritesSource {
    api: Arc<dyn CatalogApi>,
    session: Session,
}

#[async_trait]
impl PageSource for FavoritesSource {
    type Item = MovieSummary;
    type Query = ();

    async fn fetch_page(&self, _: &(), page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        if !self.session.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        let all: Vec<MovieSummary> = self
            .api
            .favorites()
            .await?
            .into_iter()
            .map(MovieSummary::from)
            .collect();
        Ok(Page::from_full_list(&all, page, limit))
    }
}

/// Client-side pagination over a list that is already in memory.
pub struct VecSource<T> {
    items: Vec<T>,
}

impl<T> VecSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> PageSource for VecSource<T> {
    type Item = T;
    type Query = ();

    async fn fetch_page(&self, _: &(), page: u32, limit: u32) -> ApiResult<Page<T>> {
        Ok(Page::from_full_list(&self.items, page, limit))
    }
}

fn empty_page<T>(page: u32, limit: u32) -> Page<T> {
    Page {
        items: Vec::new(),
        pagination: Pagination {
            total_items: 0,
            current_page: page,
            total_pages: 0,
            page_size: limit,
        },
    }
}

pub fn movies_list(api: Arc<dyn CatalogApi>) -> ListController<MoviesSource> {
    ListController::new(MoviesSource { api }, MOVIES_PAGE_SIZE, ())
}

pub fn popular_list(api: Arc<dyn CatalogApi>) -> ListController<PopularSource> {
    ListController::new(PopularSource { api }, POPULAR_PAGE_SIZE, ())
}

pub fn top_rated_list(api: Arc<dyn CatalogApi>) -> ListController<TopRatedSource> {
    ListController::new(
        TopRatedSource { api },
        TOP_RATED_PAGE_SIZE,
        DEFAULT_TOP_RATED_CATEGORY.to_string(),
    )
}

pub fn search_list(api: Arc<dyn CatalogApi>) -> ListController<SearchSource> {
    ListController::new(SearchSource { api }, SEARCH_PAGE_SIZE, SearchQuery::default())
}

pub fn reviews_list(api: Arc<dyn CatalogApi>, movie_id: &str) -> ListController<ReviewsSource> {
    ListController::new(ReviewsSource { api }, REVIEWS_PAGE_SIZE, movie_id.to_string())
}

pub fn favorites_list(
    api: Arc<dyn CatalogApi>,
    session: Session,
) -> ListController<FavoritesSource> {
    ListController::new(FavoritesSource { api, session }, FAVORITES_PAGE_SIZE, ())
}

pub fn filmography_list<T: Clone + Send + Sync + 'static>(items: Vec<T>) -> ListController<VecSource<T>> {
    ListController::new(VecSource::new(items), FILMOGRAPHY_PAGE_SIZE, ())
}
