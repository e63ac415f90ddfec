use chrono::NaiveDate;
use moviedeck::auth::Auth;
use moviedeck::catalog::{CatalogApi, SearchQuery};
use moviedeck::controller::{sources, FavoriteToggle, FetchOutcome, ToggleOutcome};
use moviedeck::models::{
    AuthPayload, FavoriteMovie, MovieDetail, MovieSummary, PersonDetail, Review, UserProfile,
};
use moviedeck::pagination::Page;
use moviedeck::session::{AuthEvent, Session};
use moviedeck::validation::{LoginForm, ProfileForm, SignupForm};
use moviedeck::{ApiError, ApiResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// In-memory catalog that records what was called.
#[derive(Default)]
struct FakeCatalog {
    calls: Mutex<Vec<String>>,
    favorites: Mutex<Vec<String>>,
    fail_favorites: AtomicBool,
    /// When set, add/remove wait for a notification before answering.
    hold: Option<Arc<Notify>>,
    issue_token: bool,
}

impl FakeCatalog {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn called(&self, what: impl Into<String>) {
        self.calls.lock().unwrap().push(what.into());
    }

    async fn wait_if_held(&self) {
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
    }
}

fn summary(id: &str) -> MovieSummary {
    MovieSummary {
        id: id.to_string(),
        title: format!("Movie {id}"),
        year: Some(2001),
        image: None,
        rate: Some(7.0),
        short_description: None,
        genres: Vec::new(),
        box_office_revenue: None,
    }
}

fn user(username: &str) -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        phone: "0912345678".to_string(),
        dob: None,
        role: None,
    }
}

#[async_trait::async_trait]
impl CatalogApi for FakeCatalog {
    async fn list_movies(&self, page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        self.called(format!("movies {page}"));
        let all: Vec<MovieSummary> = (0..30).map(|i| summary(&format!("m{i}"))).collect();
        Ok(Page::from_full_list(&all, page, limit))
    }

    async fn movie(&self, id: &str) -> ApiResult<MovieDetail> {
        Err(ApiError::Decode {
            path: format!("/movies/{id}"),
            reason: "not used".to_string(),
        })
    }

    async fn top_rated(
        &self,
        category: &str,
        page: u32,
        _limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        self.called(format!("top-rated {category} {page}"));
        Ok(Page::from_full_list(&[summary("tt1")], 1, 10))
    }

    async fn most_popular(&self, page: u32, limit: u32) -> ApiResult<Page<MovieSummary>> {
        self.list_movies(page, limit).await
    }

    async fn search(
        &self,
        query: &SearchQuery,
        page: u32,
        _limit: u32,
    ) -> ApiResult<Page<MovieSummary>> {
        self.called(format!("search {query} {page}"));
        Ok(Page::from_full_list(&[summary("tt1")], 1, 20))
    }

    async fn reviews(&self, movie_id: &str, page: u32, limit: u32) -> ApiResult<Page<Review>> {
        self.called(format!("reviews {movie_id} {page}"));
        let all: Vec<Review> = (0..7)
            .map(|i| Review {
                id: i,
                username: format!("user{i}"),
                rate: Some(8.0),
                title: "Great".to_string(),
                content: "Loved it".to_string(),
                warning_spoilers: false,
                date: None,
            })
            .collect();
        Ok(Page::from_full_list(&all, page, limit))
    }

    async fn person(&self, id: &str) -> ApiResult<PersonDetail> {
        Err(ApiError::Decode {
            path: format!("/persons/{id}"),
            reason: "not used".to_string(),
        })
    }

    async fn register(&self, form: &SignupForm) -> ApiResult<AuthPayload> {
        self.called(format!("register {}", form.username));
        Ok(AuthPayload {
            user: user(&form.username),
            token: self.issue_token.then(|| "tok-new".to_string()),
        })
    }

    async fn login(&self, form: &LoginForm) -> ApiResult<AuthPayload> {
        self.called(format!("login {}", form.username));
        Ok(AuthPayload {
            user: user(&form.username),
            token: Some("tok-login".to_string()),
        })
    }

    async fn profile(&self) -> ApiResult<UserProfile> {
        self.called("profile");
        Ok(user("neo"))
    }

    async fn update_profile(&self, form: &ProfileForm) -> ApiResult<UserProfile> {
        self.called("update-profile");
        let mut updated = user("neo");
        updated.email = form.email.clone();
        Ok(updated)
    }

    async fn favorites(&self) -> ApiResult<Vec<FavoriteMovie>> {
        self.called("favorites");
        let ids = self.favorites.lock().unwrap().clone();
        Ok(ids
            .into_iter()
            .map(|id| FavoriteMovie {
                title: format!("Favorite {id}"),
                id,
                release_year: Some(1999),
                image_url: None,
                imdb_rating: Some(8.0),
                external_ratings: HashMap::new(),
                plot: None,
                keywords: None,
                box_office: None,
            })
            .collect())
    }

    async fn add_favorite(&self, movie_id: &str) -> ApiResult<()> {
        self.called(format!("add {movie_id}"));
        self.wait_if_held().await;
        if self.fail_favorites.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        self.favorites.lock().unwrap().push(movie_id.to_string());
        Ok(())
    }

    async fn remove_favorite(&self, movie_id: &str) -> ApiResult<()> {
        self.called(format!("remove {movie_id}"));
        self.wait_if_held().await;
        if self.fail_favorites.load(Ordering::SeqCst) {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        self.favorites.lock().unwrap().retain(|f| f != movie_id);
        Ok(())
    }
}

#[tokio::test]
async fn toggle_flips_only_after_success() {
    let api = FakeCatalog::default();
    let toggle = FavoriteToggle::new("tt0133093", false);

    assert_eq!(toggle.toggle(&api).await, ToggleOutcome::Added);
    assert!(toggle.is_favorite());

    api.fail_favorites.store(true, Ordering::SeqCst);
    let outcome = toggle.toggle(&api).await;
    assert_eq!(
        outcome,
        ToggleOutcome::Failed("Network error - no response from server".to_string())
    );
    assert!(toggle.is_favorite());
    assert!(!toggle.is_busy());

    api.fail_favorites.store(false, Ordering::SeqCst);
    assert_eq!(toggle.toggle(&api).await, ToggleOutcome::Removed);
    assert!(!toggle.is_favorite());
    assert_eq!(
        api.calls(),
        vec!["add tt0133093", "remove tt0133093", "remove tt0133093"]
    );
}

#[tokio::test]
async fn concurrent_toggle_is_rejected() {
    let hold = Arc::new(Notify::new());
    let api = Arc::new(FakeCatalog {
        hold: Some(hold.clone()),
        ..Default::default()
    });
    let toggle = Arc::new(FavoriteToggle::new("tt0133093", false));

    let first = tokio::spawn({
        let api = api.clone();
        let toggle = toggle.clone();
        async move { toggle.toggle(api.as_ref()).await }
    });
    while !toggle.is_busy() {
        tokio::task::yield_now().await;
    }

    assert_eq!(toggle.toggle(api.as_ref()).await, ToggleOutcome::Busy);
    hold.notify_one();
    assert_eq!(first.await.unwrap(), ToggleOutcome::Added);
    assert_eq!(api.calls(), vec!["add tt0133093"]);
}

#[tokio::test]
async fn invalid_forms_never_reach_the_backend() {
    let api = Arc::new(FakeCatalog::default());
    let auth = Auth::new(api.clone(), Session::in_memory());

    let err = auth
        .login(&LoginForm {
            username: "ne".to_string(),
            password: "12345".to_string(),
            remember_me: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(
        err.user_message(),
        "password: Password must be at least 6 characters; username: Username must be at least 3 characters"
    );

    let signup = SignupForm {
        username: "neo".to_string(),
        email: "neo@example.com".to_string(),
        password: "RedPill1".to_string(),
        phone: "0912345678".to_string(),
        dob: chrono::Local::now().date_naive(),
    };
    assert!(auth.register(&signup).await.is_err());
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn login_and_logout_publish_events() {
    let api = Arc::new(FakeCatalog::default());
    let session = Session::in_memory();
    let mut events = session.subscribe();
    let auth = Auth::new(api.clone(), session.clone());

    auth.login(&LoginForm {
        username: "neo".to_string(),
        password: "RedPill1".to_string(),
        remember_me: true,
    })
    .await
    .unwrap();
    assert_eq!(session.token().as_deref(), Some("tok-login"));
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedIn);

    auth.logout();
    assert!(!session.is_authenticated());
    assert_eq!(events.recv().await.unwrap(), AuthEvent::SignedOut);

    let err = auth.profile().await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated));
}

#[tokio::test]
async fn register_signs_in_only_when_a_token_comes_back() {
    let form = SignupForm {
        username: "trinity".to_string(),
        email: "trinity@example.com".to_string(),
        password: "Follow1Rabbit".to_string(),
        phone: "+84 912 345678".to_string(),
        dob: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
    };

    let without = Auth::new(Arc::new(FakeCatalog::default()), Session::in_memory());
    without.register(&form).await.unwrap();
    assert!(!without.session().is_authenticated());

    let with = Auth::new(
        Arc::new(FakeCatalog {
            issue_token: true,
            ..Default::default()
        }),
        Session::in_memory(),
    );
    let created = with.register(&form).await.unwrap();
    assert_eq!(created.username, "trinity");
    assert_eq!(with.session().token().as_deref(), Some("tok-new"));
}

#[tokio::test]
async fn favorites_view_needs_a_session_and_drops_removed_cards() {
    let api = Arc::new(FakeCatalog::default());
    api.favorites
        .lock()
        .unwrap()
        .extend(["a", "b", "c"].map(String::from));

    let session = Session::in_memory();
    let list = sources::favorites_list(api.clone(), session.clone());
    let err = list.load_first().await.unwrap_err();
    assert!(matches!(err, ApiError::NotAuthenticated));
    assert!(list.snapshot().error.is_some());

    session.sign_in("tok");
    list.load_first().await.unwrap();
    assert_eq!(list.items().len(), 3);

    let toggle = FavoriteToggle::new("b", true);
    if toggle.toggle(api.as_ref()).await == ToggleOutcome::Removed {
        list.retain(|m| m.id != toggle.movie_id());
    }
    let ids: Vec<String> = list.items().into_iter().map(|m| m.id).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert_eq!(list.snapshot().total_items, 2);
}

#[tokio::test]
async fn blank_search_sends_nothing() {
    let api = Arc::new(FakeCatalog::default());
    let list = sources::search_list(api.clone());
    let outcome = list
        .set_query(SearchQuery::Person("   ".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { received: 0 });
    assert!(api.calls().is_empty());

    list.set_query(SearchQuery::Person("Keanu".to_string()))
        .await
        .unwrap();
    assert_eq!(api.calls(), vec!["search person=Keanu 1"]);
}

#[tokio::test]
async fn reviews_page_five_at_a_time() {
    let api = Arc::new(FakeCatalog::default());
    let list = sources::reviews_list(api.clone(), "tt0133093");
    list.load_first().await.unwrap();
    assert_eq!(list.items().len(), 5);
    list.load_more().await.unwrap();
    assert_eq!(list.items().len(), 7);
    assert!(!list.snapshot().has_more);
    assert_eq!(
        api.calls(),
        vec!["reviews tt0133093 1", "reviews tt0133093 2"]
    );
}

#[tokio::test]
async fn top_rated_sends_the_category() {
    let api = Arc::new(FakeCatalog::default());
    let list = sources::top_rated_list(api.clone());
    list.load_first().await.unwrap();
    list.set_query("TOP_250_TV".to_string()).await.unwrap();
    assert_eq!(
        api.calls(),
        vec!["top-rated IMDB_TOP_50 1", "top-rated TOP_250_TV 1"]
    );
}
