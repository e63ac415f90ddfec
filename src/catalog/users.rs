use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::HttpCatalog;
use crate::error::{ApiError, ApiResult};
use crate::http::segment;
use crate::models::{ApiResponse, AuthPayload, FavoriteMovie, UserProfile};
use crate::validation::{LoginForm, ProfileForm, SignupForm};

impl HttpCatalog {
    pub(super) async fn post_register(&self, form: &SignupForm) -> ApiResult<AuthPayload> {
        self.user_call(Method::POST, "/users/register", Some(form)).await
    }

    pub(super) async fn post_login(&self, form: &LoginForm) -> ApiResult<AuthPayload> {
        self.user_call(Method::POST, "/users/login", Some(form)).await
    }

    pub(super) async fn fetch_profile(&self) -> ApiResult<UserProfile> {
        self.user_call(Method::GET, "/users/profile", None::<&()>)
            .await
    }

    pub(super) async fn patch_profile(&self, form: &ProfileForm) -> ApiResult<UserProfile> {
        self.user_call(Method::PATCH, "/users/profile", Some(form))
            .await
    }

    pub(super) async fn fetch_favorites(&self) -> ApiResult<Vec<FavoriteMovie>> {
        self.user_call(Method::GET, "/users/favorites", None::<&()>)
            .await
    }

    pub(super) async fn set_favorite(&self, movie_id: &str, favorite: bool) -> ApiResult<()> {
        let method = if favorite {
            Method::POST
        } else {
            Method::DELETE
        };
        let path = format!("/users/favorites/{}", segment(movie_id));
        self.http.send_unit(method, &path, None::<&()>).await
    }

    async fn user_call<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let wrapped: ApiResponse<T> = self.http.send(method, path, &[], body).await?;
        unwrap_data(path, wrapped)
    }
}

fn unwrap_data<T>(path: &str, wrapped: ApiResponse<T>) -> ApiResult<T> {
    wrapped.data.ok_or_else(|| ApiError::Decode {
        path: path.to_string(),
        reason: wrapped
            .message
            .unwrap_or_else(|| "response carried no data".to_string()),
    })
}
