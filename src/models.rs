use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rate: Option<f32>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_office_revenue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub character: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub summary: MovieSummary,
    #[serde(default)]
    pub plot_full: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub awards: Option<String>,
    #[serde(default)]
    pub box_office: Option<serde_json::Value>,
    #[serde(default)]
    pub ratings: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub directors: Vec<PersonRef>,
    #[serde(default)]
    pub actors: Vec<CastMember>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub similar_movies: Vec<MovieSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownForCredit {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub death_date: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub awards: Option<String>,
    #[serde(default)]
    pub known_for: Vec<KnownForCredit>,
}

/// One movie in a person's filmography, with every role they had in it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownForMovie {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub image: Option<String>,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub username: String,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub rate: Option<f32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub warning_spoilers: bool,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxOffice {
    #[serde(rename = "cumulativeWorldwideGross", default)]
    pub cumulative_worldwide_gross: Option<String>,
}

/// Favorite as returned by `/users/favorites`; a differently shaped movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteMovie {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_rating")]
    pub imdb_rating: Option<f32>,
    #[serde(default)]
    pub external_ratings: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub box_office: Option<BoxOffice>,
}

impl From<FavoriteMovie> for MovieSummary {
    fn from(fav: FavoriteMovie) -> Self {
        // A zero rating means "unrated" upstream.
        let rate = fav
            .imdb_rating
            .filter(|r| *r != 0.0)
            .or_else(|| fav.external_ratings.get("imDb").and_then(rating_from_value))
            .unwrap_or(0.0);
        MovieSummary {
            id: fav.id,
            title: fav.title,
            year: fav.release_year,
            image: fav.image_url,
            rate: Some(rate),
            short_description: fav.plot,
            genres: fav.keywords.unwrap_or_default(),
            box_office_revenue: fav.box_office.and_then(|b| b.cumulative_worldwide_gross),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: UserProfile,
    #[serde(default)]
    pub token: Option<String>,
}

/// `{ success, message, data }` wrapper used by the user endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Ratings show up as numbers or numeric strings depending on the endpoint.
fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(rating_from_value))
}

fn rating_from_value(value: &serde_json::Value) -> Option<f32> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(|v| v as f32),
        serde_json::Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }
}
