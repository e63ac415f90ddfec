//! Page-level data controllers. Each view owns one or more of these and
//! renders from their state.

mod detail;
mod favorite;
mod list;
mod scroll;
pub mod sources;

pub use detail::{
    merge_known_for, DetailController, DetailSource, DetailState, MovieDetailSource, PersonDetailSource,
    PersonView,
};
pub use favorite::{FavoriteToggle, ToggleOutcome};
pub use list::{FetchOutcome, ListController, ListState, PageSource};
pub use scroll::{CarouselFeed, ScrollTrigger, ScrollTriggerConfig};

pub const MOVIES_PAGE_SIZE: u32 = 10;
pub const POPULAR_PAGE_SIZE: u32 = 10;
pub const TOP_RATED_PAGE_SIZE: u32 = 10;
pub const SEARCH_PAGE_SIZE: u32 = 20;
pub const REVIEWS_PAGE_SIZE: u32 = 5;
pub const FAVORITES_PAGE_SIZE: u32 = 10;
pub const FILMOGRAPHY_PAGE_SIZE: u32 = 10;

pub const DEFAULT_TOP_RATED_CATEGORY: &str = "IMDB_TOP_50";
