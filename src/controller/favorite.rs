use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::catalog::CatalogApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// A toggle for this movie is already running.
    Busy,
    Failed(String),
}

/// Favorite state of one movie card.
#[derive(Debug)]
pub struct FavoriteToggle {
    movie_id: String,
    favorite: AtomicBool,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl FavoriteToggle {
    pub fn new(movie_id: impl Into<String>, favorite: bool) -> Self {
        Self {
            movie_id: movie_id.into(),
            favorite: AtomicBool::new(favorite),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn movie_id(&self) -> &str {
        &self.movie_id
    }

    pub fn is_favorite(&self) -> bool {
        self.favorite.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn toggle(&self, api: &dyn CatalogApi) -> ToggleOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return ToggleOutcome::Busy;
        }
        let _guard = InFlight(&self.in_flight);

        let adding = !self.is_favorite();
        let result = if adding {
            api.add_favorite(&self.movie_id).await
        } else {
            api.remove_favorite(&self.movie_id).await
        };

        match result {
            Ok(()) => {
                self.favorite.store(adding, Ordering::Release);
                if adding {
                    info!("Added {} to favorites", self.movie_id);
                    ToggleOutcome::Added
                } else {
                    info!("Removed {} from favorites", self.movie_id);
                    ToggleOutcome::Removed
                }
            }
            Err(err) => {
                warn!("Failed to update favorite {}: {}", self.movie_id, err);
                ToggleOutcome::Failed(err.user_message())
            }
        }
    }
}
