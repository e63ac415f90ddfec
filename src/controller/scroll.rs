use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::list::{FetchOutcome, ListController, PageSource};
use crate::error::ApiResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTriggerConfig {
    /// Fire when the selected slide is within this many of the end.
    pub threshold: usize,
    pub min_interval: Duration,
    /// How long the trigger stays disarmed after firing.
    pub cooldown: Duration,
}

impl Default for ScrollTriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 2,
            min_interval: Duration::from_secs(1),
            cooldown: Duration::from_secs(2),
        }
    }
}

/// Decides when a carousel has scrolled close enough to its end to load
/// the next page.
#[derive(Debug)]
pub struct ScrollTrigger {
    config: ScrollTriggerConfig,
    last_fired: Mutex<Option<Instant>>,
}

impl ScrollTrigger {
    pub fn new(config: ScrollTriggerConfig) -> Self {
        Self {
            config,
            last_fired: Mutex::new(None),
        }
    }

    pub fn config(&self) -> ScrollTriggerConfig {
        self.config
    }

    pub fn on_select(&self, index: usize, total: usize, loading: bool) -> bool {
        self.on_select_at(index, total, loading, Instant::now())
    }

    pub fn on_select_at(&self, index: usize, total: usize, loading: bool, now: Instant) -> bool {
        if loading || index + self.config.threshold < total {
            return false;
        }
        let mut last = match self.last_fired.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(at) = *last {
            let since = now.saturating_duration_since(at);
            if since < self.config.min_interval || since < self.config.cooldown {
                debug!(index, total, "Scroll trigger disarmed");
                return false;
            }
        }
        *last = Some(now);
        true
    }
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new(ScrollTriggerConfig::default())
    }
}

/// A carousel backed by a list controller that loads the next page as the
/// user nears the last slide.
pub struct CarouselFeed<S: PageSource> {
    list: Arc<ListController<S>>,
    trigger: ScrollTrigger,
}

impl<S: PageSource> CarouselFeed<S> {
    pub fn new(list: Arc<ListController<S>>, config: ScrollTriggerConfig) -> Self {
        Self {
            list,
            trigger: ScrollTrigger::new(config),
        }
    }

    pub fn list(&self) -> &Arc<ListController<S>> {
        &self.list
    }

    pub async fn on_slide_selected(&self, index: usize) -> ApiResult<FetchOutcome> {
        let (total, has_more, loading) = {
            let s = self.list.snapshot();
            (s.items.len(), s.has_more, s.loading)
        };
        if !has_more || !self.trigger.on_select(index, total, loading) {
            return Ok(FetchOutcome::Skipped);
        }
        debug!(index, total, "Near the end of the carousel, loading more");
        self.list.load_more().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::sources::VecSource;

    #[tokio::test(start_paused = true)]
    async fn fires_near_the_end_only() {
        let trigger = ScrollTrigger::default();
        assert!(!trigger.on_select(5, 10, false));
        assert!(!trigger.on_select(7, 10, true));
        assert!(trigger.on_select(8, 10, false));
    }

    #[tokio::test(start_paused = true)]
    async fn stays_disarmed_during_cooldown() {
        let trigger = ScrollTrigger::default();
        assert!(trigger.on_select(9, 10, false));
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert!(!trigger.on_select(9, 10, false));
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(trigger.on_select(9, 10, false));
    }

    #[tokio::test(start_paused = true)]
    async fn larger_threshold_fires_earlier() {
        let trigger = ScrollTrigger::new(ScrollTriggerConfig {
            threshold: 3,
            ..Default::default()
        });
        assert!(trigger.on_select(7, 10, false));
    }

    #[tokio::test(start_paused = true)]
    async fn feed_loads_one_page_per_fire() {
        let list = Arc::new(ListController::new(
            VecSource::new((1..=30).collect::<Vec<u32>>()),
            10,
            (),
        ));
        list.load_first().await.unwrap();
        let feed = CarouselFeed::new(list.clone(), ScrollTriggerConfig::default());

        assert_eq!(feed.on_slide_selected(3).await.unwrap(), FetchOutcome::Skipped);
        assert_eq!(
            feed.on_slide_selected(8).await.unwrap(),
            FetchOutcome::Applied { received: 10 }
        );
        // Same spot again right away: still cooling down.
        assert_eq!(feed.on_slide_selected(18).await.unwrap(), FetchOutcome::Skipped);
        assert_eq!(list.items().len(), 20);

        tokio::time::advance(Duration::from_secs(2)).await;
        feed.on_slide_selected(18).await.unwrap();
        assert_eq!(list.items().len(), 30);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(feed.on_slide_selected(29).await.unwrap(), FetchOutcome::Skipped);
    }
}
