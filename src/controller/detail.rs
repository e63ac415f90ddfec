use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::catalog::CatalogApi;
use crate::error::ApiResult;
use crate::models::{KnownForCredit, KnownForMovie, MovieDetail, PersonDetail};

/// Fetches a single entity by id.
#[async_trait]
pub trait DetailSource: Send + Sync {
    type Value: Clone + Send + Sync + 'static;

    async fn fetch(&self, id: &str) -> ApiResult<Self::Value>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailState<T> {
    pub id: Option<String>,
    pub value: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    seq: u64,
}

impl<T> Default for DetailState<T> {
    fn default() -> Self {
        Self {
            id: None,
            value: None,
            loading: false,
            error: None,
            seq: 0,
        }
    }
}

pub struct DetailController<S: DetailSource> {
    source: S,
    state: watch::Sender<DetailState<S::Value>>,
}

impl<S: DetailSource> DetailController<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        Self { source, state }
    }

    pub fn snapshot(&self) -> DetailState<S::Value> {
        self.state.borrow().clone()
    }

    pub fn value(&self) -> Option<S::Value> {
        self.state.borrow().value.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState<S::Value>> {
        self.state.subscribe()
    }

    /// Loads `id`. Returns `Ok(None)` when a later `load` superseded this one.
    pub async fn load(&self, id: &str) -> ApiResult<Option<S::Value>> {
        let mut seq = 0;
        self.state.send_modify(|s| {
            if s.id.as_deref() != Some(id) {
                s.id = Some(id.to_string());
                s.value = None;
            }
            s.seq += 1;
            s.loading = true;
            s.error = None;
            seq = s.seq;
        });

        let result = self.source.fetch(id).await;

        let mut outcome = Ok(None);
        let applied = self.state.send_if_modified(|s| {
            if s.seq != seq {
                return false;
            }
            s.loading = false;
            match result {
                Ok(value) => {
                    s.value = Some(value.clone());
                    outcome = Ok(Some(value));
                }
                Err(err) => {
                    warn!("Failed to load {}: {}", id, err);
                    s.error = Some(err.user_message());
                    outcome = Err(err);
                }
            }
            true
        });
        if !applied {
            debug!(id, "Dropped detail response superseded by a newer load");
        }
        outcome
    }
}

pub struct MovieDetailSource {
    api: Arc<dyn CatalogApi>,
}

impl MovieDetailSource {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DetailSource for MovieDetailSource {
    type Value = MovieDetail;

    async fn fetch(&self, id: &str) -> ApiResult<MovieDetail> {
        self.api.movie(id).await
    }
}

/// A person with their credits grouped per movie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonView {
    pub person: PersonDetail,
    pub known_for: Vec<KnownForMovie>,
}

pub struct PersonDetailSource {
    api: Arc<dyn CatalogApi>,
}

impl PersonDetailSource {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl DetailSource for PersonDetailSource {
    type Value = PersonView;

    async fn fetch(&self, id: &str) -> ApiResult<PersonView> {
        let person = self.api.person(id).await?;
        let known_for = merge_known_for(&person.known_for);
        Ok(PersonView { person, known_for })
    }
}

/// Groups credits by movie, keeping first-seen order and each role once.
pub fn merge_known_for(credits: &[KnownForCredit]) -> Vec<KnownForMovie> {
    let mut merged: Vec<KnownForMovie> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for credit in credits {
        match index.get(credit.id.as_str()) {
            Some(&at) => {
                let roles = &mut merged[at].roles;
                if !roles.contains(&credit.role) {
                    roles.push(credit.role.clone());
                }
            }
            None => {
                index.insert(credit.id.as_str(), merged.len());
                merged.push(KnownForMovie {
                    id: credit.id.clone(),
                    title: credit.title.clone(),
                    year: credit.year,
                    image: credit.image.clone(),
                    roles: vec![credit.role.clone()],
                });
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    fn credit(id: &str, role: &str) -> KnownForCredit {
        KnownForCredit {
            id: id.to_string(),
            title: format!("Title {id}"),
            year: Some(1999),
            image: None,
            role: role.to_string(),
        }
    }

    #[test]
    fn merges_roles_per_movie_in_first_seen_order() {
        let merged = merge_known_for(&[
            credit("m1", "Actor"),
            credit("m2", "Actor"),
            credit("m1", "Director"),
            credit("m1", "Actor"),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "m1");
        assert_eq!(merged[0].roles, vec!["Actor", "Director"]);
        assert_eq!(merged[1].id, "m2");
        assert_eq!(merged[1].roles, vec!["Actor"]);
    }

    struct Gated {
        gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl DetailSource for Gated {
        type Value = String;

        async fn fetch(&self, id: &str) -> ApiResult<String> {
            let gate = self.gates.lock().unwrap().remove(id);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if id == "missing" {
                return Err(ApiError::Network("unreachable".to_string()));
            }
            Ok(format!("detail of {id}"))
        }
    }

    #[tokio::test]
    async fn later_load_wins() {
        let (open_first, first_gate) = oneshot::channel();
        let controller = Arc::new(DetailController::new(Gated {
            gates: Mutex::new(HashMap::from([("tt1".to_string(), first_gate)])),
        }));
        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.load("tt1").await }
        });
        while !controller.snapshot().loading {
            tokio::task::yield_now().await;
        }

        let second = controller.load("tt2").await.unwrap();
        assert_eq!(second.as_deref(), Some("detail of tt2"));

        open_first.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), None);

        let state = controller.snapshot();
        assert_eq!(state.id.as_deref(), Some("tt2"));
        assert_eq!(state.value.as_deref(), Some("detail of tt2"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn failure_records_error_and_clears_value_for_new_id() {
        let controller = DetailController::new(Gated {
            gates: Mutex::new(HashMap::new()),
        });
        controller.load("tt1").await.unwrap();
        assert!(controller.load("missing").await.is_err());
        let state = controller.snapshot();
        assert!(state.value.is_none());
        assert!(state.error.is_some());
    }
}
