//! Fakes shared by the context tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::FetchError;
use crate::events::{Event, EventKind};
use crate::model::{Action, ActionId, ActionKind, Profile};
use crate::remote::Fetcher;
use crate::subscribers::Presenter;

pub(crate) fn action(actor: &str, id: &str) -> Action {
    Action {
        id: ActionId::new(id),
        kind: ActionKind::Reply,
        actor: actor.into(),
        subject: String::new(),
        topic_id: None,
        post_number: None,
        title: format!("post {id}"),
        excerpt: String::new(),
        category_id: None,
        created_at: None,
    }
}

pub(crate) fn seen_at(at: DateTime<Utc>) -> Profile {
    Profile {
        last_seen_at: Some(at),
        ..Profile::default()
    }
}

/// In-memory remote with per-target scripted pages.
#[derive(Default)]
pub(crate) struct ScriptedFetcher {
    pages: Mutex<HashMap<String, (Profile, Vec<Action>)>>,
    broken: Mutex<HashSet<String>>,
    delay: Mutex<Duration>,
    profile_calls: AtomicUsize,
    action_calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn set(&self, target: &str, profile: Profile, ids: &[&str]) {
        let page = ids.iter().map(|id| action(target, id)).collect();
        self.pages
            .lock()
            .unwrap()
            .insert(target.to_string(), (profile, page));
    }

    pub(crate) fn break_target(&self, target: &str) {
        self.broken.lock().unwrap().insert(target.to_string());
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn action_calls(&self) -> usize {
        self.action_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn profile(&self, target: &str) -> Result<Profile, FetchError> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.broken.lock().unwrap().contains(target) {
            return Err(FetchError::Status { code: 503 });
        }
        self.pages
            .lock()
            .unwrap()
            .get(target)
            .map(|(profile, _)| profile.clone())
            .ok_or(FetchError::Status { code: 404 })
    }

    async fn actions(&self, target: &str) -> Result<Vec<Action>, FetchError> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(target)
            .map(|(_, page)| page.clone())
            .unwrap_or_default())
    }
}

/// Presenter that keeps every event it sees.
#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    /// Delivered action ids with their system-notification flag, in order.
    pub(crate) fn delivered(&self) -> Vec<(String, bool)> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == EventKind::ActionDelivered)
            .filter_map(|e| {
                let action = e.action.as_ref()?;
                let system = e.channels.map(|c| c.system).unwrap_or(false);
                Some((action.id.as_str().to_string(), system))
            })
            .collect()
    }
}

#[async_trait]
impl Presenter for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}
