//! # Example: three_tabs
//!
//! Three contexts share one bus and one store. Watch one leader get elected,
//! poll a simulated forum, deliver new actions and hand leadership over.
//!
//! Demonstrates how to:
//! - Spawn contexts with [`ContextBuilder`] and drive them through [`ContextHandle`].
//! - Plug a custom [`Fetcher`] (here: a fake forum that posts on every fetch).
//! - Observe everything through the built-in [`LogWriter`] presenter.
//!
//! ## Flow
//! ```text
//! tab-1, tab-2, tab-3 ──► leader_check ──► one leader (window elapsed)
//! tab-3.add_target("alice") ──► cmd_add_user ──► leader baselines alice
//! ticks ──► new actions ──► ActionDelivered (leader) / new_action (followers)
//! tab-2.focus() ──► leader_takeover ──► tab-2 leads
//! tab-2.shutdown() ──► leader_resign ──► re-election
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example three_tabs --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing_subscriber::EnvFilter;

use seekvisor::{
    Action, ActionId, ActionKind, Bus, Config, ConfigStore, ContextBuilder, FetchError, Fetcher,
    JitterPolicy, LogWriter, Presenter, Profile, Role, store::MemoryStore,
};

/// Fake forum where every monitored account posts once per fetch.
#[derive(Default)]
struct BusyForum {
    posts: AtomicU64,
}

#[async_trait]
impl Fetcher for BusyForum {
    async fn profile(&self, _target: &str) -> Result<Profile, FetchError> {
        Ok(Profile {
            last_posted_at: Some(Utc::now()),
            last_seen_at: Some(Utc::now()),
        })
    }

    async fn actions(&self, target: &str) -> Result<Vec<Action>, FetchError> {
        let newest = self.posts.fetch_add(1, Ordering::SeqCst) + 1;
        let page = (1..=newest)
            .rev()
            .take(10)
            .map(|n| Action {
                id: ActionId::new(format!("{target}-{n}")),
                kind: ActionKind::NewTopic,
                actor: target.to_string(),
                subject: String::new(),
                topic_id: Some(n),
                post_number: Some(1),
                title: format!("{target}'s post #{n}"),
                excerpt: String::new(),
                category_id: None,
                created_at: Some(Utc::now()),
            })
            .collect();
        Ok(page)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config {
        base_interval: Duration::from_secs(2),
        poll_jitter: JitterPolicy::None,
        notify_stagger: Duration::from_millis(300),
        ..Config::default()
    };
    let bus = Bus::new(cfg.bus_capacity_clamped());
    let forum: Arc<dyn Fetcher> = Arc::new(BusyForum::default());
    let store: Arc<dyn ConfigStore> = Arc::new(MemoryStore::new());
    let presenters: Vec<Arc<dyn Presenter>> = vec![Arc::new(LogWriter::default())];

    let spawn = || {
        ContextBuilder::new(&bus, Arc::clone(&forum))
            .with_config(cfg.clone())
            .with_store(Arc::clone(&store))
            .with_presenters(presenters.clone())
            .spawn()
    };
    let tabs = [spawn(), spawn(), spawn()];
    tokio::time::sleep(Duration::from_millis(500)).await;

    for tab in &tabs {
        println!("{} -> {}", tab.id(), tab.role().as_label());
    }

    let [tab1, tab2, tab3] = tabs;
    tab3.add_target("alice").await?;
    tokio::time::sleep(Duration::from_secs(7)).await;

    println!("tab-2 gains focus");
    tab2.focus().await?;
    tab2.wait_role(Role::Leader).await?;
    tokio::time::sleep(Duration::from_secs(3)).await;

    println!("tab-2 closes");
    tab2.shutdown().await?;
    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("tab-1 -> {}, tab-3 -> {}", tab1.role().as_label(), tab3.role().as_label());

    let view = tab1.view();
    println!("tab-1 feed has {} actions", view.feed().len());

    tab1.shutdown().await?;
    tab3.shutdown().await?;
    Ok(())
}
