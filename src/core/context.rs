//! # Execution context actor.
//!
//! One [`TabContext`] per tab. It owns its state outright and reacts to five
//! inputs in a single `select!` loop, so nothing inside it needs a lock.
//!
//! ```text
//!            ┌──────────── ContextHandle (commands) ─────────────┐
//!            │                                                   ▼
//! Bus ──► Inbox ──► Election ──► Directives ──► publish / timers / Work
//!                                                   │
//!                  ticker (leader only) ──► Scheduler ──► runner job (one in flight)
//!                                                   │
//!                         job done ──► apply ──► DelayQueue ──► ActionDelivered
//!                                         │
//!                                         ├──► data_update (full state)
//!                                         ├──► StateRendered
//!                                         └──► ConfigPatch queue ──► ConfigStore
//! ```
//!
//! ## Rules
//! - Only the leader polls, admits, removes, and writes the store.
//! - A follower forwards target mutations to the leader as `cmd_*` messages;
//!   while the election is undecided they are parked and replayed once it is.
//! - At most one job is in flight. Ticks arriving meanwhile are dropped,
//!   commands are queued.
//! - A job that completes after demotion is discarded. The admission or
//!   refresh behind it, and every queued command, is forwarded to the new
//!   leader at demotion time.
//! - Deliveries still queued at demotion are presented without OS notifications.
//! - Failed store writes stay queued and are retried after the next pass.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::FutureExt;
use futures::StreamExt;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::time::DelayQueue;
use tracing::{debug, info, warn};

use super::election::{Directive, Election, Role};
use super::runner::{self, JobKind, JobOutput};
use super::scheduler::{Applied, PollPlan, Scheduler};
use crate::clock::Clock;
use crate::config::Config;
use crate::error::ContextError;
use crate::events::{Event, EventKind};
use crate::model::{Action, AggregateState, NotificationChannels, RecentlySeenSet, Target};
use crate::remote::Fetcher;
use crate::store::{ConfigPatch, ConfigStore, Settings, StoredConfig};
use crate::subscribers::PresenterSet;
use crate::transport::{ConfigKey, ContextId, Endpoint, Envelope, Inbox, Message};

const COMMAND_QUEUE: usize = 64;

/// Request sent from a [`ContextHandle`] to its context.
#[derive(Debug)]
enum Command {
    Add(String),
    Remove(String),
    RefreshAll,
    Refresh(String),
    ToggleHidden(String),
    SetCollapsed(bool),
    SetNotify(ConfigKey, bool),
    Focus,
    ReloadSettings,
    Shutdown,
}

/// Work only the leader may carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Work {
    Admit(String),
    Remove(String),
    PollAll,
    Refresh(String),
}

impl Work {
    fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::CmdAddUser { target_id } => Some(Work::Admit(target_id)),
            Message::CmdRemoveUser { target_id } => Some(Work::Remove(target_id)),
            Message::CmdRefreshAll => Some(Work::PollAll),
            Message::CmdRefreshUser { target_id } => Some(Work::Refresh(target_id)),
            _ => None,
        }
    }

    fn into_message(self) -> Message {
        match self {
            Work::Admit(target_id) => Message::CmdAddUser { target_id },
            Work::Remove(target_id) => Message::CmdRemoveUser { target_id },
            Work::PollAll => Message::CmdRefreshAll,
            Work::Refresh(target_id) => Message::CmdRefreshUser { target_id },
        }
    }
}

/// Everything a context is built from.
pub(crate) struct Wiring {
    pub endpoint: Endpoint,
    pub config: Config,
    pub clock: Clock,
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn ConfigStore>,
    pub settings: Option<Arc<dyn Settings>>,
    pub presenters: PresenterSet,
}

/// Owner-side handle of a running context.
///
/// Dropping the handle stops the context like [`shutdown`](Self::shutdown)
/// does (a leader still resigns), but nothing waits for it to finish.
#[derive(Debug)]
pub struct ContextHandle {
    id: ContextId,
    commands: mpsc::Sender<Command>,
    role: watch::Receiver<Role>,
    view: watch::Receiver<Arc<AggregateState>>,
    channels: watch::Receiver<NotificationChannels>,
    join: JoinHandle<()>,
}

impl ContextHandle {
    /// Identity of the context on the bus.
    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Current role.
    pub fn role(&self) -> Role {
        *self.role.borrow()
    }

    /// Latest rendered view.
    pub fn view(&self) -> Arc<AggregateState> {
        Arc::clone(&self.view.borrow())
    }

    /// Current notification flags.
    pub fn channels(&self) -> NotificationChannels {
        *self.channels.borrow()
    }

    /// Starts monitoring `target` (admitted by the leader).
    pub async fn add_target(&self, target: impl Into<String>) -> Result<(), ContextError> {
        self.send(Command::Add(target.into())).await
    }

    /// Stops monitoring `target`; its cursor and history are discarded.
    pub async fn remove_target(&self, target: impl Into<String>) -> Result<(), ContextError> {
        self.send(Command::Remove(target.into())).await
    }

    /// Polls every target once, without notifying.
    pub async fn refresh_all(&self) -> Result<(), ContextError> {
        self.send(Command::RefreshAll).await
    }

    /// Polls `target` now.
    pub async fn refresh_target(&self, target: impl Into<String>) -> Result<(), ContextError> {
        self.send(Command::Refresh(target.into())).await
    }

    /// Shows or hides `target`'s actions in this context's feed.
    pub async fn toggle_hidden(&self, target: impl Into<String>) -> Result<(), ContextError> {
        self.send(Command::ToggleHidden(target.into())).await
    }

    /// Marks the UI collapsed (doubles poll intervals while leading).
    pub async fn set_collapsed(&self, collapsed: bool) -> Result<(), ContextError> {
        self.send(Command::SetCollapsed(collapsed)).await
    }

    /// Sets a notification flag here and in every other context.
    pub async fn set_notify(&self, key: ConfigKey, value: bool) -> Result<(), ContextError> {
        self.send(Command::SetNotify(key, value)).await
    }

    /// The tab regained foreground focus.
    pub async fn focus(&self) -> Result<(), ContextError> {
        self.send(Command::Focus).await
    }

    /// Re-queries the settings collaborator and reconciles the monitored set.
    pub async fn reload_settings(&self) -> Result<(), ContextError> {
        self.send(Command::ReloadSettings).await
    }

    /// Waits until the context reaches `role`.
    pub async fn wait_role(&self, role: Role) -> Result<(), ContextError> {
        let mut rx = self.role.clone();
        rx.wait_for(|r| *r == role)
            .await
            .map(|_| ())
            .map_err(|_| ContextError::Stopped)
    }

    /// Waits until the rendered view satisfies `pred`.
    pub async fn wait_view<F>(&self, mut pred: F) -> Result<Arc<AggregateState>, ContextError>
    where
        F: FnMut(&AggregateState) -> bool,
    {
        let mut rx = self.view.clone();
        let view = rx
            .wait_for(|v| pred(v.as_ref()))
            .await
            .map_err(|_| ContextError::Stopped)?;
        Ok(Arc::clone(&view))
    }

    /// Resigns (if leading), flushes pending writes and waits for the loop to exit.
    pub async fn shutdown(self) -> Result<(), ContextError> {
        let _ = self.commands.send(Command::Shutdown).await;
        self.join.await.map_err(|_| ContextError::Stopped)
    }

    async fn send(&self, cmd: Command) -> Result<(), ContextError> {
        self.commands.send(cmd).await.map_err(|_| ContextError::Stopped)
    }
}

/// Spawns a context onto the current tokio runtime.
pub(crate) fn spawn(wiring: Wiring) -> ContextHandle {
    let id = wiring.endpoint.id();
    let inbox = wiring.endpoint.subscribe();
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE);
    let (role_tx, role_rx) = watch::channel(Role::Initializing);
    let (view_tx, view_rx) = watch::channel(Arc::new(AggregateState::default()));
    let (channels_tx, channels_rx) = watch::channel(NotificationChannels::default());

    let mut ticker = time::interval(wiring.config.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctx = TabContext {
        election: Election::new(id),
        scheduler: Scheduler::new(wiring.config.clone()),
        recent: RecentlySeenSet::new(wiring.config.recently_seen_capacity),
        endpoint: wiring.endpoint,
        inbox,
        config: wiring.config,
        clock: wiring.clock,
        fetcher: wiring.fetcher,
        store: wiring.store,
        settings: wiring.settings,
        presenters: wiring.presenters,
        commands: cmd_rx,
        role_tx,
        view_tx,
        channels_tx,
        ticker,
        state: AggregateState::default(),
        channels: NotificationChannels::default(),
        collapsed: false,
        window: None,
        rejoin: None,
        in_flight: None,
        in_flight_work: None,
        backlog: VecDeque::new(),
        parked: Vec::new(),
        deliveries: DelayQueue::new(),
        next_slot: Instant::now(),
        pending: Vec::new(),
        flush_requested: false,
    };
    let join = tokio::spawn(ctx.run());

    ContextHandle {
        id,
        commands: cmd_tx,
        role: role_rx,
        view: view_rx,
        channels: channels_rx,
        join,
    }
}

/// The per-tab actor.
pub(crate) struct TabContext {
    endpoint: Endpoint,
    inbox: Inbox,
    config: Config,
    clock: Clock,
    election: Election,
    scheduler: Scheduler,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ConfigStore>,
    settings: Option<Arc<dyn Settings>>,
    presenters: PresenterSet,
    commands: mpsc::Receiver<Command>,
    role_tx: watch::Sender<Role>,
    view_tx: watch::Sender<Arc<AggregateState>>,
    channels_tx: watch::Sender<NotificationChannels>,
    ticker: Interval,

    state: AggregateState,
    recent: RecentlySeenSet,
    channels: NotificationChannels,
    collapsed: bool,

    window: Option<Instant>,
    rejoin: Option<Instant>,
    in_flight: Option<BoxFuture<'static, JobOutput>>,
    /// Command behind the in-flight job, handed to the next leader on demotion.
    in_flight_work: Option<Work>,
    backlog: VecDeque<Work>,
    parked: Vec<Work>,
    deliveries: DelayQueue<Arc<Action>>,
    next_slot: Instant,
    pending: Vec<ConfigPatch>,
    flush_requested: bool,
}

async fn next_job(slot: &mut Option<BoxFuture<'static, JobOutput>>) -> JobOutput {
    match slot.as_mut() {
        Some(job) => {
            let out = job.await;
            *slot = None;
            out
        }
        None => std::future::pending().await,
    }
}

fn deadline(at: Option<Instant>) -> time::Sleep {
    time::sleep_until(at.unwrap_or_else(Instant::now))
}

impl TabContext {
    async fn run(mut self) {
        self.boot().await;

        loop {
            let window = self.window;
            let rejoin = self.rejoin;
            let leading = self.election.is_leader();

            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Shutdown) | None => break,
                    Some(cmd) => self.on_command(cmd).await,
                },
                env = self.inbox.recv() => match env {
                    Some(env) => self.on_envelope(env),
                    None => break,
                },
                _ = deadline(window), if window.is_some() => {
                    self.window = None;
                    let directives = self.election.on_window_elapsed();
                    self.execute(directives);
                }
                _ = deadline(rejoin), if rejoin.is_some() => {
                    self.rejoin = None;
                    let directives = self.election.on_rejoin_elapsed();
                    self.execute(directives);
                }
                out = next_job(&mut self.in_flight) => self.on_job_done(out),
                Some(expired) = self.deliveries.next(), if !self.deliveries.is_empty() => {
                    self.deliver(expired.into_inner());
                }
                _ = self.ticker.tick(), if leading => self.on_tick(),
            }

            if self.flush_requested {
                self.flush_patches().await;
            }
        }

        self.stop().await;
    }

    fn id(&self) -> ContextId {
        self.endpoint.id()
    }

    fn emit(&self, event: Event) {
        self.presenters.emit(event.with_context(self.id()));
    }

    fn publish(&self, message: Message) {
        self.endpoint.publish(message, self.election.term());
    }

    // ---- boot & shutdown ----

    async fn boot(&mut self) {
        let stored = match self.store.load().await {
            Ok(config) => config,
            Err(err) => {
                warn!(context = %self.id(), err = %err, "config load failed; starting empty");
                StoredConfig::default()
            }
        };
        let mut targets = stored.targets.clone();
        let mut channels = stored.channels();

        if let Some(settings) = self.settings.clone() {
            match settings.snapshot().await {
                Ok(snap) => {
                    if !snap.targets.is_empty() {
                        targets = snap.targets;
                    }
                    if let Some(ch) = snap.channels {
                        channels = ch;
                    }
                }
                Err(err) => warn!(context = %self.id(), err = %err, "settings unavailable at boot"),
            }
        }

        let limit = self.config.target_limit().unwrap_or(usize::MAX);
        for id in targets {
            if self.state.targets.len() >= limit {
                warn!(context = %self.id(), user = %id, "monitored set is full; ignoring stored target");
                continue;
            }
            let cursor = stored.cursors.get(&id).cloned();
            self.state.insert_target(Target::new(id).with_cursor(cursor));
        }
        self.state.hidden = stored.hidden;
        self.channels = channels;
        self.channels_tx.send_replace(channels);
        self.render();

        let directives = self.election.start();
        self.execute(directives);
    }

    async fn stop(mut self) {
        let leading = self.election.is_leader();
        let directives = self.election.on_shutdown();
        self.execute(directives);
        if leading && !self.pending.is_empty() {
            if let Err(err) = self.store.patch(&self.pending).await {
                warn!(context = %self.id(), err = %err, "final config write failed");
            }
        }
        info!(context = %self.id(), "context stopped");
        self.emit(Event::new(EventKind::ContextStopped));
        self.presenters.shutdown().await;
    }

    // ---- election ----

    fn execute(&mut self, directives: Vec<Directive>) {
        for directive in directives {
            match directive {
                Directive::Announce(message) => self.publish(message),
                Directive::ArmWindow => {
                    self.window = Some(Instant::now() + self.config.election_window);
                    self.emit(Event::new(EventKind::ElectionStarted).with_term(self.election.term()));
                }
                Directive::DisarmWindow => self.window = None,
                Directive::ArmRejoin => {
                    let wait = self.config.rejoin_wait();
                    debug!(context = %self.id(), ?wait, "leader resigned; rejoining after jitter");
                    self.rejoin = Some(Instant::now() + wait);
                }
                Directive::Promoted(why) => {
                    info!(context = %self.id(), term = self.election.term(), via = why.as_label(), "promoted to leader");
                    self.emit(
                        Event::new(EventKind::Promoted)
                            .with_term(self.election.term())
                            .with_reason(why.as_label()),
                    );
                    self.ticker.reset();
                    self.submit(Work::PollAll);
                }
                Directive::Demoted => {
                    info!(context = %self.id(), term = self.election.term(), "demoted to follower");
                    self.emit(Event::new(EventKind::Demoted).with_term(self.election.term()));
                    self.pending.clear();
                    let interrupted = self.in_flight_work.take();
                    let backlog: Vec<Work> = interrupted.into_iter().chain(self.backlog.drain(..)).collect();
                    for work in backlog {
                        self.publish(work.into_message());
                    }
                }
                Directive::ShareState => self.share_state(),
            }
        }
        self.sync_role();
    }

    fn sync_role(&mut self) {
        let role = self.election.role();
        if *self.role_tx.borrow() == role {
            return;
        }
        debug!(context = %self.id(), role = role.as_label(), "role changed");
        self.role_tx.send_replace(role);
        if role.is_settled() {
            for work in std::mem::take(&mut self.parked) {
                self.submit(work);
            }
        }
        self.render();
    }

    // ---- inputs ----

    async fn on_command(&mut self, cmd: Command) {
        match cmd {
            Command::Add(id) => self.submit(Work::Admit(id)),
            Command::Remove(id) => self.submit(Work::Remove(id)),
            Command::RefreshAll => self.submit(Work::PollAll),
            Command::Refresh(id) => self.submit(Work::Refresh(id)),
            Command::ToggleHidden(id) => {
                if !self.state.contains(&id) {
                    return;
                }
                self.state.toggle_hidden(&id);
                if self.election.is_leader() {
                    self.queue_patch(ConfigPatch::Hidden(self.state.hidden.clone()));
                }
                self.render();
            }
            Command::SetCollapsed(collapsed) => self.collapsed = collapsed,
            Command::SetNotify(key, value) => {
                self.apply_channel(key, value);
                self.publish(Message::CmdConfigSync { key, value });
            }
            Command::Focus => {
                let directives = self.election.on_focus();
                self.execute(directives);
            }
            Command::ReloadSettings => self.reload_settings().await,
            Command::Shutdown => {}
        }
    }

    fn on_envelope(&mut self, env: Envelope) {
        if env.message.is_election() {
            let directives = self.election.on_envelope(&env);
            self.execute(directives);
            return;
        }
        match env.message {
            Message::DataUpdate(incoming) => self.merge(incoming),
            Message::NewAction { action } => self.present_remote(action),
            Message::CmdConfigSync { key, value } => self.apply_channel(key, value),
            other => {
                if let Some(work) = Work::from_message(other) {
                    if self.election.is_leader() {
                        self.run_work(work);
                    }
                }
            }
        }
    }

    fn on_tick(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        let now = self.clock.now();
        let Some(idx) = self.scheduler.next_due(&self.state.targets, now) else {
            return;
        };
        let plan = self.scheduler.plan(&self.state, &self.state.targets[idx], false);
        self.start_job(JobKind::Tick, vec![plan], None);
    }

    // ---- work ----

    fn submit(&mut self, work: Work) {
        match self.election.role() {
            Role::Leader => self.run_work(work),
            Role::Follower => self.publish(work.into_message()),
            Role::Initializing | Role::ElectionPending => self.parked.push(work),
        }
    }

    fn run_work(&mut self, work: Work) {
        if let Work::Remove(id) = &work {
            self.remove_target(id);
        } else if self.in_flight.is_some() {
            // Repeated admissions stay queued so each gets its own verdict.
            if matches!(work, Work::Admit(_)) || !self.backlog.contains(&work) {
                self.backlog.push_back(work);
            }
        } else {
            self.start_work(work);
        }
    }

    fn start_work(&mut self, work: Work) {
        let origin = matches!(work, Work::Admit(_) | Work::Refresh(_)).then(|| work.clone());
        let (kind, plans) = match work {
            Work::PollAll => (JobKind::PollAll, self.scheduler.cycle(&self.state)),
            Work::Refresh(id) => match self.state.target(&id) {
                Some(target) => (JobKind::Refresh, vec![self.scheduler.plan(&self.state, target, true)]),
                None => return self.reject(&id, "not monitored".into()),
            },
            Work::Admit(id) => {
                if let Some(reason) = self.admission_refusal(&id) {
                    return self.reject(&id, reason);
                }
                (JobKind::Admit, vec![self.scheduler.baseline(&id)])
            }
            Work::Remove(id) => return self.remove_target(&id),
        };
        if !plans.is_empty() {
            self.start_job(kind, plans, origin);
        }
    }

    fn drain_backlog(&mut self) {
        while self.in_flight.is_none() {
            let Some(work) = self.backlog.pop_front() else {
                break;
            };
            self.start_work(work);
        }
    }

    fn start_job(&mut self, kind: JobKind, plans: Vec<PollPlan>, origin: Option<Work>) {
        for plan in &plans {
            self.emit(
                Event::new(EventKind::PollStarting)
                    .with_target(plan.target.as_str())
                    .with_reason(kind.as_label()),
            );
        }
        let job = runner::run_job(Arc::clone(&self.fetcher), kind, plans, self.config.fetch_timeout());
        self.in_flight = Some(job.boxed());
        self.in_flight_work = origin;
    }

    fn admission_refusal(&self, id: &str) -> Option<String> {
        if id.trim().is_empty() {
            return Some("empty target id".into());
        }
        if self.state.contains(id) {
            return Some("already monitored".into());
        }
        match self.config.target_limit() {
            Some(limit) if self.state.targets.len() >= limit => {
                Some(format!("limit of {limit} targets reached"))
            }
            _ => None,
        }
    }

    fn reject(&self, id: &str, reason: String) {
        warn!(context = %self.id(), user = %id, reason = %reason, "command rejected");
        self.emit(
            Event::new(EventKind::CommandRejected)
                .with_target(id)
                .with_reason(reason),
        );
    }

    fn remove_target(&mut self, id: &str) {
        if self.state.remove_target(id).is_none() {
            return self.reject(id, "not monitored".into());
        }
        self.queue_patch(ConfigPatch::Targets(self.state.target_ids()));
        self.queue_patch(ConfigPatch::DropCursor { target: id.to_string() });
        self.emit(Event::new(EventKind::TargetRemoved).with_target(id));
        self.end_pass();
    }

    fn on_job_done(&mut self, out: JobOutput) {
        self.in_flight_work = None;
        if !self.election.is_leader() {
            debug!(context = %self.id(), job = out.kind.as_label(), "discarding poll finished after demotion");
            return;
        }
        let kind = out.kind;
        let now = self.clock.now();

        for report in out.reports {
            let id = report.target.clone();
            if kind == JobKind::Admit {
                if let Err(err) = &report.result {
                    self.reject(&id, format!("initial fetch failed: {err}"));
                    continue;
                }
                if let Some(reason) = self.admission_refusal(&id) {
                    self.reject(&id, reason);
                    continue;
                }
                self.state.insert_target(Target::new(id.as_str()));
                self.queue_patch(ConfigPatch::Targets(self.state.target_ids()));
                self.emit(Event::new(EventKind::TargetAdded).with_target(id.as_str()));
            }
            let applied = self
                .scheduler
                .apply(&mut self.state, &mut self.recent, report, now, self.collapsed);
            self.report_applied(&id, applied);
        }

        self.end_pass();
        self.drain_backlog();
    }

    fn report_applied(&mut self, id: &str, applied: Applied) {
        if applied.gone {
            return;
        }
        if let Some(err) = &applied.failed {
            warn!(context = %self.id(), user = %id, err = %err, label = err.as_label(), "poll failed");
            self.emit(
                Event::new(EventKind::PollFailed)
                    .with_target(id)
                    .with_reason(err.to_string()),
            );
        } else if applied.skipped {
            debug!(context = %self.id(), user = %id, "profile unchanged; action list skipped");
            self.emit(Event::new(EventKind::PollSkipped).with_target(id));
        }
        if let Some(cursor) = applied.cursor {
            self.queue_patch(ConfigPatch::Cursor {
                target: id.to_string(),
                cursor,
            });
        }
        if !applied.fresh.is_empty() {
            self.emit(
                Event::new(EventKind::ActionsDiscovered)
                    .with_target(id)
                    .with_count(applied.fresh.len()),
            );
            self.schedule_deliveries(applied.fresh);
        }
        self.emit(
            Event::new(EventKind::PollScheduled)
                .with_target(id)
                .with_delay(applied.delay)
                .with_multiplier(applied.multiplier),
        );
    }

    async fn reload_settings(&mut self) {
        let Some(settings) = self.settings.clone() else {
            return;
        };
        let snap = match settings.snapshot().await {
            Ok(snap) => snap,
            Err(err) => {
                warn!(context = %self.id(), err = %err, "settings reload failed");
                return;
            }
        };
        let current = self.state.target_ids();
        for id in snap.targets.iter().filter(|id| !current.contains(id)) {
            self.submit(Work::Admit(id.clone()));
        }
        for id in current.iter().filter(|id| !snap.targets.contains(id)) {
            self.submit(Work::Remove(id.clone()));
        }
        if let Some(ch) = snap.channels {
            for (key, value) in [(ConfigKey::NotifyOverlay, ch.overlay), (ConfigKey::NotifySystem, ch.system)] {
                if self.channels.get(key) != value {
                    self.apply_channel(key, value);
                    self.publish(Message::CmdConfigSync { key, value });
                }
            }
        }
    }

    // ---- replication & presentation ----

    fn merge(&mut self, incoming: Arc<AggregateState>) {
        if self.election.is_leader() {
            if self.state.fill_gaps(&incoming) {
                self.render();
            }
            return;
        }
        self.state.adopt(Arc::unwrap_or_clone(incoming));
        self.render();
    }

    fn share_state(&self) {
        self.publish(Message::DataUpdate(Arc::new(self.state.clone())));
    }

    fn render(&self) {
        let view = Arc::new(self.state.clone());
        self.view_tx.send_replace(Arc::clone(&view));
        self.emit(
            Event::new(EventKind::StateRendered)
                .with_state(view)
                .with_role(self.election.role()),
        );
    }

    fn end_pass(&mut self) {
        self.share_state();
        self.render();
        if !self.pending.is_empty() {
            self.flush_requested = true;
        }
    }

    fn schedule_deliveries(&mut self, fresh: Vec<Action>) {
        let now = Instant::now();
        for action in fresh {
            let slot = self.next_slot.max(now);
            self.deliveries.insert_at(Arc::new(action), slot);
            self.next_slot = slot + self.config.notify_stagger;
        }
    }

    fn deliver(&mut self, action: Arc<Action>) {
        // A demoted context finishes its queue, but OS notifications belong to the leader.
        let channels = NotificationChannels {
            system: self.channels.system && self.election.is_leader(),
            ..self.channels
        };
        if channels.any() {
            self.emit(
                Event::new(EventKind::ActionDelivered)
                    .with_target(action.actor.as_str())
                    .with_action(Arc::clone(&action), channels),
            );
        }
        self.publish(Message::NewAction { action });
    }

    fn present_remote(&mut self, action: Arc<Action>) {
        if !self.recent.insert(action.id.clone()) {
            return;
        }
        // OS notifications are raised once, by the delivering leader.
        let channels = NotificationChannels {
            system: false,
            ..self.channels
        };
        if channels.any() {
            self.emit(
                Event::new(EventKind::ActionDelivered)
                    .with_target(action.actor.as_str())
                    .with_action(action, channels),
            );
        }
    }

    fn apply_channel(&mut self, key: ConfigKey, value: bool) {
        if !self.channels.set(key, value) {
            return;
        }
        self.channels_tx.send_replace(self.channels);
        if self.election.is_leader() {
            self.queue_patch(ConfigPatch::Channels(self.channels));
        }
    }

    // ---- persistence ----

    fn queue_patch(&mut self, patch: ConfigPatch) {
        self.pending.retain(|old| !old.superseded_by(&patch));
        self.pending.push(patch);
        self.flush_requested = true;
    }

    async fn flush_patches(&mut self) {
        self.flush_requested = false;
        if self.pending.is_empty() {
            return;
        }
        if !self.election.is_leader() {
            self.pending.clear();
            return;
        }
        match self.store.patch(&self.pending).await {
            Ok(()) => self.pending.clear(),
            Err(err) => {
                warn!(context = %self.id(), err = %err, label = err.as_label(), "config write failed; retrying after next pass");
                self.emit(Event::new(EventKind::PersistFailed).with_reason(err.to_string()));
            }
        }
    }
}
