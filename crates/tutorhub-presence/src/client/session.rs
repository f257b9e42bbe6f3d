//! Per-session presence actor.
//!
//! Each [`PresenceSession`] owns one tokio task that holds all of the
//! session's timers and performs its writes in order:
//!
//! - the heartbeat interval, paused while the session is hidden;
//! - a single debounce timer that coalesces rapid updates;
//! - the typing inactivity timer;
//! - the room view refresh, driven by room events and a periodic tick.
//!
//! Dropping the handle stops the task, which marks the user offline on
//! its way out.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, Sleep, interval_at, sleep};
use tracing::debug;

use tutorhub_core::config::PresenceConfig;
use tutorhub_entity::presence::PresenceData;

use super::api::{PresenceApi, RoomEventStream};
use super::best_effort::best_effort;
use super::snapshot::RoomSnapshot;
use crate::events::RoomEvent;

/// Ceiling for the delay between room event resubscription attempts.
const MAX_RESUBSCRIBE_BACKOFF: Duration = Duration::from_secs(30);

/// Client-side timing knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimings {
    /// Heartbeat period while visible.
    pub heartbeat_interval: Duration,
    /// Minimum spacing between presence writes.
    pub debounce: Duration,
    /// Inactivity after which typing clears.
    pub typing_timeout: Duration,
    /// Periodic view re-query.
    pub view_refresh: Duration,
}

impl SessionTimings {
    /// Timings from the shared presence configuration.
    pub fn from_config(config: &PresenceConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            debounce: config.debounce(),
            typing_timeout: config.typing_timeout(),
            view_refresh: config.view_refresh(),
        }
    }
}

impl Default for SessionTimings {
    fn default() -> Self {
        Self::from_config(&PresenceConfig::default())
    }
}

#[derive(Debug)]
enum Command {
    Update(PresenceData),
    Draft { empty: bool },
    MessageSent,
    Visibility(bool),
    Sync(oneshot::Sender<()>),
    Stop(Option<oneshot::Sender<()>>),
}

/// Handle to a running presence session in one room.
#[derive(Debug)]
pub struct PresenceSession {
    room: String,
    commands: mpsc::UnboundedSender<Command>,
    view: watch::Receiver<RoomSnapshot>,
    task: Option<JoinHandle<()>>,
}

impl PresenceSession {
    /// Start a session: sends `initial_data` right away, then runs the
    /// heartbeat and room view until stopped or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        api: Arc<dyn PresenceApi>,
        room: impl Into<String>,
        initial_data: PresenceData,
        timings: SessionTimings,
    ) -> Self {
        let room = room.into();
        let (commands, rx) = mpsc::unbounded_channel();
        let (view_tx, view) = watch::channel(RoomSnapshot::loading());

        let actor = SessionActor {
            api,
            room: room.clone(),
            timings,
            current: initial_data,
            last_sent: None,
            debounce: None,
            typing_timer: None,
            visible: true,
            dirty: false,
            events: None,
            resubscribe_at: None,
            resubscribe_backoff: timings.view_refresh,
            view: view_tx,
        };
        let task = tokio::spawn(actor.run(rx));
        debug!(room = %room, "Presence session started");

        Self {
            room,
            commands,
            view,
            task: Some(task),
        }
    }

    /// Room this session reports into.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Merge `patch` into the local state and write it, debounced.
    pub fn update_my_presence(&self, patch: PresenceData) {
        self.send(Command::Update(patch));
    }

    /// Report the current message draft. A non-empty draft sets the typing
    /// flag and re-arms its inactivity timer; an empty draft clears it.
    pub fn set_draft(&self, draft: &str) {
        self.send(Command::Draft {
            empty: draft.is_empty(),
        });
    }

    /// A message was sent; typing clears immediately.
    pub fn message_sent(&self) {
        self.send(Command::MessageSent);
    }

    /// Page visibility changed. Hidden forces offline at once and pauses
    /// heartbeats; visible sends a heartbeat at once.
    pub fn set_visible(&self, visible: bool) {
        self.send(Command::Visibility(visible));
    }

    /// Mark this user as present in the room's view.
    pub fn enter_room(&self) {
        self.update_my_presence(PresenceData::new().with_in_room(true));
    }

    /// Mark this user as having left the room's view.
    pub fn leave_room(&self) {
        self.update_my_presence(PresenceData::new().with_in_room(false));
    }

    /// Latest view of the room.
    pub fn snapshot(&self) -> RoomSnapshot {
        self.view.borrow().clone()
    }

    /// Receiver that observes every view change.
    pub fn watch(&self) -> watch::Receiver<RoomSnapshot> {
        self.view.clone()
    }

    /// Resolves once every command issued before it has been handled.
    pub async fn sync(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Sync(tx));
        let _ = rx.await;
    }

    /// Stop the session and wait for the final offline write.
    pub async fn stop(mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stop(Some(tx)));
        let _ = rx.await;
        let _ = task.await;
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(room = %self.room, "Presence session already stopped");
        }
    }
}

impl Drop for PresenceSession {
    fn drop(&mut self) {
        if self.task.take().is_some() {
            let _ = self.commands.send(Command::Stop(None));
        }
    }
}

struct SessionActor {
    api: Arc<dyn PresenceApi>,
    room: String,
    timings: SessionTimings,
    current: PresenceData,
    last_sent: Option<Instant>,
    debounce: Option<Pin<Box<Sleep>>>,
    typing_timer: Option<Pin<Box<Sleep>>>,
    visible: bool,
    /// Local changes held back while hidden.
    dirty: bool,
    events: Option<RoomEventStream>,
    /// Earliest time the next subscribe attempt may run.
    resubscribe_at: Option<Instant>,
    resubscribe_backoff: Duration,
    view: watch::Sender<RoomSnapshot>,
}

impl SessionActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.subscribe().await;
        self.send_now().await;
        self.refresh().await;

        let start = Instant::now();
        let mut heartbeat = interval_at(
            start + self.timings.heartbeat_interval,
            self.timings.heartbeat_interval,
        );
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut refresh = interval_at(start + self.timings.view_refresh, self.timings.view_refresh);
        refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Stop(done)) => {
                        self.shutdown().await;
                        if let Some(done) = done {
                            let _ = done.send(());
                        }
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => {
                        self.shutdown().await;
                        break;
                    }
                },
                _ = heartbeat.tick() => self.heartbeat().await,
                () = fire(&mut self.debounce) => {
                    self.debounce = None;
                    self.send_now().await;
                }
                () = fire(&mut self.typing_timer) => {
                    self.typing_timer = None;
                    self.set_typing(false).await;
                }
                event = next_event(&mut self.events) => match event {
                    Some(_) => {
                        self.resubscribe_backoff = self.timings.view_refresh;
                        self.refresh().await;
                    }
                    None => {
                        debug!(room = %self.room, "Room event stream ended");
                        self.events = None;
                        self.schedule_resubscribe();
                    }
                },
                _ = refresh.tick() => {
                    self.resubscribe_if_due().await;
                    self.refresh().await;
                }
            }
        }
        debug!(room = %self.room, "Presence session stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Update(patch) => self.update(patch).await,
            Command::Draft { empty: false } => {
                self.typing_timer = Some(Box::pin(sleep(self.timings.typing_timeout)));
                self.set_typing(true).await;
            }
            Command::Draft { empty: true } | Command::MessageSent => {
                self.typing_timer = None;
                self.set_typing(false).await;
            }
            Command::Visibility(visible) => self.set_visible(visible).await,
            Command::Sync(done) => {
                let _ = done.send(());
            }
            Command::Stop(_) => {}
        }
    }

    async fn update(&mut self, patch: PresenceData) {
        self.current.merge(patch);
        if !self.visible {
            self.dirty = true;
            return;
        }

        let within_window = self
            .last_sent
            .is_some_and(|sent| sent.elapsed() < self.timings.debounce);
        if within_window {
            self.debounce = Some(Box::pin(sleep(self.timings.debounce)));
        } else {
            self.send_now().await;
        }
    }

    async fn set_typing(&mut self, typing: bool) {
        if self.current.is_typing() == typing {
            return;
        }
        self.update(PresenceData::new().with_typing(typing)).await;
    }

    async fn set_visible(&mut self, visible: bool) {
        if self.visible == visible {
            return;
        }
        self.visible = visible;

        if visible {
            best_effort("heartbeat", &self.room, self.api.heartbeat(&self.room)).await;
            if std::mem::take(&mut self.dirty) {
                self.send_now().await;
            }
        } else {
            if self.debounce.take().is_some() {
                self.dirty = true;
            }
            best_effort("set_offline", &self.room, self.api.set_offline(&self.room)).await;
        }
    }

    async fn heartbeat(&mut self) {
        if self.visible {
            best_effort("heartbeat", &self.room, self.api.heartbeat(&self.room)).await;
        }
    }

    async fn send_now(&mut self) {
        self.debounce = None;
        self.last_sent = Some(Instant::now());
        let data = self.current.to_json();
        best_effort(
            "update_presence",
            &self.room,
            self.api.update_presence(&self.room, &data),
        )
        .await;
    }

    async fn subscribe(&mut self) {
        match best_effort("subscribe", &self.room, self.api.subscribe(&self.room)).await {
            Some(events) => {
                self.events = Some(events);
                self.resubscribe_at = None;
            }
            None => self.schedule_resubscribe(),
        }
    }

    /// Reconnect a lost event stream once its backoff has elapsed. The
    /// periodic refresh keeps the view current in the meantime.
    async fn resubscribe_if_due(&mut self) {
        if self.events.is_some() || self.resubscribe_at.is_some_and(|at| Instant::now() < at) {
            return;
        }
        debug!(room = %self.room, "Resubscribing to room events");
        self.subscribe().await;
    }

    fn schedule_resubscribe(&mut self) {
        let delay = self.resubscribe_backoff;
        self.resubscribe_at = Some(Instant::now() + delay);
        self.resubscribe_backoff = (delay * 2).min(MAX_RESUBSCRIBE_BACKOFF);
    }

    async fn refresh(&mut self) {
        let Some(others) = best_effort(
            "query_presence_in_room",
            &self.room,
            self.api.query_presence_in_room(&self.room),
        )
        .await
        else {
            return;
        };

        let next = RoomSnapshot::from_others(others);
        self.view.send_if_modified(|snapshot| {
            if *snapshot == next {
                return false;
            }
            *snapshot = next;
            true
        });
    }

    async fn shutdown(&mut self) {
        self.typing_timer = None;
        let pending = self.debounce.take().is_some();
        if pending || std::mem::take(&mut self.dirty) {
            self.send_now().await;
        }
        best_effort("set_offline", &self.room, self.api.set_offline(&self.room)).await;
    }
}

async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(timer) => timer.as_mut().await,
        None => pending().await,
    }
}

async fn next_event(events: &mut Option<RoomEventStream>) -> Option<RoomEvent> {
    match events {
        Some(events) => events.next().await,
        None => pending().await,
    }
}
