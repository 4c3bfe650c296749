//! The logging hub: level registry, dispatch, history and submission.
//!
//! A [`Hub`] owns everything a logging setup needs: the registered levels and their listeners, the configuration,
//! the serializer, the history of dispatched entries and the teardown registry.
//! Handles are cheap to clone and all clones refer to the same hub.
//!
//! Most applications use the process-wide hub returned by [`global`][crate::global], optionally configured up front
//! through [`HubBuilder::set_global`].
//!
//! # Examples
//!
//! ```rust
//! use logrelay::{Hub, args};
//!
//! let hub = Hub::new();
//! let audit = hub.add_level("audit").unwrap();
//!
//! hub.on("audit", |entry: &logrelay::LogEntry| println!("[{}] {}", entry.level, entry.message));
//!
//! hub.level("audit").unwrap().call(&args!["user %s logged in", "ada"]);
//! assert_eq!(hub.get(audit.as_str(), None)[0].message, "user ada logged in");
//! ```

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde_json::Value;

use crate::config::HubConfig;
use crate::entry::{Clock, LogEntry, SystemClock, Timestamp};
use crate::format::{JsonSerializer, Serializer, format_message};
use crate::global::SetGlobalError;
use crate::history::History;
use crate::isolate::isolate;
use crate::level::{BuiltinLevel, Level, LevelSpec, WILDCARD};
use crate::listener::{Listener, ListenerTable, SharedListener};
use crate::schedule::{Scheduler, ThreadScheduler};
use crate::submit::{Delivery, NoTransport, SubmitError, Transport};
use crate::teardown::{Teardown, TeardownGuard};

/// Names that cannot be used for custom levels because they name methods of [`Hub`], its own and those of the
/// traits it implements.
///
/// Sorted, so membership is a binary search.
const RESERVED_NAMES: &[&str] = &[
    "add_level",
    "builder",
    "clone",
    "clone_from",
    "config",
    "default",
    "dispatch",
    "dispatch_with_detail",
    "downgrade",
    "emit",
    "fmt",
    "get",
    "history",
    "level",
    "levels",
    "new",
    "now",
    "on",
    "on_shared",
    "on_teardown",
    "ptr_eq",
    "read_config",
    "register_level",
    "scheduler",
    "serializer",
    "set_serializer",
    "submit",
    "submit_to",
    "teardown",
    "teardown_guard",
    "try_submit",
    "try_submit_to",
    "update_config",
];

/// The reasons a custom level can be rejected by [`Hub::add_level`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddLevelError {
    /// The name is empty or only whitespace.
    #[error("level name is empty")]
    Empty,

    /// The name contains whitespace and could never be named in a level specification.
    #[error("level name `{0}` contains whitespace")]
    Whitespace(String),

    /// The name is the wildcard token.
    #[error("`*` is reserved for wildcard subscriptions")]
    Wildcard,

    /// The name is a built-in level.
    #[error("`{0}` is a built-in level")]
    Builtin(BuiltinLevel),

    /// The name collides with a hub operation.
    #[error("`{0}` is a reserved name")]
    Reserved(String),

    /// A custom level with this name already exists.
    #[error("level `{0}` already exists")]
    Exists(String),
}

struct HubInner {
    listeners: RwLock<ListenerTable>,
    config: RwLock<HubConfig>,
    serializer: RwLock<Arc<dyn Serializer>>,
    clock: Box<dyn Clock>,
    transport: Box<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    history: Arc<History>,
    // Subscribed to every level, kept to subscribe it to custom levels as they are added.
    history_listener: SharedListener,
    teardown: Teardown,
}

/// A handle to a logging hub.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

/// A non-owning handle to a [`Hub`].
///
/// Reporters and timers hold weak handles, so a hub and everything attached to it is freed once the application
/// drops its last [`Hub`].
#[derive(Debug, Clone)]
pub struct WeakHub {
    inner: Weak<HubInner>,
}

impl WeakHub {
    /// Returns the hub if it is still alive.
    pub fn upgrade(&self) -> Option<Hub> {
        self.inner.upgrade().map(|inner| Hub { inner })
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    /// Creates a hub with the default configuration, the system clock and no transport.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder to configure a new hub.
    pub fn builder() -> HubBuilder {
        HubBuilder::default()
    }

    /// Returns a weak handle to this hub.
    pub fn downgrade(&self) -> WeakHub {
        WeakHub {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Whether both handles refer to the same hub.
    pub fn ptr_eq(&self, other: &Hub) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Subscribes `listener` to the levels named by `levels` and returns how many levels it was added to.
    ///
    /// The wildcard `*` subscribes to the built-in levels only. Names of levels that do not exist are skipped.
    pub fn on(&self, levels: impl Into<LevelSpec>, listener: impl Listener + 'static) -> usize {
        self.on_shared(levels, Arc::new(listener))
    }

    /// Like [`Hub::on`], for a listener that is already shared.
    pub fn on_shared(&self, levels: impl Into<LevelSpec>, listener: SharedListener) -> usize {
        let levels = levels.into();
        let subscribed = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribe(&levels, &listener);

        tracing::trace!(%levels, subscribed, "listener subscribed");
        subscribed
    }

    /// Registers a custom level.
    ///
    /// The new level starts without listeners except the history, and is never covered by wildcard subscriptions.
    ///
    /// # Errors
    ///
    /// See [`AddLevelError`] for the names that are rejected.
    pub fn add_level(&self, name: &str) -> Result<Level, AddLevelError> {
        let result = self.register_level(name);
        match &result {
            Ok(level) => tracing::debug!(%level, "custom level added"),
            Err(error) => tracing::debug!(?error, "custom level rejected"),
        }
        result
    }

    fn register_level(&self, name: &str) -> Result<Level, AddLevelError> {
        if name.trim().is_empty() {
            return Err(AddLevelError::Empty);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(AddLevelError::Whitespace(name.to_owned()));
        }
        if name == WILDCARD {
            return Err(AddLevelError::Wildcard);
        }
        if let Ok(builtin) = name.parse::<BuiltinLevel>() {
            return Err(AddLevelError::Builtin(builtin));
        }
        if RESERVED_NAMES.binary_search(&name).is_ok() {
            return Err(AddLevelError::Reserved(name.to_owned()));
        }

        let level = Level::new(name.to_owned());
        let mut listeners = self
            .inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if !listeners.insert_level(level.clone()) {
            return Err(AddLevelError::Exists(name.to_owned()));
        }
        listeners.subscribe(
            &LevelSpec::Names(vec![name.to_owned()]),
            &self.inner.history_listener,
        );

        Ok(level)
    }

    /// Returns the dispatch handle of the level named `name`, built-in or custom.
    pub fn level(&self, name: &str) -> Option<LevelHandle> {
        let level = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;

        Some(LevelHandle {
            hub: self.clone(),
            level,
        })
    }

    /// Returns all registered levels, built-in levels first, then custom levels in the order they were added.
    pub fn levels(&self) -> Vec<Level> {
        self.inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .levels()
            .cloned()
            .collect()
    }

    /// Formats `arguments` and dispatches the message to the listeners of a built-in level.
    pub fn dispatch(&self, level: BuiltinLevel, arguments: &[Value]) {
        self.emit(&level.level(), arguments, None);
    }

    /// Dispatches to the `error` level.
    pub fn error(&self, arguments: &[Value]) {
        self.dispatch(BuiltinLevel::Error, arguments);
    }

    /// Dispatches to the `warn` level.
    pub fn warn(&self, arguments: &[Value]) {
        self.dispatch(BuiltinLevel::Warn, arguments);
    }

    /// Dispatches to the `info` level.
    pub fn info(&self, arguments: &[Value]) {
        self.dispatch(BuiltinLevel::Info, arguments);
    }

    /// Dispatches to the `log` level.
    pub fn log(&self, arguments: &[Value]) {
        self.dispatch(BuiltinLevel::Log, arguments);
    }

    /// Dispatches to the `debug` level.
    pub fn debug(&self, arguments: &[Value]) {
        self.dispatch(BuiltinLevel::Debug, arguments);
    }

    /// Dispatches to any registered level, attaching `detail` to the entry.
    ///
    /// Returns `false`, without formatting anything, if `level` is not registered.
    pub fn dispatch_with_detail(
        &self,
        level: &Level,
        arguments: &[Value],
        detail: Option<Value>,
    ) -> bool {
        self.emit(level, arguments, detail)
    }

    fn emit(&self, level: &Level, arguments: &[Value], detail: Option<Value>) -> bool {
        let listeners = {
            let table = self
                .inner
                .listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if !table.contains(level.as_str()) {
                return false;
            }
            table.listeners(level)
        };

        let message = format_message(arguments, &*self.serializer());
        let mut entry = LogEntry::new(self.now(), level.clone(), message);
        entry.detail = detail;

        for listener in listeners {
            if isolate(|| listener.notify(&entry)).is_none() {
                tracing::debug!(%level, "listener panicked, continuing with the next one");
            }
        }

        true
    }

    /// Returns the dispatched entries of `levels` newer than `since`, oldest first.
    ///
    /// An empty specification selects every level, like the wildcard.
    pub fn get(&self, levels: impl Into<LevelSpec>, since: Option<Timestamp>) -> Vec<LogEntry> {
        let levels = levels.into();
        if levels.is_empty() {
            return self.inner.history.get(&LevelSpec::Wildcard, since);
        }
        self.inner.history.get(&levels, since)
    }

    /// Returns the history of this hub.
    pub fn history(&self) -> &History {
        &self.inner.history
    }

    /// Submits `entries` to the configured endpoint, returning whether the transport accepted them.
    ///
    /// Failures are reported through `tracing` and never retried.
    pub fn submit(&self, entries: &[LogEntry], delivery: Delivery) -> bool {
        self.submit_to(None, entries, delivery)
    }

    /// Like [`Hub::submit`], but `endpoint` overrides the configured endpoint.
    pub fn submit_to(
        &self,
        endpoint: Option<&str>,
        entries: &[LogEntry],
        delivery: Delivery,
    ) -> bool {
        match self.try_submit_to(endpoint, entries, delivery) {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(?error, entries = entries.len(), "failed to submit log entries");
                false
            }
        }
    }

    /// Submits `entries` to the configured endpoint.
    ///
    /// # Errors
    ///
    /// See [`SubmitError`].
    pub fn try_submit(&self, entries: &[LogEntry], delivery: Delivery) -> Result<(), SubmitError> {
        self.try_submit_to(None, entries, delivery)
    }

    /// Submits `entries` to `endpoint`, or to the configured endpoint if `None`.
    ///
    /// The entries are sent as one request whose body is the JSON array of entries, run through the hub's serializer.
    ///
    /// # Errors
    ///
    /// See [`SubmitError`].
    pub fn try_submit_to(
        &self,
        endpoint: Option<&str>,
        entries: &[LogEntry],
        delivery: Delivery,
    ) -> Result<(), SubmitError> {
        let endpoint = match endpoint {
            Some(endpoint) => Some(endpoint.to_owned()),
            None => self.read_config(|config| config.submit_url.clone()),
        }
        .filter(|endpoint| !endpoint.is_empty())
        .ok_or(SubmitError::NoEndpoint)?;

        let payload = serde_json::to_value(entries).map_err(SubmitError::Serialize)?;
        let serializer = self.serializer();
        let body =
            isolate(|| serializer.serialize(&payload)).unwrap_or_else(|| payload.to_string());

        tracing::trace!(%endpoint, entries = entries.len(), ?delivery, "submitting log entries");

        self.inner
            .transport
            .send(&endpoint, body, delivery)
            .map_err(|source| SubmitError::Transport { endpoint, source })
    }

    fn read_config<T>(&self, f: impl FnOnce(&HubConfig) -> T) -> T {
        let config = self
            .inner
            .config
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        f(&config)
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> HubConfig {
        self.read_config(HubConfig::clone)
    }

    /// Modifies the configuration.
    ///
    /// Reporters read the configuration when they are set up and whenever they submit, so changes to the endpoint
    /// apply to their next flush.
    pub fn update_config(&self, f: impl FnOnce(&mut HubConfig)) {
        let mut config = self
            .inner
            .config
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        f(&mut config);
    }

    /// Returns the current serializer.
    pub fn serializer(&self) -> Arc<dyn Serializer> {
        Arc::clone(
            &self
                .inner
                .serializer
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Replaces the serializer used for structured arguments and submission payloads.
    pub fn set_serializer(&self, serializer: impl Serializer + 'static) {
        *self
            .inner
            .serializer
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(serializer);
    }

    pub(crate) fn scheduler(&self) -> &dyn Scheduler {
        &*self.inner.scheduler
    }

    /// Returns the current time of the hub's clock.
    pub fn now(&self) -> Timestamp {
        self.inner.clock.now()
    }

    /// Registers `hook` to run at teardown.
    pub fn on_teardown(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.inner.teardown.register(hook);
    }

    /// Runs all teardown hooks on the calling thread.
    ///
    /// Reporters flush what they buffered using [`Delivery::Blocking`], so this returns once those submissions have
    /// completed. Calling it again is harmless: reporters that have nothing buffered do not submit.
    pub fn teardown(&self) {
        self.inner.teardown.run();
    }

    /// Returns a guard that runs [`Hub::teardown`] when dropped.
    pub fn teardown_guard(&self) -> TeardownGuard {
        TeardownGuard::new(self.clone())
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field(
                "levels",
                &*self
                    .inner
                    .listeners
                    .read()
                    .unwrap_or_else(PoisonError::into_inner),
            )
            .field("config", &self.config())
            .field("serializer", &self.serializer())
            .field("transport", &self.inner.transport)
            .field("scheduler", &self.inner.scheduler)
            .field("history", &self.inner.history.len())
            .field("teardown", &self.inner.teardown)
            .finish_non_exhaustive()
    }
}

/// The dispatch function of a single level, looked up by name through [`Hub::level`].
#[derive(Debug, Clone)]
pub struct LevelHandle {
    hub: Hub,
    level: Level,
}

impl LevelHandle {
    /// Returns the level this handle dispatches to.
    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Formats `arguments` and dispatches the message to the listeners of this level.
    pub fn call(&self, arguments: &[Value]) {
        self.hub.emit(&self.level, arguments, None);
    }

    /// Like [`LevelHandle::call`], attaching `detail` to the entry.
    pub fn call_with_detail(&self, arguments: &[Value], detail: Value) {
        self.hub.emit(&self.level, arguments, Some(detail));
    }
}

/// Configures a [`Hub`].
///
/// Created via [`Hub::builder`], finalized with [`build`](HubBuilder::build) or
/// [`set_global`](HubBuilder::set_global).
///
/// ```rust
/// use logrelay::Hub;
///
/// let hub = Hub::builder()
///     .submit_url("https://logs.example.com/ingest")
///     .default_level("error warn")
///     .batch_size(50)
///     .build();
///
/// assert_eq!(hub.config().batch_size, 50);
/// ```
#[must_use]
pub struct HubBuilder {
    config: HubConfig,
    clock: Box<dyn Clock>,
    transport: Box<dyn Transport>,
    scheduler: Arc<dyn Scheduler>,
    serializer: Arc<dyn Serializer>,
}

impl Default for HubBuilder {
    fn default() -> Self {
        Self {
            config: HubConfig::default(),
            clock: Box::new(SystemClock),
            transport: Box::new(NoTransport),
            scheduler: Arc::new(ThreadScheduler),
            serializer: Arc::new(JsonSerializer),
        }
    }
}

impl HubBuilder {
    /// Replaces the whole configuration.
    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the endpoint submissions go to.
    pub fn submit_url(mut self, url: impl Into<String>) -> Self {
        self.config.submit_url = Some(url.into());
        self
    }

    /// Sets the levels reporters subscribe to by default.
    pub fn default_level(mut self, levels: impl Into<LevelSpec>) -> Self {
        self.config.default_level = levels.into();
        self
    }

    /// Sets the default batch size of batch reporters.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Sets the clock that timestamps entries.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets the transport submissions are sent through.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    /// Sets the scheduler that runs periodic flushes.
    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Arc::new(scheduler);
        self
    }

    /// Sets the serializer for structured arguments and submission payloads.
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Builds the hub.
    ///
    /// The history is the first listener of every built-in level.
    pub fn build(self) -> Hub {
        let history = Arc::new(History::new());
        let history_listener: SharedListener = {
            let history = Arc::clone(&history);
            Arc::new(move |entry: &LogEntry| history.record(entry))
        };

        let mut listeners = ListenerTable::with_builtin_levels();
        listeners.subscribe(&LevelSpec::Wildcard, &history_listener);

        Hub {
            inner: Arc::new(HubInner {
                listeners: RwLock::new(listeners),
                config: RwLock::new(self.config),
                serializer: RwLock::new(self.serializer),
                clock: self.clock,
                transport: self.transport,
                scheduler: self.scheduler,
                history,
                history_listener,
                teardown: Teardown::new(),
            }),
        }
    }

    /// Builds the hub and installs it as the process-wide default returned by [`global`][crate::global].
    ///
    /// # Errors
    ///
    /// Fails if the global hub has already been set or was already used.
    pub fn set_global(self) -> Result<&'static Hub, SetGlobalError> {
        crate::global::set_global(self.build())
    }
}

impl fmt::Debug for HubBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubBuilder")
            .field("config", &self.config)
            .field("transport", &self.transport)
            .field("scheduler", &self.scheduler)
            .field("serializer", &self.serializer)
            .finish_non_exhaustive()
    }
}
