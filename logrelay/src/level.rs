//! Log levels and level specifications.
//!
//! A level is a named channel. There is a fixed set of built-in levels, see [`BuiltinLevel`], and any number of
//! custom levels registered at runtime through [`Hub::add_level`][crate::Hub::add_level].
//! Levels are not ordered by severity, every level is enabled or subscribed to independently.
//!
//! Subscriptions and queries name their levels through a [`LevelSpec`]: either the wildcard `*`, which only ever
//! expands to the built-in levels, or a whitespace-separated list of names.
//!
//! # Examples
//!
//! ```rust
//! use logrelay::level::{BuiltinLevel, Level, LevelSpec};
//!
//! assert_eq!(Level::from(BuiltinLevel::Warn), Level::WARN);
//! assert_eq!(Level::WARN.builtin(), Some(BuiltinLevel::Warn));
//!
//! let spec: LevelSpec = "error  warn".parse().unwrap();
//! assert!(spec.matches(&Level::ERROR));
//! assert!(!spec.matches(&Level::INFO));
//! ```

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The token that subscribes to, or queries, all built-in levels.
pub const WILDCARD: &str = "*";

/// The fixed set of levels every hub provides.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinLevel {
    /// `error`
    Error,
    /// `warn`
    Warn,
    /// `info`
    Info,
    /// `log`
    Log,
    /// `debug`
    Debug,
}

impl BuiltinLevel {
    /// All built-in levels, in the order they are registered.
    pub const ALL: [BuiltinLevel; 5] = [
        BuiltinLevel::Error,
        BuiltinLevel::Warn,
        BuiltinLevel::Info,
        BuiltinLevel::Log,
        BuiltinLevel::Debug,
    ];

    /// Returns the level name.
    pub const fn as_str(self) -> &'static str {
        match self {
            BuiltinLevel::Error => "error",
            BuiltinLevel::Warn => "warn",
            BuiltinLevel::Info => "info",
            BuiltinLevel::Log => "log",
            BuiltinLevel::Debug => "debug",
        }
    }

    /// Returns the [`Level`] for this built-in level.
    pub const fn level(self) -> Level {
        Level(Cow::Borrowed(self.as_str()))
    }
}

impl fmt::Display for BuiltinLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a name that is not a built-in level.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not a built-in level")]
pub struct NotBuiltinError(String);

impl FromStr for BuiltinLevel {
    type Err = NotBuiltinError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        BuiltinLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == name)
            .ok_or_else(|| NotBuiltinError(name.to_owned()))
    }
}

/// A level name, either built-in or custom.
///
/// Cloning a built-in level never allocates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Level(Cow<'static, str>);

impl Level {
    /// The `error` level.
    pub const ERROR: Level = BuiltinLevel::Error.level();
    /// The `warn` level.
    pub const WARN: Level = BuiltinLevel::Warn.level();
    /// The `info` level.
    pub const INFO: Level = BuiltinLevel::Info.level();
    /// The `log` level.
    pub const LOG: Level = BuiltinLevel::Log.level();
    /// The `debug` level.
    pub const DEBUG: Level = BuiltinLevel::Debug.level();

    /// Creates a level from an arbitrary name.
    ///
    /// This does not register anything, see [`Hub::add_level`][crate::Hub::add_level].
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// Returns the level name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the built-in level with this name, if any.
    pub fn builtin(&self) -> Option<BuiltinLevel> {
        self.as_str().parse().ok()
    }

    /// Whether this is one of the built-in levels.
    pub fn is_builtin(&self) -> bool {
        self.builtin().is_some()
    }
}

impl From<BuiltinLevel> for Level {
    fn from(level: BuiltinLevel) -> Self {
        level.level()
    }
}

impl AsRef<str> for Level {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Level {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Level {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Which levels a subscription or query refers to.
///
/// Parsing never fails: `*` is the wildcard, anything else is split on whitespace and empty fragments are dropped.
/// Names are not validated against a registry, unknown names simply never match anything that exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LevelSpec {
    /// All built-in levels.
    #[default]
    Wildcard,
    /// An explicit list of level names.
    Names(Vec<String>),
}

impl LevelSpec {
    /// Parses a level specification.
    pub fn parse(spec: &str) -> Self {
        if spec.trim() == WILDCARD {
            LevelSpec::Wildcard
        } else {
            LevelSpec::Names(spec.split_whitespace().map(str::to_owned).collect())
        }
    }

    /// Whether this is the wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, LevelSpec::Wildcard)
    }

    /// Whether no level is named at all, e.g. when parsed from an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            LevelSpec::Wildcard => false,
            LevelSpec::Names(names) => names.is_empty(),
        }
    }

    /// Whether an entry of `level` is selected by this specification.
    ///
    /// The wildcard selects every level here: it only restricts subscriptions, a query for `*` is unfiltered.
    pub fn matches(&self, level: &Level) -> bool {
        match self {
            LevelSpec::Wildcard => true,
            LevelSpec::Names(names) => names.iter().any(|name| level == name.as_str()),
        }
    }

    /// Returns the levels this specification subscribes to.
    ///
    /// The wildcard expands to the built-in levels only.
    pub fn subscription_levels(&self) -> Vec<Level> {
        match self {
            LevelSpec::Wildcard => BuiltinLevel::ALL.into_iter().map(Level::from).collect(),
            LevelSpec::Names(names) => names.iter().cloned().map(Level::new).collect(),
        }
    }
}

impl FromStr for LevelSpec {
    type Err = Infallible;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(spec))
    }
}

impl From<&str> for LevelSpec {
    fn from(spec: &str) -> Self {
        Self::parse(spec)
    }
}

impl From<String> for LevelSpec {
    fn from(spec: String) -> Self {
        Self::parse(&spec)
    }
}

impl From<BuiltinLevel> for LevelSpec {
    fn from(level: BuiltinLevel) -> Self {
        LevelSpec::Names(vec![level.as_str().to_owned()])
    }
}

impl From<LevelSpec> for String {
    fn from(spec: LevelSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for LevelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSpec::Wildcard => f.write_str(WILDCARD),
            LevelSpec::Names(names) => f.write_str(&names.join(" ")),
        }
    }
}
