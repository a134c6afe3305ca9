//! Comparison configuration and the options that build it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{DiffError, Result};
use crate::hooks::{FnFormat, FnTransform, Format, Registry, Transform};
use crate::reflect::Reflect;

/// How much each difference line says.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Level {
    /// `path: message`
    #[default]
    Auto,
    /// `path` alone.
    PathOnly,
    /// `path: <full A> != <full B>`
    Full,
}

impl FromStr for Level {
    type Err = DiffError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Level::Auto),
            "path-only" | "path_only" | "pathonly" => Ok(Level::PathOnly),
            "full" => Ok(Level::Full),
            _ => Err(DiffError::UnknownLevel(s.to_string())),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Auto => "auto",
            Level::PathOnly => "path-only",
            Level::Full => "full",
        })
    }
}

/// Settings for one comparison. Read-only while a comparison runs, so one
/// value can serve any number of comparisons.
#[derive(Clone, Default)]
pub struct Config {
    pub level: Level,
    /// Treat any two function values as equal instead of comparing them.
    pub equal_funcs: bool,
    pub hooks: Registry,
}

impl Config {
    /// Defaults with `opts` applied in order.
    pub fn new(opts: impl IntoIterator<Item = DiffOption>) -> Self {
        let mut config = Self::default();
        config.apply(opts);
        config
    }

    /// Apply `opts` in order; later options override earlier ones and a hook
    /// replaces any hook already registered for the same type.
    pub fn apply(&mut self, opts: impl IntoIterator<Item = DiffOption>) {
        for opt in opts {
            match opt {
                DiffOption::Level(level) => self.level = level,
                DiffOption::EqualFuncs(on) => self.equal_funcs = on,
                DiffOption::Transform(hook) => self.hooks.register_transform(hook),
                DiffOption::Format(hook) => self.hooks.register_format(hook),
                DiffOption::List(opts) => self.apply(opts),
            }
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("level", &self.level)
            .field("equal_funcs", &self.equal_funcs)
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// One configuration option.
#[derive(Clone)]
pub enum DiffOption {
    Level(Level),
    EqualFuncs(bool),
    Transform(Arc<dyn Transform>),
    Format(Arc<dyn Format>),
    /// Several options applied in order.
    List(Vec<DiffOption>),
}

impl DiffOption {
    /// Compare values of type `T` through `f`: two `T`s whose images are equal
    /// are equal, whatever else differs.
    ///
    /// ```
    /// use reflect_diff::{lines, DiffOption};
    ///
    /// let opt = DiffOption::transform(|s: &String| s.trim().to_string());
    /// assert!(lines(&" a ".to_string(), &"a".to_string(), [opt]).is_empty());
    /// ```
    pub fn transform<T, U, F>(f: F) -> Self
    where
        T: Reflect,
        U: Reflect,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        DiffOption::Transform(Arc::new(FnTransform::new(f)))
    }

    /// Describe differing values of type `T` with `f` instead of the default
    /// structural report.
    pub fn format<T, F>(f: F) -> Self
    where
        T: Reflect,
        F: Fn(&T, &T) -> String + Send + Sync + 'static,
    {
        DiffOption::Format(Arc::new(FnFormat::new(f)))
    }

    pub fn with_transform(hook: impl Transform + 'static) -> Self {
        DiffOption::Transform(Arc::new(hook))
    }

    pub fn with_format(hook: impl Format + 'static) -> Self {
        DiffOption::Format(Arc::new(hook))
    }
}
