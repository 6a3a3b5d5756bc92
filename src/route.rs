//! Routes: how a (possibly nested) file open was reached.
//!
//! When an emulator opens another file while building its content, that
//! inner open sees a route extended by the outer file's path:
//!
//! ```text
//! open("data.pak")                     route: data.pak
//! └── emulator opens "script.bf"       route: data.pak/script.bf
//!     └── emulator opens "x.flow"      route: data.pak/script.bf/x.flow
//! ```
//!
//! Sibling opens never see each other's segments, because every open
//! restores the route it started with before returning.

use std::cell::RefCell;
use std::fmt;

/// Separator between route segments in the full path.
pub const ROUTE_SEPARATOR: char = '/';

/// The composed logical path of a nested open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Route {
    segments: Vec<String>,
    full_path: String,
}

impl Route {
    /// Create a route with a single segment.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            full_path: path.clone(),
            segments: vec![path],
        }
    }

    /// The empty route (no opens in progress).
    pub const fn empty() -> Self {
        Self {
            segments: Vec::new(),
            full_path: String::new(),
        }
    }

    /// Check if no segments are recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Return this route with `path` appended as the next segment.
    ///
    /// Merging onto an empty route is the same as [`Route::new`]. The path is
    /// taken as-is; no normalization is applied.
    pub fn merge(&self, path: impl Into<String>) -> Self {
        if self.is_empty() {
            return Self::new(path);
        }
        let path = path.into();
        let mut full_path = String::with_capacity(self.full_path.len() + 1 + path.len());
        full_path.push_str(&self.full_path);
        full_path.push(ROUTE_SEPARATOR);
        full_path.push_str(&path);

        let mut segments = self.segments.clone();
        segments.push(path);
        Self { segments, full_path }
    }

    /// Recorded segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The full path, or `None` for the empty route.
    pub fn full_path(&self) -> Option<&str> {
        (!self.is_empty()).then_some(self.full_path.as_str())
    }

    /// The full path, or `""` for the empty route.
    pub fn full_path_or_empty(&self) -> &str {
        &self.full_path
    }

    /// Check if `fragment` occurs in this route's full path.
    ///
    /// Emulators use this to ask "was this file reached through X?", e.g.
    /// `route.matches("data.pak/script.bf")`. An empty fragment matches
    /// only the empty route.
    pub fn matches(&self, fragment: &str) -> bool {
        if fragment.is_empty() {
            return self.is_empty();
        }
        self.full_path.contains(fragment)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

// =============================================================================
// RouteScope - Stack Discipline
// =============================================================================

/// Restores a route slot to its entry value when dropped.
///
/// Created at the top of every open. Drop runs on every exit path,
/// including early returns and unwinding.
pub(crate) struct RouteScope<'a> {
    slot: &'a RefCell<Route>,
    saved: Route,
}

impl<'a> RouteScope<'a> {
    /// Snapshot the current route.
    pub(crate) fn enter(slot: &'a RefCell<Route>) -> Self {
        let saved = slot.borrow().clone();
        Self { slot, saved }
    }

    /// The route as it was when the scope was entered.
    pub(crate) fn saved(&self) -> &Route {
        &self.saved
    }

    /// Extend the live route with `path` for the rest of this scope.
    pub(crate) fn push(&self, path: &str) -> Route {
        let mut current = self.slot.borrow_mut();
        *current = current.merge(path);
        current.clone()
    }
}

impl Drop for RouteScope<'_> {
    fn drop(&mut self) {
        *self.slot.borrow_mut() = std::mem::take(&mut self.saved);
    }
}
