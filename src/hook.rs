//! Hook session lifecycle.
//!
//! Installing intercepts on the real OS entry points is platform-specific and
//! lives outside this crate, behind [`HookInstaller`]. The server only
//! manages the lifecycle:
//!
//! ```text
//! FileAccessServer::activate(installer)
//!   └─► installer.install(server)        init
//!         └─► HookSession                active
//!               └─► finish() / drop      teardown (installer.uninstall())
//! ```
//!
//! The installer receives the server as an `Arc` and passes it to its
//! intercept callbacks as captured context, so no global state is involved.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::server::FileAccessServer;

/// Installs and removes the OS-level intercepts for a server.
pub trait HookInstaller {
    /// Route the intercepted entry points to `server`.
    fn install(&mut self, server: Arc<FileAccessServer>) -> Result<()>;

    /// Restore the original entry points.
    fn uninstall(&mut self);
}

/// A live set of intercepts. Uninstalls on [`finish`](HookSession::finish) or drop.
#[must_use = "dropping the session removes the intercepts"]
pub struct HookSession<I: HookInstaller> {
    server: Arc<FileAccessServer>,
    installer: I,
}

impl<I: HookInstaller> HookSession<I> {
    /// The server the intercepts route to.
    pub fn server(&self) -> &Arc<FileAccessServer> {
        &self.server
    }

    /// The installer that owns the intercepts.
    pub fn installer(&self) -> &I {
        &self.installer
    }

    /// Remove the intercepts.
    pub fn finish(self) {
        drop(self);
    }
}

impl<I: HookInstaller> Drop for HookSession<I> {
    fn drop(&mut self) {
        self.installer.uninstall();
        self.server.active.store(false, Ordering::Release);
        debug!("[FileAccessServer] Hooks removed");
    }
}

impl FileAccessServer {
    /// Install intercepts that route to this server.
    ///
    /// Only one session may be live per server at a time.
    pub fn activate<I: HookInstaller>(self: &Arc<Self>, mut installer: I) -> Result<HookSession<I>> {
        if self.active.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyActive);
        }

        if let Err(e) = installer.install(Arc::clone(self)) {
            warn!("[FileAccessServer] {e}");
            self.active.store(false, Ordering::Release);
            return Err(e);
        }

        debug!("[FileAccessServer] Hooks installed");
        Ok(HookSession {
            server: Arc::clone(self),
            installer,
        })
    }

    /// Check if a hook session is live.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}
