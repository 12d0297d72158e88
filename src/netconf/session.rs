use super::rpc::RpcReply;
use super::SessionError;
use crate::snippets::Fragment;

/// The operations a provisioning run needs from a device session.
///
/// Implementations block; run them from `spawn_blocking`.
pub trait DeviceSession {
    /// Errors when the device refuses the lock.
    fn lock(&mut self, target: &str) -> Result<(), SessionError>;

    fn unlock(&mut self, target: &str) -> Result<(), SessionError>;

    /// Submit one `<config>` fragment. The reply is returned as-is; callers
    /// decide whether it counts as success.
    fn edit_config(&mut self, target: &str, config: &Fragment) -> Result<RpcReply, SessionError>;

    fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

impl<S: DeviceSession + ?Sized> DeviceSession for &mut S {
    fn lock(&mut self, target: &str) -> Result<(), SessionError> {
        (**self).lock(target)
    }

    fn unlock(&mut self, target: &str) -> Result<(), SessionError> {
        (**self).unlock(target)
    }

    fn edit_config(&mut self, target: &str, config: &Fragment) -> Result<RpcReply, SessionError> {
        (**self).edit_config(target, config)
    }

    fn close(&mut self) -> Result<(), SessionError> {
        (**self).close()
    }
}

/// Holds a datastore lock for as long as it lives.
///
/// Call [`ConfigLock::release`] to unlock and see the result. If the guard is
/// dropped instead (early return, panic) it unlocks on the way out and logs
/// any failure. Either way the unlock is sent exactly once.
pub struct ConfigLock<'a, S: DeviceSession> {
    session: &'a mut S,
    target: &'static str,
    held: bool,
}

impl<'a, S: DeviceSession> ConfigLock<'a, S> {
    pub fn acquire(session: &'a mut S, target: &'static str) -> Result<Self, SessionError> {
        session.lock(target)?;
        tracing::debug!("Locked {} datastore", target);
        Ok(Self {
            session,
            target,
            held: true,
        })
    }

    pub fn session(&mut self) -> &mut S {
        self.session
    }

    pub fn release(mut self) -> Result<(), SessionError> {
        self.held = false;
        let result = self.session.unlock(self.target);
        if result.is_ok() {
            tracing::debug!("Unlocked {} datastore", self.target);
        }
        result
    }
}

impl<S: DeviceSession> Drop for ConfigLock<'_, S> {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        if let Err(e) = self.session.unlock(self.target) {
            tracing::error!("Failed to unlock {} datastore: {}", self.target, e);
        }
    }
}
