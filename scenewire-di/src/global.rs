//! Process-wide container, for hosts which can't pass a [Container] around explicitly. Since
//! instances are not thread-safe, there is one such container per thread, which in practice means
//! one for the host's main thread.
//!
//! The first installed container wins: installing another one while a container is present drops
//! the newcomer.

use crate::error::ContainerError;
use crate::factory::{Container, ContainerState};
use std::cell::RefCell;
use tracing::{debug, warn};

thread_local! {
    static CONTAINER: RefCell<Option<Container>> = RefCell::new(None);
}

/// Installs the container, unless another one is already installed. Returns `true` when the
/// given container got installed.
pub fn install(container: Container) -> Result<bool, ContainerError> {
    CONTAINER.with(|current| {
        let mut current = current
            .try_borrow_mut()
            .map_err(|_| ContainerError::ReentrantAccess)?;

        if current.is_some() {
            warn!("A container is already installed. Dropping the new one.");
            return Ok(false);
        }

        debug!("Installing global container.");
        *current = Some(container);
        Ok(true)
    })
}

#[inline]
pub fn is_installed() -> bool {
    CONTAINER.with(|current| {
        current
            .try_borrow()
            .map(|current| current.is_some())
            .unwrap_or(true)
    })
}

/// Runs the function with the installed container.
pub fn with_instance<R, F: FnOnce(&mut Container) -> R>(f: F) -> Result<R, ContainerError> {
    CONTAINER.with(|current| {
        let mut current = current
            .try_borrow_mut()
            .map_err(|_| ContainerError::ReentrantAccess)?;

        current
            .as_mut()
            .map(f)
            .ok_or(ContainerError::NotInstalled)
    })
}

/// Runs the function with the installed container. If there's none, installs the one returned by
/// `init`, starting it first if needed.
pub fn with_instance_or_init<R, I, F>(init: I, f: F) -> Result<R, ContainerError>
where
    I: FnOnce() -> Result<Container, ContainerError>,
    F: FnOnce(&mut Container) -> R,
{
    CONTAINER.with(|current| {
        let mut current = current
            .try_borrow_mut()
            .map_err(|_| ContainerError::ReentrantAccess)?;

        if current.is_none() {
            let mut container = init()?;
            if container.state() == ContainerState::Uninitialized {
                container.start()?;
            }

            debug!("Installing lazily created global container.");
            *current = Some(container);
        }

        current
            .as_mut()
            .map(f)
            .ok_or(ContainerError::NotInstalled)
    })
}

/// Removes and returns the installed container.
pub fn teardown() -> Result<Option<Container>, ContainerError> {
    CONTAINER.with(|current| {
        let container = current
            .try_borrow_mut()
            .map_err(|_| ContainerError::ReentrantAccess)?
            .take();

        if container.is_some() {
            debug!("Removed global container.");
        }

        Ok(container)
    })
}
