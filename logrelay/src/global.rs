//! The process-wide default hub.

use std::sync::OnceLock;
use std::{error, fmt};

use crate::hub::Hub;

static GLOBAL_HUB: OnceLock<Hub> = OnceLock::new();

/// Returns the process-wide hub.
///
/// The first call creates a hub with the default configuration unless one was installed through
/// [`set_global`] or [`HubBuilder::set_global`][crate::HubBuilder::set_global] before.
pub fn global() -> &'static Hub {
    GLOBAL_HUB.get_or_init(Hub::new)
}

/// Installs `hub` as the process-wide hub.
///
/// # Errors
///
/// Fails if a global hub has already been installed or created by a call to [`global`].
pub fn set_global(hub: Hub) -> Result<&'static Hub, SetGlobalError> {
    let mut hub = Some(hub);
    let installed = GLOBAL_HUB.get_or_init(|| {
        // `get_or_init` only runs this once, on the call that wins.
        hub.take().unwrap_or_default()
    });

    if hub.is_none() {
        Ok(installed)
    } else {
        Err(SetGlobalError(()))
    }
}

/// The type returned by [`set_global`] if the global hub has already been initialized.
#[derive(Debug)]
pub struct SetGlobalError(());

impl SetGlobalError {
    const MESSAGE: &'static str = "a global hub has already been set";
}

impl fmt::Display for SetGlobalError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(Self::MESSAGE)
    }
}

impl error::Error for SetGlobalError {}
