//! Redirection of the application's Direct3D 8 entry point into the shim.

use std::sync::atomic::{AtomicBool, Ordering};

use fxshim_core::runtime::{HookInstaller, ModuleResolver};
use tracing::{debug, info, warn};

pub const ENTRY_MODULE: &str = "d3d8.dll";
pub const ENTRY_SYMBOL: &str = "Direct3DCreate8";

/// Tracks whether the entry hooks were installed.
///
/// Installation happens once per process; later requests do nothing.
#[derive(Debug, Default)]
pub struct EntryHooks {
    installed: AtomicBool,
}

impl EntryHooks {
    pub const fn new() -> Self {
        Self {
            installed: AtomicBool::new(false),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    /// Redirects `d3d8.dll!Direct3DCreate8` to `entry`.
    ///
    /// Returns whether the redirection is in place. A failed attempt can be retried.
    pub fn install(&self, installer: &mut dyn HookInstaller, resolver: &dyn ModuleResolver, entry: usize) -> bool {
        if self.is_installed() {
            debug!("entry hooks already installed");
            return true;
        }
        let Some(source) = resolver.resolve(ENTRY_MODULE, ENTRY_SYMBOL) else {
            warn!(module = ENTRY_MODULE, symbol = ENTRY_SYMBOL, "entry point not found");
            return false;
        };
        if !installer.install_hook(ENTRY_SYMBOL, source, entry) {
            warn!(symbol = ENTRY_SYMBOL, source = format_args!("{source:#x}"), "hook installation failed");
            return false;
        }
        self.installed.store(true, Ordering::Release);
        info!(symbol = ENTRY_SYMBOL, source = format_args!("{source:#x}"), dest = format_args!("{entry:#x}"), "entry hook installed");
        true
    }
}

static ENTRY_HOOKS: EntryHooks = EntryHooks::new();

/// Installs the process-wide entry hooks; see [`EntryHooks::install`].
pub fn install_entry_hooks(installer: &mut dyn HookInstaller, resolver: &dyn ModuleResolver, entry: usize) -> bool {
    ENTRY_HOOKS.install(installer, resolver, entry)
}
