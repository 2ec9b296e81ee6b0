//! Compilation events and their observers.
//!
//! The compiler never logs directly. It reports what it did and what it
//! found through a [`CompileObserver`], and the binaries decide where that
//! goes. [`LogObserver`] forwards to the `log` facade.

use log::{debug, info, warn};
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;

use crate::compiler::UnroutedPortPolicy;

/// A switch port that no compiled rule matches
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UnroutedPortWarning {
    pub switch: String,
    pub port: u16,
    /// Node on the far side of the port
    pub peer: String,
    /// What was installed for the port instead
    pub fallback: UnroutedPortPolicy,
}

impl fmt::Display for UnroutedPortWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Port {} on switch '{}' (towards '{}') has no forwarding rule",
            self.port, self.switch, self.peer
        )?;
        match self.fallback {
            UnroutedPortPolicy::Warn => Ok(()),
            UnroutedPortPolicy::Drop => write!(f, ", installed drop rule"),
            UnroutedPortPolicy::Normal => write!(f, ", installed NORMAL rule"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CompileEvent {
    /// A slice has no access switch; its hosts cannot reach anything
    SliceUnreachable { slice: String },
    TableCompiled { switch: String, rules: usize },
    UnroutedPort(UnroutedPortWarning),
    CompilationFinished { switches: usize, rules: usize, warnings: usize },
}

/// Receives events while a rule set is being compiled
pub trait CompileObserver {
    fn notify(&self, event: &CompileEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl CompileObserver for LogObserver {
    fn notify(&self, event: &CompileEvent) {
        match event {
            CompileEvent::SliceUnreachable { slice } => {
                warn!("Slice '{}' has no access switch, its hosts are unreachable", slice)
            }
            CompileEvent::TableCompiled { switch, rules } => {
                debug!("Compiled {} rules for switch '{}'", rules, switch)
            }
            CompileEvent::UnroutedPort(warning) => warn!("{}", warning),
            CompileEvent::CompilationFinished { switches, rules, warnings } => info!(
                "Compiled {} rules across {} switches ({} warnings)",
                rules, switches, warnings
            ),
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl CompileObserver for NullObserver {
    fn notify(&self, _event: &CompileEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<CompileEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CompileEvent> {
        self.events.borrow().clone()
    }
}

impl CompileObserver for RecordingObserver {
    fn notify(&self, event: &CompileEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
