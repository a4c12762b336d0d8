// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Non-fatal problems found while producing a configuration.
//!
//! A front end which hits something it can work around (an unknown
//! encapsulation mode, a device missing a VRF it needs) records a
//! warning here and carries on. Each warning is both kept, so callers
//! and tests can inspect what went wrong, and logged through the
//! [`slog::Logger`] the sink was built with.

use core::fmt;
use core::fmt::Display;
use serde::Serialize;
use slog::Discard;
use slog::Logger;
use slog::o;
use slog::warn;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum WarningKind {
    /// Input the front end could not faithfully represent.
    RedFlag,
}

impl Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RedFlag => write!(f, "red-flag"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub msg: String,
}

impl Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.msg)
    }
}

/// A structured warning sink.
#[derive(Clone, Debug)]
pub struct Warnings {
    log: Logger,
    warnings: Vec<Warning>,
}

impl Default for Warnings {
    fn default() -> Self {
        Self::new(&Logger::root(Discard, o!()))
    }
}

impl Warnings {
    pub fn new(log: &Logger) -> Self {
        Self { log: log.new(o!("unit" => "warnings")), warnings: vec![] }
    }

    /// Record and log a red flag.
    pub fn red_flag<S: Into<String>>(&mut self, msg: S) {
        let msg = msg.into();
        let kind = WarningKind::RedFlag;
        warn!(self.log, "{}", msg; "kind" => %kind);
        self.warnings.push(Warning { kind, msg });
    }

    pub fn red_flags(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(|w| w.kind == WarningKind::RedFlag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.warnings.iter()
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// The logger this sink writes to, for callers that want to log
    /// under the same context.
    pub fn logger(&self) -> &Logger {
        &self.log
    }
}
