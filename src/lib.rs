//! Core implementation of qs (quick-scripts)
//!
//! qs keeps a catalogue of shell one-liners ("actions") in layered `.qs.cfg`
//! files. An action is a template; invoking it fills in positional and named
//! arguments and runs the result with `sh` in the directory of the config file
//! that defined it.
//!
//! The pieces, leaf first:
//! - [`template`] parses and renders action templates,
//! - [`config_file`] parses config lines,
//! - [`sources`] finds and loads the config files for an invocation,
//! - [`action`] merges the loaded files and resolves an action,
//! - [`exec`] prints or runs the result.

use thiserror::Error;

use crate::action::ActionError;
use crate::config_file::ConfigError;
use crate::exec::ExecError;
use crate::template::TemplateError;

pub mod action;
pub mod config_file;
pub mod exec;
pub mod logger;
pub mod position;
pub mod sources;
pub mod template;

/// Anything that ends an invocation early.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl Error {
    /// Usage errors are the caller's to fix and are reported on stdout.
    #[must_use]
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Action(_) | Error::Template(_))
    }

    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.is_usage() { 2 } else { 1 }
    }
}
