//! Folding loaded config sources into one action table and producing the
//! command line for a named action.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use log::info;
use thiserror::Error;

use crate::sources::ConfigSource;
use crate::template::{self, Document, TemplateError, Variables};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Could not find action with name: {0}")]
    NotFound(String),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Where the winning definition of an action lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition<'a> {
    pub name: &'a str,
    pub template: &'a str,
    pub source: &'a ConfigSource,
    pub line: usize,
}

/// An action ready to be printed or executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAction {
    pub name: String,
    pub document: Document,
    /// The rendered command line.
    pub command: String,
    /// Directory of the file that defined the action.
    pub cwd: PathBuf,
    pub defining_source: PathBuf,
}

/// The effective actions and variable defaults across all sources.
#[derive(Debug, Clone)]
pub struct Catalog<'a> {
    sources: &'a [ConfigSource],
    actions: HashMap<&'a str, Definition<'a>>,
    defaults: HashMap<&'a str, &'a str>,
}

impl<'a> Catalog<'a> {
    /// Build the tables from sources ordered highest precedence first.
    #[must_use]
    pub fn new(sources: &'a [ConfigSource]) -> Self {
        let mut actions = HashMap::new();
        let mut defaults = HashMap::new();

        for source in sources.iter().rev() {
            // Within one file the first definition of an action wins
            let mut local: HashMap<&str, Definition<'a>> = HashMap::new();
            for entry in source.actions() {
                local.entry(entry.key.as_str()).or_insert(Definition {
                    name: &entry.key,
                    template: &entry.raw_value,
                    source,
                    line: entry.source_line,
                });
            }
            actions.extend(local);

            for entry in source.defaults() {
                defaults.insert(entry.key.as_str(), entry.raw_value.as_str());
            }
        }

        Catalog {
            sources,
            actions,
            defaults,
        }
    }

    #[must_use]
    pub fn action(&self, name: &str) -> Option<&Definition<'a>> {
        self.actions.get(name)
    }

    #[must_use]
    pub fn default_value(&self, name: &str) -> Option<&'a str> {
        self.defaults.get(name).copied()
    }

    /// Every visible action in precedence order, shadowed names left out.
    #[must_use]
    pub fn available_actions(&self) -> Vec<Definition<'a>> {
        let mut seen = HashSet::new();
        self.sources
            .iter()
            .flat_map(|source| source.actions())
            .filter(|entry| seen.insert(entry.key.as_str()))
            .filter_map(|entry| self.actions.get(entry.key.as_str()).copied())
            .collect()
    }

    /// Fill in config defaults for every variable the caller did not bind.
    #[must_use]
    pub fn variables(&self, args: &Variables) -> Variables {
        let mut vars = args.clone();
        for (name, value) in &self.defaults {
            vars.set_default(name, value);
        }
        vars
    }

    fn parse(&self, name: &str) -> Result<(&Definition<'a>, Document), ActionError> {
        let definition = self
            .action(name)
            .ok_or_else(|| ActionError::NotFound(name.to_string()))?;
        info!(
            "Resolved template: {} (from {}:{})",
            definition.template,
            definition.source.path.display(),
            definition.line
        );
        Ok((definition, template::parse(definition.template)?))
    }

    /// Resolve and render `name` with the caller's arguments.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::NotFound` for an unknown action, or
    /// `ActionError::Template` if its template does not parse.
    pub fn resolve(&self, name: &str, args: &Variables) -> Result<ResolvedAction, ActionError> {
        let (definition, document) = self.parse(name)?;
        let vars = self.variables(args);
        for (var, value) in vars.named() {
            info!("  ${{{var}}} => {value}");
        }

        Ok(ResolvedAction {
            name: name.to_string(),
            command: template::render(&document, &vars),
            document,
            cwd: definition.source.directory().to_path_buf(),
            defining_source: definition.source.path.clone(),
        })
    }

    /// The usage line for `name`, derived from its template.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::resolve`].
    pub fn usage(&self, name: &str) -> Result<String, ActionError> {
        let (_, document) = self.parse(name)?;
        Ok(template::usage(&document, name))
    }
}

/// Resolve `name` against `sources` (highest precedence first).
///
/// # Errors
///
/// See [`Catalog::resolve`].
pub fn resolve_action(
    name: &str,
    sources: &[ConfigSource],
    args: &Variables,
) -> Result<ResolvedAction, ActionError> {
    Catalog::new(sources).resolve(name, args)
}

/// Render a `--template` string. Config defaults do not apply.
///
/// # Errors
///
/// Returns `TemplateError` if the template does not parse.
pub fn render_inline(template: &str, args: &Variables) -> Result<String, TemplateError> {
    Ok(template::render(&template::parse(template)?, args))
}
