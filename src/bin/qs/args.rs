use std::path::PathBuf;

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use thiserror::Error;

use qs::template::{MAX_POSITIONAL, Variables, is_identifier_char};

/// Options before the action name are parsed by clap. Everything from the
/// action name on is kept verbatim in `rest`, since actions take arbitrary
/// `--<name> <value>` arguments, and scanned by [`Invocation::from_cli`].
#[derive(Parser, Debug)]
#[command(
    name = "qs",
    about = "Run templated one-liners declared in .qs.cfg files",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Include an additional configuration file (can be used more than once)
    #[arg(long, value_name = "PATH")]
    config: Vec<PathBuf>,

    /// Print the command that would have run, don't run it
    #[arg(long)]
    dry_run: bool,

    /// Print more information while executing
    #[arg(long)]
    verbose: bool,

    /// Run this template instead of a configured action
    #[arg(long, value_name = "TEMPLATE")]
    template: Option<String>,

    /// List all available actions and exit
    #[arg(long)]
    actions: bool,

    /// Show help and exit
    #[arg(long)]
    help: bool,

    /// Print the version and exit
    #[arg(long)]
    version: bool,

    /// Action name followed by its positional and --named arguments
    #[arg(value_name = "ACTION", trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UsageError {
    #[error(
        "At most {max} positional arguments can be given. Wrap arguments containing spaces in double quotes (\").",
        max = MAX_POSITIONAL
    )]
    TooManyPositional,
    #[error(
        "Variable name '{0}' is not a valid name. Variables must start with a letter, and consist only of letters, numbers and '-' and '_' (e.g. --some-variable_1, --NAME1)."
    )]
    InvalidVariableName(String),
    #[error("Missing value for variable '{0}'")]
    MissingVariableValue(String),
    #[error("Argument --config should be followed by a file path.")]
    MissingConfigPath,
    #[error("--template should be followed by a template string.")]
    MissingTemplate,
    #[error(
        "'{0}' is not a valid action name. Action names must start with a letter, followed by letters, numbers, a dash (-) or an underscore (_)"
    )]
    InvalidActionName(String),
    #[error("Error: Must provide either an action name or a template string (--template), not both.")]
    ActionAndTemplate,
    #[error("Error: Must provide either an action name or a --template")]
    NoActionOrTemplate,
}

impl UsageError {
    /// Map clap's "value required" errors for the leading options onto our own messages.
    pub fn from_clap(err: &clap::Error) -> Option<Self> {
        if err.kind() != ErrorKind::InvalidValue {
            return None;
        }
        match err.get(ContextKind::InvalidArg) {
            Some(ContextValue::String(arg)) if arg.starts_with("--config") => {
                Some(UsageError::MissingConfigPath)
            }
            Some(ContextValue::String(arg)) if arg.starts_with("--template") => {
                Some(UsageError::MissingTemplate)
            }
            _ => None,
        }
    }
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Help,
    Version,
    ListActions,
    Template(String),
    Action { name: String, help: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: Mode,
    /// `--config` paths in the order given.
    pub config: Vec<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
    /// Positional and named arguments for the template.
    pub args: Variables,
}

/// Names start with a letter, followed by letters, digits, `-` or `_`.
fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic()) && chars.all(is_identifier_char)
}

impl Invocation {
    /// Combine the clap-parsed options with a scan of the trailing arguments.
    ///
    /// # Errors
    ///
    /// Returns the first `UsageError` in argument order.
    pub fn from_cli(cli: Cli) -> Result<Self, UsageError> {
        let mut config = cli.config;
        let mut dry_run = cli.dry_run;
        let mut verbose = cli.verbose;
        let mut template = cli.template;
        let mut actions = cli.actions;
        let mut help = cli.help;
        let mut version = cli.version;

        let mut action: Option<String> = None;
        let mut action_help = false;
        let mut positional = Vec::new();
        let mut named = Vec::new();

        let mut rest = cli.rest.into_iter();
        while let Some(arg) = rest.next() {
            if let Some(flag) = arg.strip_prefix("--") {
                match flag {
                    "dry-run" => dry_run = true,
                    "verbose" => verbose = true,
                    "actions" => actions = true,
                    "version" => version = true,
                    "help" if action.is_some() => action_help = true,
                    "help" => help = true,
                    "config" => {
                        config.push(rest.next().ok_or(UsageError::MissingConfigPath)?.into());
                    }
                    "template" => {
                        template = Some(rest.next().ok_or(UsageError::MissingTemplate)?);
                    }
                    name if !is_name(name) => {
                        return Err(UsageError::InvalidVariableName(name.to_string()));
                    }
                    name => {
                        let value = rest
                            .next()
                            .ok_or_else(|| UsageError::MissingVariableValue(name.to_string()))?;
                        named.push((name.to_string(), value));
                    }
                }
            } else if action.is_some() {
                if positional.len() >= MAX_POSITIONAL {
                    return Err(UsageError::TooManyPositional);
                }
                positional.push(arg);
            } else if is_name(&arg) {
                action = Some(arg);
            } else {
                return Err(UsageError::InvalidActionName(arg));
            }
        }

        let mode = if help {
            Mode::Help
        } else if version {
            Mode::Version
        } else if actions {
            Mode::ListActions
        } else {
            match (action, template) {
                (Some(_), Some(_)) => return Err(UsageError::ActionAndTemplate),
                (None, None) => return Err(UsageError::NoActionOrTemplate),
                (Some(name), None) => Mode::Action {
                    name,
                    help: action_help,
                },
                (None, Some(template)) => Mode::Template(template),
            }
        };

        let mut args = Variables::with_positional(positional);
        for (name, value) in named {
            args.set(name, value);
        }

        Ok(Invocation {
            mode,
            config,
            dry_run,
            verbose,
            args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qs::template::VarName;

    fn scan(args: &[&str]) -> Result<Invocation, UsageError> {
        let cli = Cli::try_parse_from(std::iter::once("qs").chain(args.iter().copied()))
            .expect("clap should accept the arguments");
        Invocation::from_cli(cli)
    }

    fn named(invocation: &Invocation, name: &str) -> Option<String> {
        invocation
            .args
            .get(&VarName::Named(name.to_string()))
            .map(str::to_string)
    }

    #[test]
    fn test_action_with_arguments() {
        let invocation = scan(&["cmd", "foo", "--name", "Christoffer", "bar"]).unwrap();
        assert_eq!(
            invocation.mode,
            Mode::Action {
                name: "cmd".to_string(),
                help: false
            }
        );
        assert_eq!(invocation.args.positional(), ["foo", "bar"]);
        assert_eq!(named(&invocation, "name").as_deref(), Some("Christoffer"));
    }

    #[test]
    fn test_options_before_and_after_action() {
        let invocation = scan(&[
            "--config", "a", "--dry-run", "cmd", "--config", "b", "--verbose",
        ])
        .unwrap();
        assert_eq!(invocation.config, vec![PathBuf::from("a"), PathBuf::from("b")]);
        assert!(invocation.dry_run);
        assert!(invocation.verbose);
    }

    #[test]
    fn test_template_with_named_arguments() {
        let invocation = scan(&["--template", "echo ${a}", "--a", "", "--b", "yes"]).unwrap();
        assert_eq!(invocation.mode, Mode::Template("echo ${a}".to_string()));
        assert_eq!(named(&invocation, "a").as_deref(), Some(""));
        assert_eq!(named(&invocation, "b").as_deref(), Some("yes"));
    }

    #[test]
    fn test_later_named_argument_wins() {
        let invocation = scan(&["cmd", "--x", "1", "--x", "2"]).unwrap();
        assert_eq!(named(&invocation, "x").as_deref(), Some("2"));
    }

    #[test]
    fn test_help_before_and_after_action() {
        assert_eq!(scan(&["--help"]).unwrap().mode, Mode::Help);
        assert_eq!(
            scan(&["foo", "--help", "--config", "mixed.cfg"]).unwrap().mode,
            Mode::Action {
                name: "foo".to_string(),
                help: true
            }
        );
    }

    #[test]
    fn test_version_and_actions() {
        assert_eq!(scan(&["--version"]).unwrap().mode, Mode::Version);
        assert_eq!(
            scan(&["--actions", "--config", "custom.cfg"]).unwrap().mode,
            Mode::ListActions
        );
    }

    #[test]
    fn test_too_many_positional_arguments() {
        let mut args = vec!["cmd"];
        args.extend([
            "var1", "var2", "var3", "var4", "var5", "var6", "var7", "var8", "var9", "var10",
        ]);
        assert!(scan(&args).is_ok());
        args.push("var11");
        let err = scan(&args).unwrap_err();
        assert_eq!(err, UsageError::TooManyPositional);
        assert!(
            err.to_string()
                .starts_with("At most 10 positional arguments can be given")
        );
    }

    #[test]
    fn test_missing_values() {
        assert_eq!(
            scan(&["dummy", "--missing"]).unwrap_err().to_string(),
            "Missing value for variable 'missing'"
        );
        assert_eq!(
            scan(&["cmd", "--config"]).unwrap_err(),
            UsageError::MissingConfigPath
        );
        assert_eq!(
            scan(&["cmd", "--template"]).unwrap_err(),
            UsageError::MissingTemplate
        );
    }

    #[test]
    fn test_leading_option_without_value() {
        let err = Cli::try_parse_from(["qs", "--config"]).unwrap_err();
        assert_eq!(UsageError::from_clap(&err), Some(UsageError::MissingConfigPath));
        let err = Cli::try_parse_from(["qs", "--template"]).unwrap_err();
        assert_eq!(UsageError::from_clap(&err), Some(UsageError::MissingTemplate));
    }

    #[test]
    fn test_invalid_names() {
        assert_eq!(
            scan(&["cmd", "--1abc", "x"]).unwrap_err(),
            UsageError::InvalidVariableName("1abc".to_string())
        );
        assert_eq!(
            scan(&["-x"]).unwrap_err(),
            UsageError::InvalidActionName("-x".to_string())
        );
    }

    #[test]
    fn test_action_and_template_conflict() {
        assert_eq!(
            scan(&["foobar", "--template", "echo Hello"]).unwrap_err(),
            UsageError::ActionAndTemplate
        );
    }

    #[test]
    fn test_neither_action_nor_template() {
        let err = scan(&["--foo", "bar"]).unwrap_err();
        assert_eq!(err, UsageError::NoActionOrTemplate);
        assert_eq!(
            err.to_string(),
            "Error: Must provide either an action name or a --template"
        );
    }
}
