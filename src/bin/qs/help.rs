pub const USAGE: &str = "\
Usage: qs [--config <path>]... [--dry-run] [--verbose] <action> [<arg>...] [--<name> <value>]...
       qs [--config <path>]... [--dry-run] [--verbose] --template <template> [--<name> <value>]...
       qs [--config <path>]... --actions
       qs <action> --help
       qs --help | --version";

pub const HELP: &str = "\
qs (quick-scripts) runs shell one-liners kept in .qs.cfg files.

Options:
  --config <path>        Also read this config file. Later --config files take
                         precedence over earlier ones.
  --dry-run              Print the command instead of running it.
  --verbose              Log the resolved template and variables to stderr.
  --template <template>  Run the given template instead of a configured action.
  --actions              List the available actions and where they are defined.
  --help                 Show this help. After an action name, show the
                         action's usage instead.
  --version              Print the version.

Config files, highest precedence first:
  1. every --config file, last one first
  2. .qs.cfg in the current directory
  3. .qs.cfg in the source root (nearest parent directory containing .git)
  4. $XDG_CONFIG_HOME/qs/default.cfg, or ~/.config/qs/default.cfg

Config lines:
  # comment
  name = template        define an action
  name := value          default for the variable ${name}

Templates:
  ${0} .. ${9}           positional arguments
  ${name}                the value of --name, or its config default
  ${name?}..${else}..${end}
                         expand the first branch when name is non-empty
  $$                     a literal $

Actions run with sh in the directory of the file that defines them.
QS_RUN_DIR holds the directory qs was started from.";
