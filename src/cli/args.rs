//! CLI argument parsing using clap.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Root-relative change notifications over artifact trees
#[derive(Parser, Debug)]
#[command(
    name = "adaptable-notify",
    version = env!("CARGO_PKG_VERSION"),
    about = "Root-relative change notifications over artifact trees",
    long_about = "Split a directory tree into logical roots (archives such as *.war or *.jar, \
                  or explicit paths) and report file changes relative to each root.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create .adaptable/settings.toml with default values
    Init {
        /// Overwrite an existing configuration file
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Translate a change triple over an in-memory tree and print the result
    Translate(TranslateArgs),

    /// Watch a directory and print root-relative changes until Ctrl-C
    Watch(WatchArgs),
}

/// Logical roots shared by `translate` and `watch`.
#[derive(Args, Debug, Clone, Default)]
pub struct RootArgs {
    /// Artifact path that starts a logical root (repeatable)
    #[arg(long = "root", value_name = "PATH")]
    pub roots: Vec<String>,

    /// Container name pattern that starts a logical root, e.g. '*.war'
    /// (repeatable, replaces the configured patterns)
    #[arg(long = "root-pattern", value_name = "GLOB")]
    pub root_patterns: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TranslateArgs {
    /// Container that exists in the tree; parents are implied (repeatable)
    #[arg(long = "entry", value_name = "PATH")]
    pub entries: Vec<String>,

    #[command(flatten)]
    pub structure: RootArgs,

    /// Artifact path of the container the listener registers from
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub listen: String,

    /// Root-relative path to register; prefix with '!' for non-recursive
    #[arg(long = "register", value_name = "PATH", default_value = "/")]
    pub register: Vec<String>,

    /// Raw artifact path reported as added (repeatable)
    #[arg(long, value_name = "PATH")]
    pub added: Vec<String>,

    /// Raw artifact path reported as removed (repeatable)
    #[arg(long, value_name = "PATH")]
    pub removed: Vec<String>,

    /// Raw artifact path reported as modified (repeatable)
    #[arg(long, value_name = "PATH")]
    pub modified: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Directory to watch
    pub dir: PathBuf,

    #[command(flatten)]
    pub structure: RootArgs,

    /// Artifact path of a container to listen from (repeatable, default '/')
    #[arg(long = "listen", value_name = "PATH")]
    pub listen: Vec<String>,

    /// Quiet period before a change is reported (overrides config)
    #[arg(long)]
    pub debounce_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_translate_defaults() {
        let cli = Cli::parse_from([
            "adaptable-notify",
            "translate",
            "--entry",
            "/a/b/n",
            "--root",
            "/a/b",
            "--listen",
            "/a/b",
            "--modified",
            "/a/b/n",
        ]);
        let Commands::Translate(args) = cli.command else {
            panic!("expected translate");
        };
        assert_eq!(args.register, vec!["/"]);
        assert_eq!(args.structure.roots, vec!["/a/b"]);
        assert_eq!(args.modified, vec!["/a/b/n"]);
        assert!(args.added.is_empty());
    }
}
