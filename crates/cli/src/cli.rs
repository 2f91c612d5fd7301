//! Command-line arguments.

use clap::{Parser, Subcommand};
use inkpress_collection::{BuildMode, CONFIG_FILE};
use std::path::PathBuf;

/// Build and inspect a blog's post collection
#[derive(Parser, Debug, Clone)]
#[command(name = "inkpress", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file, relative to the root
    #[arg(short = 'C', long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Build mode: production or development
    #[arg(short, long, global = true)]
    pub mode: Option<BuildMode>,

    /// Print debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Builds the collection and writes the snapshot
    Build,

    /// Builds, then rebuilds whenever content or config changes
    Watch,

    /// Lists documents from the snapshot, newest first
    List {
        /// Include drafts
        #[arg(long)]
        drafts: bool,

        /// Only documents carrying this tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Renders one document from the snapshot as HTML
    Render {
        /// Document slug
        slug: String,

        /// Skip the typography components
        #[arg(long)]
        plain: bool,
    },
}

impl Cli {
    /// Build mode for this invocation; `watch` defaults to development.
    pub fn mode(&self) -> Option<BuildMode> {
        match (&self.command, self.mode) {
            (_, Some(mode)) => Some(mode),
            (Commands::Watch, None) => Some(BuildMode::Development),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_the_subcommand() {
        let cli = Cli::try_parse_from(["inkpress", "build", "--mode", "dev", "--root", "site"]).unwrap();
        assert!(matches!(cli.command, Commands::Build));
        assert_eq!(cli.mode(), Some(BuildMode::Development));
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE));
    }

    #[test]
    fn watch_defaults_to_development() {
        let cli = Cli::try_parse_from(["inkpress", "watch"]).unwrap();
        assert_eq!(cli.mode(), Some(BuildMode::Development));
        let cli = Cli::try_parse_from(["inkpress", "watch", "-m", "production"]).unwrap();
        assert_eq!(cli.mode(), Some(BuildMode::Production));
        let cli = Cli::try_parse_from(["inkpress", "build"]).unwrap();
        assert_eq!(cli.mode(), None);
    }

    #[test]
    fn render_and_list_arguments() {
        let cli = Cli::try_parse_from(["inkpress", "render", "hello", "--plain"]).unwrap();
        let Commands::Render { slug, plain } = cli.command else {
            panic!("expected render");
        };
        assert_eq!(slug, "hello");
        assert!(plain);

        let cli = Cli::try_parse_from(["inkpress", "list", "--drafts", "--tag", "rust"]).unwrap();
        let Commands::List { drafts, tag } = cli.command else {
            panic!("expected list");
        };
        assert!(drafts);
        assert_eq!(tag.as_deref(), Some("rust"));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["inkpress", "build", "--mode", "staging"]).is_err());
    }
}
