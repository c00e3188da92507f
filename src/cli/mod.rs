use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

mod handlers;

pub use handlers::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ModelArgs {
    /// Embedding model key (see `dupfind models`).
    /// Defaults to `default_model` from config.yaml
    #[clap(short, long)]
    pub model: Option<String>,

    /// Preprocess texts (strip urls/emails, lowercase) before embedding.
    #[clap(long, default_value = "false")]
    pub preprocess: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// Files to compare, one document per file.
    /// When omitted, every non-empty stdin line is a document.
    pub files: Vec<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start dupfind as an HTTP service.
    Daemon {
        /// Bind address. Overrides config.yaml
        #[clap(long)]
        host: Option<String>,

        /// Bind port. Overrides config.yaml
        #[clap(short, long)]
        port: Option<u16>,
    },
    /// Report document pairs at or above a similarity threshold
    Analyze {
        /// Similarity threshold [0.0, 1.0]
        #[clap(short, long)]
        threshold: Option<f32>,

        #[clap(flatten)]
        model_args: ModelArgs,

        #[clap(flatten)]
        input: InputArgs,
    },
    /// Report pairs at high and moderate confidence
    Detailed {
        /// High-confidence threshold [0.0, 1.0]
        #[clap(short, long)]
        strict: Option<f32>,

        /// Moderate-confidence threshold [0.0, 1.0]
        #[clap(short, long)]
        threshold: Option<f32>,

        #[clap(flatten)]
        model_args: ModelArgs,

        #[clap(flatten)]
        input: InputArgs,
    },
    /// Compare two texts
    Compare {
        #[clap(flatten)]
        model_args: ModelArgs,

        #[clap(allow_hyphen_values = true)]
        text_a: String,

        #[clap(allow_hyphen_values = true)]
        text_b: String,
    },
    /// List available embedding models
    Models {},
    /// Show what preprocessing does to a text
    Preprocess {
        /// Keep urls
        #[clap(long, default_value = "false")]
        keep_urls: bool,

        /// Keep email addresses
        #[clap(long, default_value = "false")]
        keep_emails: bool,

        /// Don't lowercase
        #[clap(long, default_value = "false")]
        no_normalize: bool,

        /// Strip punctuation
        #[clap(long, default_value = "false")]
        remove_punctuation: bool,

        /// Keep only ASCII letters, digits and spaces
        #[clap(long, default_value = "false")]
        remove_special: bool,

        /// Also print text statistics
        #[clap(long, default_value = "false")]
        stats: bool,

        #[clap(allow_hyphen_values = true)]
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let args = Args::parse_from(["dupfind", "analyze", "-t", "0.8", "-m", "mpnet", "a.txt", "b.txt"]);
        match args.command {
            Command::Analyze {
                threshold,
                model_args,
                input,
            } => {
                assert_eq!(threshold, Some(0.8));
                assert_eq!(model_args.model.as_deref(), Some("mpnet"));
                assert!(!model_args.preprocess);
                assert_eq!(input.files.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_compare() {
        let args = Args::parse_from(["dupfind", "compare", "--preprocess", "one", "two"]);
        match args.command {
            Command::Compare {
                model_args,
                text_a,
                text_b,
            } => {
                assert!(model_args.preprocess);
                assert_eq!(text_a, "one");
                assert_eq!(text_b, "two");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_preprocess_remove_special() {
        let args = Args::parse_from(["dupfind", "preprocess", "--remove-special", "Héllo!"]);
        match args.command {
            Command::Preprocess {
                remove_special,
                remove_punctuation,
                text,
                ..
            } => {
                assert!(remove_special);
                assert!(!remove_punctuation);
                assert_eq!(text, "Héllo!");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
