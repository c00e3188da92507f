use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod app;
mod cli;
mod config;
mod detection;
mod embeddings;
mod preprocess;
mod similarity;
#[cfg(test)]
mod tests;
mod web;

use app::AppFactory;
use cli::Command;
use preprocess::PreprocessOptions;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    init_tracing();

    match args.command {
        Command::Daemon { host, port } => {
            let app = AppFactory::create_app()?;
            let host = host.unwrap_or_else(|| app.config.host.clone());
            let port = port.unwrap_or(app.config.port);
            web::start_daemon(app, host, port)
        }
        Command::Analyze {
            threshold,
            model_args,
            input,
        } => cli::handle_analyze(&AppFactory::create_app()?, threshold, model_args, input),
        Command::Detailed {
            strict,
            threshold,
            model_args,
            input,
        } => cli::handle_detailed(
            &AppFactory::create_app()?,
            strict,
            threshold,
            model_args,
            input,
        ),
        Command::Compare {
            model_args,
            text_a,
            text_b,
        } => cli::handle_compare(&AppFactory::create_app()?, model_args, &text_a, &text_b),
        Command::Models {} => cli::handle_models(&AppFactory::create_app()?),
        Command::Preprocess {
            keep_urls,
            keep_emails,
            no_normalize,
            remove_punctuation,
            remove_special,
            stats,
            text,
        } => {
            let options = PreprocessOptions {
                remove_urls: !keep_urls,
                remove_emails: !keep_emails,
                normalize: !no_normalize,
                remove_punctuation,
                remove_special,
            };
            cli::handle_preprocess(&text, options, stats)
        }
    }
}
