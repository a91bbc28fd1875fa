use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use upsync::cli::Cli;
use upsync::config::Profile;
use upsync::progress::{NullProgress, ProgressSink, TermProgress};
use upsync::push::{PushOutcome, PushPipeline};
use upsync::repo::FsRepository;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = Profile::load_default()?;
    let repo = FsRepository::open(&cli.path)?;
    let pipeline = PushPipeline::new(&repo, &profile, &cli.remote, cli.branch_filter());

    let mut progress: Box<dyn ProgressSink> = if cli.quiet {
        Box::new(NullProgress)
    } else {
        Box::new(TermProgress::new())
    };

    match pipeline.run(progress.as_mut()).await? {
        PushOutcome::NothingToSend => {
            println!("workspace is empty, nothing to push");
        }
        PushOutcome::AlreadyPushed => {
            println!("already pushed to remote {}", cli.remote);
        }
        PushOutcome::Completed { files, bytes } => {
            if !cli.quiet {
                println!("{} ({} file(s), {} bytes)", "done".yellow(), files, bytes);
            }
        }
    }
    Ok(())
}
