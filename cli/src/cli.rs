use chrono::Utc;
use clap::Parser;
use libcardfetch::{
    init_download, FetchRule, LinkPattern, Update, DEFAULT_OUTPUT_DIRECTORY, DEFAULT_PAGE_URL,
};
use owo_colors::{OwoColorize, Stream::Stdout};
use std::path::PathBuf;
use tokio::sync::mpsc::channel;
use url::Url;

const MAX_BUFFER_SIZE: usize = 100;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Playing card image fetcher",
    long_about = "Downloads the English pattern playing card faces listed on a wiki page \
    as SVG/PNG files."
)]
pub struct Cli {
    #[arg(default_value = DEFAULT_PAGE_URL, help = "Page listing the card media files.", long)]
    page_url: Url,
    #[arg(default_value = DEFAULT_OUTPUT_DIRECTORY, help = "Where images are saved. Created if missing.", long)]
    output_directory: String,
    #[arg(
        help = "Abort the whole run when a media page has no full image link, instead of skipping it.",
        long
    )]
    abort_on_missing_markup: bool,
}

impl Cli {
    fn rule(&self) -> FetchRule {
        FetchRule {
            page_url: self.page_url.to_string(),
            destination_dir: PathBuf::from(&self.output_directory),
            link_pattern: LinkPattern::default(),
            abort_on_missing_markup: self.abort_on_missing_markup,
        }
    }
}

pub async fn download(cli: Cli) {
    println!("Initializing download....");
    let (tx, mut rx) = channel::<Update>(MAX_BUFFER_SIZE);
    let rule = cli.rule();
    let task = tokio::spawn(async move {
        init_download(&format!("Session-{}", Utc::now().timestamp()), rule, tx).await
    });
    while let Some(update) = rx.recv().await {
        match update {
            Update::MessageUpdate(msg) => {
                if msg.is_error {
                    println!("{}", msg.content.if_supports_color(Stdout, |t| t.red()));
                } else if msg.content.starts_with("Downloaded: ") {
                    println!("{}", msg.content.if_supports_color(Stdout, |t| t.green()));
                } else {
                    println!("{}", msg.content);
                }
            }
            Update::Completed(completion) => {
                println!(
                    "{} {} saved, {} skipped",
                    "Download completed!".if_supports_color(Stdout, |t| t.green()),
                    completion.saved_files,
                    completion.skipped
                );
            }
        };
    }
    match task.await {
        Ok(Ok(session)) => {
            println!(
                "Card images saved to {}",
                session.destination_dir.to_string_lossy()
            );
        }
        Ok(Err(e)) => {
            println!("Download wasn't able to complete");
            println!("{}", e.if_supports_color(Stdout, |t| t.red()));
        }
        Err(e) => {
            println!("Download task panicked");
            println!("{}", e);
        }
    }
}
