use crate::download::{default_user_agent, download_file, DownloadItem};
use crate::page::{fetch_media_links, resolve_direct_links};
use reqwest::Client;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::mpsc::Sender;
use tracing::instrument;
use url::Url;

pub use crate::download::{
    accepted_extension, get_file_name, is_accepted_content_type, BROWSER_USER_AGENT,
};
pub use crate::errors::CardFetchError;
pub use crate::link::{get_full_image_link, get_media_links, origin_of, LinkPattern};
pub use crate::session::Session;

mod download;
mod errors;
mod link;
mod page;
mod session;

pub const DEFAULT_PAGE_URL: &str = "https://en.wikipedia.org/wiki/Standard_52-card_deck";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "static/cards";

#[derive(Debug, Clone)]
pub struct FetchRule {
    /// Listing page the media links are scraped from
    pub page_url: String,
    /// Created with its parents if missing, reused otherwise
    pub destination_dir: PathBuf,
    pub link_pattern: LinkPattern,
    /// Abort the run when a media page has no full image link,
    /// instead of skipping that page.
    pub abort_on_missing_markup: bool,
}

impl Default for FetchRule {
    fn default() -> Self {
        Self {
            page_url: DEFAULT_PAGE_URL.to_string(),
            destination_dir: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            link_pattern: LinkPattern::default(),
            abort_on_missing_markup: false,
        }
    }
}

/// Result of one item at one stage. Fatal conditions travel as
/// `Err(CardFetchError)` next to it.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Skipped(String),
}

#[derive(Debug)]
pub enum Update {
    MessageUpdate(Message),
    Completed(Completion),
}

#[derive(Debug)]
pub struct Message {
    pub session_id: String,
    pub content: String,
    pub resource_name: String,
    pub is_error: bool,
}

#[derive(Debug)]
pub struct Completion {
    pub saved_files: usize,
    pub skipped: usize,
}

/// Sends an update to the front end. A closed channel only means nobody
/// is listening anymore, the run carries on.
pub(crate) async fn notify(update_tx: &Sender<Update>, update: Update) {
    if let Err(e) = update_tx.send(update).await {
        tracing::debug!("Update channel closed, dropping {:?}", e.0);
    }
}

/// Runs the whole fetch: listing page, media pages, then image downloads,
/// one request at a time. Items that fail are skipped and reported, only
/// destination directory and file errors (or missing markup when the rule
/// asks for it) end the run early.
#[instrument(skip(update_tx))]
pub async fn init_download(
    session_id: &str,
    rule: FetchRule,
    update_tx: Sender<Update>,
) -> Result<Session, CardFetchError> {
    let page_url = if let Ok(u) = Url::parse(&rule.page_url) {
        u
    } else {
        return Err(CardFetchError::InvalidUrl(rule.page_url));
    };

    if let Err(e) = fs::create_dir_all(&rule.destination_dir).await {
        tracing::error!("Failed to create destination directory\nError : {}", e);
        return Err(CardFetchError::ErrorCreatingDestinationDirectory(
            e.to_string(),
        ));
    };

    let client = Client::builder()
        .user_agent(default_user_agent())
        .build()
        .map_err(|e| CardFetchError::ClientBuildError(e.to_string()))?;

    let mut session = Session::new(session_id, page_url, rule.destination_dir.clone());

    let media_links = fetch_media_links(
        session_id,
        &client,
        &session.page_url,
        &rule.link_pattern,
        &update_tx,
    )
    .await;
    session.media_links = media_links.len();

    let direct_links = resolve_direct_links(
        &mut session,
        &client,
        &media_links,
        rule.abort_on_missing_markup,
        &update_tx,
    )
    .await?;
    session.resolved_links = direct_links.len();

    for link in direct_links {
        let resource_name = link.to_string();
        match download_file(
            session_id,
            DownloadItem {
                link,
                destination_dir: rule.destination_dir.clone(),
            },
            &client,
            &update_tx,
        )
        .await?
        {
            Outcome::Done(path) => session.saved_files.push(path),
            Outcome::Skipped(reason) => session.skipped.push((resource_name, reason)),
        }
    }

    tracing::debug!(
        "Session {} done, {} saved, {} skipped",
        session_id,
        session.saved_files.len(),
        session.skipped.len()
    );
    notify(
        &update_tx,
        Update::Completed(Completion {
            saved_files: session.saved_files.len(),
            skipped: session.skipped.len(),
        }),
    )
    .await;
    Ok(session)
}
