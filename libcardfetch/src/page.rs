use crate::errors::CardFetchError;
use crate::link::{get_full_image_link, get_media_links, LinkPattern};
use crate::session::Session;
use crate::Update::MessageUpdate;
use crate::{notify, Message, Outcome, Update};
use reqwest::{Client, StatusCode};
use std::fmt::Formatter;
use tokio::sync::mpsc::Sender;
use tracing::instrument;
use url::Url;

#[derive(Debug)]
enum FetchFailure {
    Status(StatusCode),
    Network(String),
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchFailure::Status(status) => write!(f, "{}", status.as_u16()),
            FetchFailure::Network(err) => write!(f, "{err}"),
        }
    }
}

/// GET a page with the client's default headers and return its body.
async fn fetch_html(client: &Client, page_url: &Url) -> Result<String, FetchFailure> {
    let response = match client.get(page_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Error fetching page {}", page_url);
            tracing::error!("{}", e);
            return Err(FetchFailure::Network(e.to_string()));
        }
    };
    if !response.status().is_success() {
        tracing::error!(
            "Error status code received : {} |{}|",
            response.status(),
            page_url
        );
        return Err(FetchFailure::Status(response.status()));
    }
    response.text().await.map_err(|e| {
        tracing::error!("Error reading page body {}", page_url);
        tracing::error!("{}", e);
        FetchFailure::Network(e.to_string())
    })
}

/// Fetches the listing page and returns the media description page links on
/// it. A page that can't be fetched gives no links.
#[instrument(skip(client, update_tx))]
pub async fn fetch_media_links(
    session_id: &str,
    client: &Client,
    page_url: &Url,
    pattern: &LinkPattern,
    update_tx: &Sender<Update>,
) -> Vec<Url> {
    let html = match fetch_html(client, page_url).await {
        Ok(html) => html,
        Err(failure) => {
            notify(
                update_tx,
                MessageUpdate(Message {
                    session_id: session_id.to_string(),
                    content: format!("Failed to retrieve the webpage: {failure}"),
                    resource_name: page_url.to_string(),
                    is_error: true,
                }),
            )
            .await;
            return Vec::new();
        }
    };
    let links = get_media_links(&html, page_url, pattern);
    tracing::debug!("Total media links found {}", links.len());
    links
}

/// Resolves one media description page to its direct asset link.
#[instrument(skip(client))]
pub async fn resolve_direct_link(
    client: &Client,
    media_url: &Url,
    abort_on_missing_markup: bool,
) -> Result<Outcome<Url>, CardFetchError> {
    let html = match fetch_html(client, media_url).await {
        Ok(html) => html,
        Err(FetchFailure::Status(status)) => {
            return Ok(Outcome::Skipped(format!(
                "Failed to retrieve media page: {} with status code {}",
                media_url,
                status.as_u16()
            )));
        }
        Err(FetchFailure::Network(err)) => {
            return Ok(Outcome::Skipped(format!(
                "Failed to retrieve media page: {media_url} ({err})"
            )));
        }
    };
    match get_full_image_link(&html, media_url) {
        Some(link) => {
            tracing::debug!("Direct link for {} => {}", media_url, link);
            Ok(Outcome::Done(link))
        }
        None if abort_on_missing_markup => {
            tracing::error!("No full image link on {}. Aborting...", media_url);
            Err(CardFetchError::MissingMarkup {
                url: media_url.to_string(),
            })
        }
        None => {
            tracing::warn!("No full image link on {}", media_url);
            Ok(Outcome::Skipped(format!(
                "No full image link found on {media_url}"
            )))
        }
    }
}

/// Resolves every media description page in order. Skipped pages are
/// reported and recorded on the session.
#[instrument(skip(session, client, media_links, update_tx))]
pub async fn resolve_direct_links(
    session: &mut Session,
    client: &Client,
    media_links: &[Url],
    abort_on_missing_markup: bool,
    update_tx: &Sender<Update>,
) -> Result<Vec<Url>, CardFetchError> {
    let mut direct_links = Vec::with_capacity(media_links.len());
    for media_url in media_links {
        match resolve_direct_link(client, media_url, abort_on_missing_markup).await? {
            Outcome::Done(link) => direct_links.push(link),
            Outcome::Skipped(reason) => {
                notify(
                    update_tx,
                    MessageUpdate(Message {
                        session_id: session.session_id.clone(),
                        content: reason.clone(),
                        resource_name: media_url.to_string(),
                        is_error: true,
                    }),
                )
                .await;
                session.skipped.push((media_url.to_string(), reason));
            }
        }
    }
    tracing::debug!("Total direct links resolved {}", direct_links.len());
    Ok(direct_links)
}
