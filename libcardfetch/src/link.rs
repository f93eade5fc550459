use lazy_static::lazy_static;
use scraper::{Html, Selector};
use tracing::{event, instrument, Level};
use url::Url;

pub const MEDIA_LINK_PREFIX: &str = "/wiki/File:";
pub const MEDIA_LINK_MARKER: &str = "English_pattern";
pub const MEDIA_LINK_SUFFIX: &str = ".svg";

lazy_static! {
    static ref ANCHOR_SELECTOR: Selector = Selector::parse("a[href]").unwrap();
    static ref FULL_IMAGE_LINK_SELECTOR: Selector = Selector::parse("div.fullImageLink").unwrap();
}

/// Which anchors on the listing page point at media description pages.
/// An href qualifies when it starts with `prefix`, contains `marker`
/// and ends with `suffix`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkPattern {
    pub prefix: String,
    pub marker: String,
    pub suffix: String,
}

impl Default for LinkPattern {
    fn default() -> Self {
        Self {
            prefix: MEDIA_LINK_PREFIX.to_string(),
            marker: MEDIA_LINK_MARKER.to_string(),
            suffix: MEDIA_LINK_SUFFIX.to_string(),
        }
    }
}

impl LinkPattern {
    pub fn matches(&self, href: &str) -> bool {
        href.starts_with(&self.prefix) && href.contains(&self.marker) && href.ends_with(&self.suffix)
    }
}

/// Scheme, host and port of `page_url` with a root path.
pub fn origin_of(page_url: &Url) -> Url {
    let mut origin = page_url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

#[instrument]
/// Get the full link to a page or file, relative to the origin of `page_url`.
fn get_full_link(link: &str, page_url: &Url) -> Option<Url> {
    if link.is_empty() {
        return None;
    }
    match origin_of(page_url).join(link) {
        Ok(url) => Some(url),
        Err(e) => {
            event!(Level::ERROR, "Failed to get full link for {}", link);
            event!(Level::ERROR, "{}", e);
            None
        }
    }
}

/// Gets the media description page links of a listing page, in document
/// order. Duplicates are kept.
/// E.g /wiki/File:English_pattern_ace_of_spades.svg on
/// https://en.wikipedia.org/wiki/Standard_52-card_deck gives
/// https://en.wikipedia.org/wiki/File:English_pattern_ace_of_spades.svg
pub fn get_media_links(html_string: &str, page_url: &Url, pattern: &LinkPattern) -> Vec<Url> {
    let html_document = Html::parse_document(html_string);
    html_document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| pattern.matches(href))
        .filter_map(|href| {
            let full_link = get_full_link(href, page_url)?;
            tracing::debug!("Full link for {} => {}", href, &full_link);
            Some(full_link)
        })
        .collect()
}

/// Gets the direct asset link of a media description page: the first
/// anchor inside the first `div.fullImageLink`. `None` when the page does
/// not have that shape.
pub fn get_full_image_link(html_string: &str, page_url: &Url) -> Option<Url> {
    let html_document = Html::parse_document(html_string);
    let container = html_document.select(&FULL_IMAGE_LINK_SELECTOR).next()?;
    let href = container
        .select(&ANCHOR_SELECTOR)
        .next()?
        .value()
        .attr("href")?;
    get_full_link(href, page_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiki_page() -> Url {
        Url::parse("https://en.wikipedia.org/wiki/Standard_52-card_deck").unwrap()
    }

    #[test]
    fn origin_drops_path_and_query() {
        let url = Url::parse("http://127.0.0.1:8080/wiki/Deck?action=view#top").unwrap();
        assert_eq!(origin_of(&url).as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn keeps_only_matching_media_links() {
        let html = r#"
            <html><body>
              <a href="/wiki/File:English_pattern_ace_of_spades.svg">A</a>
              <a href="/wiki/File:Tarot_card.svg">Tarot</a>
              <a href="/wiki/File:English_pattern_ace.png">png</a>
              <a href="/wiki/English_pattern_king.svg">not a file</a>
              <a>no href</a>
              <a href="/wiki/File:English_pattern_2_of_hearts.svg">2</a>
            </body></html>
        "#;
        let links = get_media_links(html, &wiki_page(), &LinkPattern::default());
        let links: Vec<&str> = links.iter().map(Url::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://en.wikipedia.org/wiki/File:English_pattern_ace_of_spades.svg",
                "https://en.wikipedia.org/wiki/File:English_pattern_2_of_hearts.svg",
            ]
        );
    }

    #[test]
    fn duplicate_media_links_are_kept_in_order() {
        let html = r#"
            <a href="/wiki/File:English_pattern_queen_of_clubs.svg">img</a>
            <a href="/wiki/File:English_pattern_jack_of_clubs.svg">img</a>
            <a href="/wiki/File:English_pattern_queen_of_clubs.svg">caption</a>
        "#;
        let links = get_media_links(html, &wiki_page(), &LinkPattern::default());
        assert_eq!(links.len(), 3);
        assert_eq!(links[0], links[2]);
        assert!(links[1].as_str().ends_with("jack_of_clubs.svg"));
    }

    #[test]
    fn custom_pattern_is_honoured() {
        let html = r#"<a href="/img/deck-ace.png">a</a><a href="/img/deck-ace.svg">b</a>"#;
        let pattern = LinkPattern {
            prefix: "/img/".into(),
            marker: "deck".into(),
            suffix: ".png".into(),
        };
        let links = get_media_links(html, &wiki_page(), &pattern);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "https://en.wikipedia.org/img/deck-ace.png");
    }

    #[test]
    fn full_image_link_resolves_against_origin() {
        let html = r#"
            <div class="mw-filepage">
              <a href="/wiki/Other">other</a>
              <div class="fullImageLink" id="file">
                <a href="/media/foo.svg"><img src="thumb.png"></a>
                <a href="/media/bar.svg">second</a>
              </div>
            </div>
        "#;
        let page = Url::parse("https://en.wikipedia.org/wiki/File:Foo.svg").unwrap();
        assert_eq!(
            get_full_image_link(html, &page).unwrap().as_str(),
            "https://en.wikipedia.org/media/foo.svg"
        );
    }

    #[test]
    fn protocol_relative_full_image_link_takes_origin_scheme() {
        let html = r#"
            <div class="fullImageLink">
              <a href="//upload.wikimedia.org/wikipedia/commons/d/d3/English_pattern_ace_of_clubs.svg">x</a>
            </div>
        "#;
        let page = Url::parse("https://en.wikipedia.org/wiki/File:X.svg").unwrap();
        assert_eq!(
            get_full_image_link(html, &page).unwrap().as_str(),
            "https://upload.wikimedia.org/wikipedia/commons/d/d3/English_pattern_ace_of_clubs.svg"
        );
    }

    #[test]
    fn missing_container_or_anchor_is_not_found() {
        let page = Url::parse("https://en.wikipedia.org/wiki/File:X.svg").unwrap();
        assert!(get_full_image_link("<html><body><a href='/a.svg'>a</a></body></html>", &page).is_none());
        assert!(get_full_image_link(r#"<div class="fullImageLink"><a>no href</a></div>"#, &page).is_none());
    }
}
