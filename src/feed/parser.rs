use thiserror::Error;

use super::dom::{parse_document, text_of, Element};
use super::types::{Feed, FeedItem};

/// Reasons a document did not produce a [`Feed`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Malformed(String),
    /// Root element is none of `rss`, `rdf:RDF`, `feed`.
    #[error("Unknown feed format (root element <{0}>)")]
    UnknownFormat(String),
    #[error("RSS document has no <channel>")]
    MissingChannel,
}

/// Parse RSS 2.0, RSS 1.0 (RDF) or Atom XML into a [`Feed`].
///
/// Every item is stamped with `source_name`. Missing elements read as empty
/// strings; only structural problems fail the parse.
pub fn parse_feed(xml: &str, source_name: &str) -> Result<Feed, ParseError> {
    let root = parse_document(xml).map_err(ParseError::Malformed)?;

    // Browsers' DOMParser reports failures in-band as <parsererror>.
    if let Some(error) = (root.name == "parsererror")
        .then_some(&root)
        .or_else(|| root.first_descendant("parsererror"))
    {
        return Err(ParseError::Malformed(error.text()));
    }

    match root.name.as_str() {
        "rss" | "rdf:RDF" => parse_rss(&root, source_name),
        "feed" => Ok(parse_atom(&root, source_name)),
        other => Err(ParseError::UnknownFormat(other.to_string())),
    }
}

fn parse_rss(root: &Element, source_name: &str) -> Result<Feed, ParseError> {
    let channel = root
        .first_descendant("channel")
        .ok_or(ParseError::MissingChannel)?;

    // RSS 2.0 nests items in the channel; RDF makes them its siblings.
    let items = root
        .descendants("item")
        .into_iter()
        .map(|item| {
            let author = non_empty(text_of(item.first_descendant("author")))
                .or_else(|| non_empty(text_of(item.first_descendant("dc:creator"))));
            let published_at = ["pubDate", "dc:date", "published"]
                .iter()
                .map(|tag| text_of(item.first_descendant(tag)))
                .find(|s| !s.is_empty())
                .unwrap_or_default();

            FeedItem {
                title: text_of(item.first_descendant("title")),
                link: text_of(item.first_descendant("link")),
                published_at,
                description: non_empty(text_of(item.first_descendant("description"))),
                author,
                source: source_name.to_string(),
            }
        })
        .collect();

    Ok(Feed {
        title: text_of(channel.child("title")),
        link: text_of(channel.child("link")),
        description: non_empty(text_of(channel.child("description"))),
        items,
    })
}

fn parse_atom(root: &Element, source_name: &str) -> Feed {
    let items = root
        .descendants("entry")
        .into_iter()
        .map(|entry| {
            let link = entry_link(entry)
                .map(str::to_string)
                .or_else(|| non_empty(text_of(entry.first_descendant("url"))))
                .unwrap_or_default();
            let description = non_empty(text_of(entry.first_descendant("summary")))
                .or_else(|| non_empty(text_of(entry.first_descendant("content"))));
            let author = non_empty(text_of(
                entry
                    .first_descendant("author")
                    .and_then(|a| a.first_descendant("name")),
            ));
            let published_at = non_empty(text_of(entry.first_descendant("published")))
                .unwrap_or_else(|| text_of(entry.first_descendant("updated")));

            FeedItem {
                title: text_of(entry.first_descendant("title")),
                link,
                published_at,
                description,
                author,
                source: source_name.to_string(),
            }
        })
        .collect();

    Feed {
        title: text_of(root.child("title")),
        link: entry_link(root).unwrap_or_default().to_string(),
        description: non_empty(text_of(root.child("subtitle"))),
        items,
    }
}

/// `href` of the first `rel="alternate"` (or rel-less) `link` child, falling
/// back to the first `link` child with any `href`.
fn entry_link(element: &Element) -> Option<&str> {
    let links: Vec<&Element> = element
        .child_elements()
        .filter(|e| e.name == "link")
        .collect();

    links
        .iter()
        .copied()
        .find(|l| matches!(l.attribute("rel"), None | Some("alternate")))
        .or_else(|| links.first().copied())
        .and_then(|l| l.attribute("href"))
        .filter(|href| !href.trim().is_empty())
        .map(str::trim)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
