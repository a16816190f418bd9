//! Last.fm recent-tracks page parser
//!
//! Parses one `user.getRecentTracks` response (`extended=1`) into
//! [`ScrobbleRecord`]s, renders records back into the same XML shape, and
//! merges pages into a single newest-first history.
//!
//! Page layout (abridged):
//!
//! ```xml
//! <lfm status="ok">
//!   <recenttracks user="..." page="1" totalPages="42">
//!     <track nowplaying="true">
//!       <artist><name>Radiohead</name><image size="extralarge">..</image></artist>
//!       <loved>0</loved>
//!       <name>Creep</name>
//!       <album mbid="...">Pablo Honey</album>
//!       <image size="extralarge">..</image>
//!       <date uts="1451728800">02 Jan 2016, 10:00</date>
//!     </track>
//!   </recenttracks>
//! </lfm>
//! ```

use crate::error::ParseError;
use crate::models::{Album, Artist, ScrobbleRecord};
use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};
use std::cmp::Ordering;
use std::fmt::Write;

const IMAGE_SIZE: &str = "extralarge";

/// One parsed page of scrobble history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTracksPage {
    pub page: u32,
    pub total_pages: u32,
    /// Newest first, as served
    pub tracks: Vec<ScrobbleRecord>,
}

impl RecentTracksPage {
    pub fn iter(&self) -> std::slice::Iter<'_, ScrobbleRecord> {
        self.tracks.iter()
    }
}

impl<'a> IntoIterator for &'a RecentTracksPage {
    type Item = &'a ScrobbleRecord;
    type IntoIter = std::slice::Iter<'a, ScrobbleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}

/// Parse one recent-tracks page
pub fn parse_recent_tracks_page(xml: &str) -> Result<RecentTracksPage, ParseError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();

    let recent = if root.has_tag_name("recenttracks") {
        root
    } else {
        child(root, "recenttracks").ok_or(ParseError::MissingElement("recenttracks"))?
    };

    let page = parse_u32_attr(recent, "page")?.unwrap_or(1);
    let total_pages = parse_u32_attr(recent, "totalPages")?.unwrap_or(page);

    let tracks = recent
        .children()
        .filter(|n| n.has_tag_name("track"))
        .map(parse_track)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RecentTracksPage {
        page,
        total_pages,
        tracks,
    })
}

fn parse_track(track: Node<'_, '_>) -> Result<ScrobbleRecord, ParseError> {
    let artist_node = child(track, "artist").ok_or(ParseError::MissingElement("track/artist"))?;
    // extended=1 nests the name; the plain format puts it in the element text
    let artist_name = match child(artist_node, "name") {
        Some(name) => text(name),
        None => text(artist_node),
    };

    let name = child(track, "name")
        .map(text)
        .ok_or(ParseError::MissingElement("track/name"))?;

    let loved = match child(track, "loved").map(text) {
        None => false,
        Some(value) => {
            let flag: i64 = value.trim().parse().map_err(|_| ParseError::InvalidValue {
                field: "track/loved",
                value: value.clone(),
            })?;
            flag != 0
        }
    };

    let album = match child(track, "album") {
        Some(node) => Album {
            name: non_empty(text(node)),
            image: image(track),
            release_id: node.attribute("mbid").and_then(|s| non_empty(s.to_string())),
        },
        None => Album {
            image: image(track),
            ..Album::default()
        },
    };

    let listened_at = match child(track, "date") {
        None => None,
        Some(date) => Some(parse_uts(date)?),
    };

    Ok(ScrobbleRecord {
        artist: Artist {
            name: artist_name,
            image: image(artist_node),
        },
        album,
        name,
        listened_at,
        loved,
    })
}

fn parse_uts(date: Node<'_, '_>) -> Result<DateTime<Utc>, ParseError> {
    let raw = date
        .attribute("uts")
        .ok_or(ParseError::MissingElement("track/date@uts"))?;
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(lhx_common::time::from_unix_seconds)
        .ok_or_else(|| ParseError::InvalidValue {
            field: "track/date@uts",
            value: raw.to_string(),
        })
}

fn parse_u32_attr(node: Node<'_, '_>, name: &'static str) -> Result<Option<u32>, ParseError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ParseError::InvalidValue {
                field: name,
                value: raw.to_string(),
            }),
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

/// Element text; empty elements read as ""
fn text(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().to_string()
}

/// The "extralarge" `image` child, if present and non-empty
fn image(node: Node<'_, '_>) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name("image") && n.attribute("size") == Some(IMAGE_SIZE))
        .and_then(|n| non_empty(text(n)))
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Render records as a recent-tracks page that parses back to the same records
pub fn render_recent_tracks_page(page: &RecentTracksPage) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<lfm status=\"ok\">\n");
    let _ = writeln!(
        out,
        "<recenttracks page=\"{}\" totalPages=\"{}\">",
        page.page, page.total_pages
    );

    for track in &page.tracks {
        if track.is_now_playing() {
            out.push_str("<track nowplaying=\"true\">\n");
        } else {
            out.push_str("<track>\n");
        }

        let _ = write!(out, "<artist><name>{}</name>", xml_escape(&track.artist.name));
        write_image(&mut out, track.artist.image.as_deref());
        out.push_str("</artist>\n");

        let _ = writeln!(out, "<loved>{}</loved>", u8::from(track.loved));
        let _ = writeln!(out, "<name>{}</name>", xml_escape(&track.name));
        let _ = writeln!(
            out,
            "<album mbid=\"{}\">{}</album>",
            xml_escape(track.album.release_id.as_deref().unwrap_or_default()),
            xml_escape(track.album.name.as_deref().unwrap_or_default())
        );
        write_image(&mut out, track.album.image.as_deref());

        if let Some(at) = track.listened_at {
            let _ = writeln!(
                out,
                "<date uts=\"{}\">{}</date>",
                at.timestamp(),
                at.format("%d %b %Y, %H:%M")
            );
        }
        out.push_str("</track>\n");
    }

    out.push_str("</recenttracks>\n</lfm>\n");
    out
}

fn write_image(out: &mut String, url: Option<&str>) {
    if let Some(url) = url {
        let _ = write!(out, "<image size=\"{}\">{}</image>", IMAGE_SIZE, xml_escape(url));
    }
}

/// Escape special characters for XML text and attribute values
///
/// Line breaks and tabs go out as character references: a parser folds a
/// raw `\r\n` to `\n` in text and to spaces in attributes.
fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\r' => out.push_str("&#13;"),
            '\n' => out.push_str("&#10;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(c),
        }
    }
    out
}

/// Newest first; now-playing entries (no timestamp) sort before everything
pub fn newest_first(a: &ScrobbleRecord, b: &ScrobbleRecord) -> Ordering {
    match (a.listened_at, b.listened_at) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => y.cmp(&x),
    }
}

/// Concatenate pages in page-number order, then stable-sort newest first
///
/// Directory listing order is arbitrary, so neither the order the pages are
/// passed in nor their serving order is trusted for the final sequence.
pub fn merge_pages(mut pages: Vec<RecentTracksPage>) -> Vec<ScrobbleRecord> {
    pages.sort_by_key(|p| p.page);
    let mut records: Vec<ScrobbleRecord> = pages.into_iter().flat_map(|p| p.tracks).collect();
    records.sort_by(newest_first);
    records
}
