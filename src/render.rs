//! Atom document construction and output.

use std::io::Write;

use anyhow::Context;
use atom_syndication::{Content, Entry, Feed, Link, Text, WriteConfig};
use chrono::Utc;

use crate::assemble::FeedEntry;
use crate::config::FeedMeta;

pub fn render<W: Write>(meta: &FeedMeta, entries: &[FeedEntry], out: W) -> anyhow::Result<()> {
    let mut feed = Feed::default();
    feed.set_title(Text::plain(meta.title.clone()));
    feed.set_subtitle(Some(Text::plain(meta.subtitle.clone())));
    feed.set_id(meta.feed_url.clone());
    feed.set_lang(Some(meta.language.clone()));
    feed.set_logo(Some(meta.logo.clone()));
    feed.set_links(vec![
        link(&meta.feed_url, "self"),
        link(&meta.site_url, "alternate"),
    ]);
    // A feed with no entries yet still needs a sane updated stamp.
    feed.set_updated(
        entries
            .iter()
            .map(|e| e.updated)
            .max()
            .unwrap_or_else(|| Utc::now().fixed_offset()),
    );
    feed.set_entries(entries.iter().map(to_atom_entry).collect::<Vec<_>>());

    feed.write_with_config(
        out,
        WriteConfig {
            indent_size: Some(2),
            write_document_declaration: true,
        },
    )
    .context("failed to write feed document")?;
    Ok(())
}

fn link(href: &str, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link
}

fn to_atom_entry(entry: &FeedEntry) -> Entry {
    let mut content = Content::default();
    content.set_value(Some(entry.content.clone()));
    content.set_content_type(Some("html".to_string()));

    let mut atom = Entry::default();
    atom.set_id(entry.id.to_string());
    atom.set_title(Text::plain(entry.title.clone()));
    atom.set_published(Some(entry.published));
    atom.set_updated(entry.updated);
    atom.set_links(vec![link(&entry.link, "alternate")]);
    atom.set_content(Some(content));
    atom
}
