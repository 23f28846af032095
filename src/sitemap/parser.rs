//! Sitemap XML decoding
//!
//! Elements are matched by local name only, so namespaced and
//! un-namespaced documents decode the same way. Unknown elements are skipped.

use super::{Sitemap, SitemapIndex, SitemapKind, SitemapRef, UrlEntry};
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

const URLSET: &str = "urlset";
const SITEMAPINDEX: &str = "sitemapindex";

/// Determine whether a document is a sitemap or a sitemap index.
///
/// Only the root element is inspected; the rest of the document is not read.
pub fn detect_type(data: &[u8]) -> Result<SitemapKind> {
    if data.is_empty() {
        return Err(Error::Parse("empty data".to_string()));
    }

    let mut reader = xml_reader(data);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                return match name.as_str() {
                    URLSET => Ok(SitemapKind::Sitemap),
                    SITEMAPINDEX => Ok(SitemapKind::Index),
                    other => Err(Error::Parse(format!("unknown sitemap type: {}", other))),
                };
            }
            Ok(Event::Eof) => return Err(Error::Parse("no root element found".to_string())),
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }
}

/// Parse a `<urlset>` document into a flat sitemap
pub fn parse(data: &[u8]) -> Result<Sitemap> {
    let urls = decode_records(data, URLSET, "url", |entry: &mut UrlEntry, field, text| {
        match field {
            "loc" => entry.loc = text.to_string(),
            "lastmod" => entry.lastmod = non_empty(text),
            "changefreq" => entry.changefreq = non_empty(text),
            "priority" => entry.priority = parse_priority(text)?,
            _ => {}
        }
        Ok(())
    })
    .map_err(|e| wrap_parse_error("failed to parse sitemap", e))?;

    debug!("Parsed sitemap with {} URLs", urls.len());
    Ok(Sitemap { urls })
}

/// Parse a `<sitemapindex>` document into child sitemap references
pub fn parse_index(data: &[u8]) -> Result<SitemapIndex> {
    let sitemaps = decode_records(
        data,
        SITEMAPINDEX,
        "sitemap",
        |entry: &mut SitemapRef, field, text| {
            match field {
                "loc" => entry.loc = text.to_string(),
                "lastmod" => entry.lastmod = non_empty(text),
                _ => {}
            }
            Ok(())
        },
    )
    .map_err(|e| wrap_parse_error("failed to parse sitemap index", e))?;

    debug!("Parsed sitemap index with {} sitemaps", sitemaps.len());
    Ok(SitemapIndex { sitemaps })
}

/// Walk `<root><record><field>text</field>...</record>...</root>`, building one
/// `R` per record element and handing each field's trimmed text to `assign`.
fn decode_records<R, F>(data: &[u8], root: &str, record: &str, mut assign: F) -> Result<Vec<R>>
where
    R: Default,
    F: FnMut(&mut R, &str, &str) -> Result<()>,
{
    if data.is_empty() {
        return Err(Error::Parse("empty data".to_string()));
    }

    let mut reader = xml_reader(data);
    let mut buf = Vec::new();

    let mut records = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut current: Option<R> = None;
    let mut text = String::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = local_name(&e);
                if path.is_empty() {
                    expect_root(&name, root)?;
                    seen_root = true;
                } else if path.len() == 1 && name == record {
                    current = Some(R::default());
                }
                text.clear();
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = local_name(&e);
                if path.is_empty() {
                    // Self-closing root: a document with no records
                    expect_root(&name, root)?;
                    seen_root = true;
                    break;
                }
                if path.len() == 1 && name == record {
                    records.push(R::default());
                }
            }
            Ok(Event::Text(e)) => {
                if in_record_field(&path, record) {
                    let unescaped = e.unescape().map_err(|e| xml_error(&reader, e))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if in_record_field(&path, record) {
                    let raw = e.into_inner();
                    let decoded = std::str::from_utf8(&raw).map_err(|e| {
                        Error::Parse(format!("invalid UTF-8 in CDATA section: {}", e))
                    })?;
                    text.push_str(decoded);
                }
            }
            Ok(Event::End(_)) => {
                let Some(name) = path.pop() else {
                    return Err(Error::Parse("unexpected closing tag".to_string()));
                };
                if path.len() == 2 && path[1] == record {
                    if let Some(entry) = current.as_mut() {
                        assign(entry, &name, text.trim())?;
                    }
                } else if path.len() == 1 && name == record {
                    if let Some(entry) = current.take() {
                        records.push(entry);
                    }
                } else if path.is_empty() {
                    // Anything after the root element is ignored
                    break;
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Error::Parse("no root element found".to_string()));
    }
    if let Some(open) = path.last() {
        return Err(Error::Parse(format!(
            "unexpected end of document: <{}> is not closed",
            open
        )));
    }

    Ok(records)
}

fn xml_reader(data: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(data);
    reader.config_mut().trim_text(true);
    reader
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn in_record_field(path: &[String], record: &str) -> bool {
    path.len() == 3 && path[1] == record
}

fn expect_root(name: &str, root: &str) -> Result<()> {
    if name == root {
        Ok(())
    } else {
        Err(Error::Parse(format!(
            "expected element <{}> but found <{}>",
            root, name
        )))
    }
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> Error {
    Error::Parse(format!(
        "XML error at position {}: {}",
        reader.buffer_position(),
        err
    ))
}

fn wrap_parse_error(context: &str, err: Error) -> Error {
    match err {
        Error::Parse(msg) => Error::Parse(format!("{}: {}", context, msg)),
        other => other,
    }
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Empty priority text means "not specified"
fn parse_priority(text: &str) -> Result<Option<f64>> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f64>()
        .map(Some)
        .map_err(|e| Error::Parse(format!("invalid priority value {:?}: {}", text, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITEMAP_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <url>
        <loc>https://example.com/page1</loc>
        <lastmod>2024-01-01</lastmod>
        <changefreq>weekly</changefreq>
        <priority>0.8</priority>
    </url>
    <url>
        <loc>https://example.com/page2</loc>
    </url>
    <url>
        <loc>https://example.com/search?q=a&amp;page=2</loc>
        <priority></priority>
    </url>
</urlset>"#;

    const INDEX_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
    <sitemap>
        <loc>https://example.com/sitemap-pages.xml</loc>
        <lastmod>2024-02-01T10:00:00Z</lastmod>
    </sitemap>
    <sitemap>
        <loc>https://example.com/sitemap-posts.xml</loc>
    </sitemap>
</sitemapindex>"#;

    #[test]
    fn test_detect_type() {
        assert_eq!(
            detect_type(SITEMAP_XML.as_bytes()).unwrap(),
            SitemapKind::Sitemap
        );
        assert_eq!(detect_type(INDEX_XML.as_bytes()).unwrap(), SitemapKind::Index);
        // Repeated detection gives the same answer
        assert_eq!(
            detect_type(INDEX_XML.as_bytes()).unwrap(),
            detect_type(INDEX_XML.as_bytes()).unwrap()
        );
    }

    #[test]
    fn test_detect_type_errors() {
        let err = detect_type(b"").unwrap_err();
        assert_eq!(err.to_string(), "Parse error: empty data");

        let err = detect_type(b"<rss version=\"2.0\"><channel/></rss>").unwrap_err();
        assert!(err.to_string().contains("unknown sitemap type: rss"));

        assert!(detect_type(b"<?xml version=\"1.0\"?>").is_err());
    }

    #[test]
    fn test_detect_type_without_namespace() {
        assert_eq!(
            detect_type(b"<urlset><url><loc>https://a.com/</loc></url></urlset>").unwrap(),
            SitemapKind::Sitemap
        );
        assert_eq!(
            detect_type(b"<sm:sitemapindex xmlns:sm=\"urn:x\"></sm:sitemapindex>").unwrap(),
            SitemapKind::Index
        );
    }

    #[test]
    fn test_parse_urlset() {
        let sitemap = parse(SITEMAP_XML.as_bytes()).unwrap();
        assert_eq!(sitemap.urls.len(), 3);

        let first = &sitemap.urls[0];
        assert_eq!(first.loc, "https://example.com/page1");
        assert_eq!(first.lastmod.as_deref(), Some("2024-01-01"));
        assert_eq!(first.changefreq.as_deref(), Some("weekly"));
        assert_eq!(first.priority, Some(0.8));

        let second = &sitemap.urls[1];
        assert_eq!(second.loc, "https://example.com/page2");
        assert_eq!(second.lastmod, None);
        assert_eq!(second.priority, None);

        assert_eq!(sitemap.urls[2].loc, "https://example.com/search?q=a&page=2");
        assert_eq!(sitemap.urls[2].priority, None);
    }

    #[test]
    fn test_parse_preserves_count_and_order() {
        let mut xml = String::from("<urlset>");
        for i in 0..25 {
            xml.push_str(&format!("<url><loc>https://example.com/{}</loc></url>", i));
        }
        xml.push_str("</urlset>");

        let sitemap = parse(xml.as_bytes()).unwrap();
        assert_eq!(sitemap.urls.len(), 25);
        for (i, url) in sitemap.urls.iter().enumerate() {
            assert_eq!(url.loc, format!("https://example.com/{}", i));
        }
    }

    #[test]
    fn test_parse_ignores_unknown_elements() {
        let xml = r#"<urlset xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
            <url>
                <loc>https://example.com/gallery</loc>
                <image:image><image:loc>https://example.com/a.png</image:loc></image:image>
                <mobile/>
            </url>
            <extra>ignored</extra>
        </urlset>"#;

        let sitemap = parse(xml.as_bytes()).unwrap();
        assert_eq!(sitemap.urls.len(), 1);
        assert_eq!(sitemap.urls[0].loc, "https://example.com/gallery");
    }

    #[test]
    fn test_parse_keeps_entry_without_loc() {
        let xml = "<urlset><url><priority>0.5</priority></url></urlset>";
        let sitemap = parse(xml.as_bytes()).unwrap();
        assert_eq!(sitemap.urls.len(), 1);
        assert_eq!(sitemap.urls[0].loc, "");
        assert_eq!(sitemap.urls[0].priority, Some(0.5));
    }

    #[test]
    fn test_parse_cdata_location() {
        let xml = "<urlset><url><loc><![CDATA[https://example.com/?a=1&b=2]]></loc></url></urlset>";
        let sitemap = parse(xml.as_bytes()).unwrap();
        assert_eq!(sitemap.urls[0].loc, "https://example.com/?a=1&b=2");
    }

    #[test]
    fn test_parse_empty_urlset() {
        assert!(parse(b"<urlset/>").unwrap().is_empty());
        assert!(parse(b"<urlset></urlset>").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_wrong_root() {
        let err = parse(INDEX_XML.as_bytes()).unwrap_err();
        assert!(err
            .to_string()
            .contains("expected element <urlset> but found <sitemapindex>"));
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        let mismatched = "<urlset><url><loc>https://example.com/</lo></url></urlset>";
        assert!(matches!(parse(mismatched.as_bytes()), Err(Error::Parse(_))));

        let unclosed = "<urlset><url><loc>https://example.com/</loc></url>";
        assert!(matches!(parse(unclosed.as_bytes()), Err(Error::Parse(_))));

        assert!(parse(b"").is_err());
        assert!(parse(b"just some text").is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric_priority() {
        let xml = "<urlset><url><loc>https://example.com/</loc><priority>high</priority></url></urlset>";
        let err = parse(xml.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid priority value"));
    }

    #[test]
    fn test_parse_keeps_out_of_range_priority() {
        let xml = "<urlset><url><loc>https://example.com/</loc><priority>1.5</priority></url></urlset>";
        let sitemap = parse(xml.as_bytes()).unwrap();
        assert_eq!(sitemap.urls[0].priority, Some(1.5));
    }

    #[test]
    fn test_parse_index() {
        let index = parse_index(INDEX_XML.as_bytes()).unwrap();
        assert_eq!(index.sitemaps.len(), 2);
        assert_eq!(index.sitemaps[0].loc, "https://example.com/sitemap-pages.xml");
        assert_eq!(
            index.sitemaps[0].lastmod.as_deref(),
            Some("2024-02-01T10:00:00Z")
        );
        assert_eq!(index.sitemaps[1].lastmod, None);
    }

    #[test]
    fn test_parse_index_rejects_urlset() {
        let err = parse_index(SITEMAP_XML.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("failed to parse sitemap index"));
    }
}
