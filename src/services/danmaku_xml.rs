//! The dandanplay-compatible danmaku XML document: parse/serialize plus
//! `p`-attribute normalization (spec §4.3). Built on `quick-xml`, the
//! crate the teacher already depends on for its own XML surfaces.

use std::sync::OnceLock;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;
use tracing::warn;

use crate::constants::artifact::{CHATSERVER, DEFAULT_COLOR, DEFAULT_FONTSIZE};
use crate::models::Comment;

fn normalized_p_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?\d+(?:\.\d+)?,\d+,\d+,\d+,\[[^\]]*\]$").expect("valid regex")
    })
}

/// Strips XML-invalid control characters (everything below 0x20 except
/// tab/CR/LF) so malformed provider payloads never fail the parser.
#[must_use]
pub fn strip_invalid_xml_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| c == '\t' || c == '\n' || c == '\r' || c >= '\u{20}')
        .collect()
}

/// Normalizes an incoming `p` attribute to the four-field core
/// (`time_seconds,mode,fontsize,color`) plus a bracketed provider tag.
/// Idempotent: `normalize_p(normalize_p(p, provider), provider) == normalize_p(p, provider)`.
#[must_use]
pub fn normalize_p(raw: &str, provider: &str) -> String {
    if normalized_p_regex().is_match(raw) {
        return raw.to_string();
    }

    let core_part = raw.split(',').next().map_or(raw, |_| raw);
    let fields: Vec<&str> = core_part.split(',').collect();

    let core: [String; 4] = match fields.len() {
        8 => [fields[0].to_string(), fields[1].to_string(), fields[2].to_string(), fields[3].to_string()],
        4 => {
            let f2_num: Option<f64> = fields[2].parse().ok();
            let f3_num: Option<i64> = fields[3].parse().ok();
            let looks_like_color_uidhash =
                f2_num.is_none_or(|v| v > 1000.0) || f3_num.is_none() || f3_num.is_some_and(|v| v > DEFAULT_COLOR);
            if looks_like_color_uidhash {
                [fields[0].to_string(), fields[1].to_string(), DEFAULT_FONTSIZE.to_string(), fields[2].to_string()]
            } else {
                [fields[0].to_string(), fields[1].to_string(), fields[2].to_string(), fields[3].to_string()]
            }
        }
        3 => [fields[0].to_string(), fields[1].to_string(), DEFAULT_FONTSIZE.to_string(), fields[2].to_string()],
        _ => ["0".to_string(), "1".to_string(), DEFAULT_FONTSIZE.to_string(), DEFAULT_COLOR.to_string()],
    };

    let all_numeric = core.iter().all(|f| f.parse::<f64>().is_ok());
    let core = if all_numeric {
        core
    } else {
        ["0".to_string(), "1".to_string(), DEFAULT_FONTSIZE.to_string(), DEFAULT_COLOR.to_string()]
    };

    format!("{},{},{},{},[{provider}]", core[0], core[1], core[2], core[3])
}

#[must_use]
pub fn serialize_document(episode_id: i64, provider: &str, comments: &[Comment]) -> String {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Start(BytesStart::new("i"))).expect("write start");
    write_text_elem(&mut writer, "chatserver", CHATSERVER);
    write_text_elem(&mut writer, "chatid", &episode_id.to_string());
    write_text_elem(&mut writer, "mission", "0");
    write_text_elem(&mut writer, "maxlimit", "2000");
    write_text_elem(&mut writer, "source", "k-v");
    write_text_elem(&mut writer, "sourceprovider", provider);
    write_text_elem(&mut writer, "datasize", &comments.len().to_string());

    for comment in comments {
        let p = normalize_p(&comment.p, provider);
        let mut start = BytesStart::new("d");
        start.push_attribute(("p", p.as_str()));
        writer.write_event(Event::Start(start.clone())).expect("write d start");
        writer.write_event(Event::Text(BytesText::new(&comment.m))).expect("write d text");
        writer.write_event(Event::End(start.to_end())).expect("write d end");
    }

    writer.write_event(Event::End(quick_xml::events::BytesEnd::new("i"))).expect("write end");

    let bytes = writer.into_inner();
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", String::from_utf8(bytes).expect("valid utf8"))
}

fn write_text_elem<W: std::io::Write>(writer: &mut Writer<W>, tag: &str, text: &str) {
    writer.write_event(Event::Start(BytesStart::new(tag))).expect("write start");
    writer.write_event(Event::Text(BytesText::new(text))).expect("write text");
    writer.write_event(Event::End(quick_xml::events::BytesEnd::new(tag))).expect("write end");
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub chatid: Option<String>,
    pub sourceprovider: Option<String>,
    pub comments: Vec<Comment>,
}

/// Parses a danmaku XML document, skipping malformed `<d>` nodes with a
/// warning rather than failing the whole file (spec §4.3).
pub fn parse_document(xml: &str) -> anyhow::Result<ParsedDocument> {
    let cleaned = strip_invalid_xml_chars(xml);
    let mut reader = Reader::from_str(&cleaned);
    reader.config_mut().trim_text(true);

    let mut doc = ParsedDocument { chatid: None, sourceprovider: None, comments: Vec::new() };
    let mut current_tag: Option<String> = None;
    let mut current_p: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "d" {
                    current_p = e
                        .attributes()
                        .filter_map(Result::ok)
                        .find(|a| a.key.as_ref() == b"p")
                        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                }
                current_tag = Some(name);
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                match current_tag.as_deref() {
                    Some("chatid") => doc.chatid = Some(text),
                    Some("sourceprovider") => doc.sourceprovider = Some(text),
                    Some("d") => {
                        if let Some(p) = current_p.clone() {
                            let t = p.split(',').next().and_then(|s| s.parse::<f64>().ok()).unwrap_or(0.0);
                            doc.comments.push(Comment { p, m: text, t, cid: None });
                        } else {
                            warn!("skipping <d> node with no p attribute");
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "skipping malformed node while parsing danmaku document");
                break;
            }
        }
        buf.clear();
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_bilibili_eight_field() {
        assert_eq!(normalize_p("12.5,1,25,16777215,100,1,1,999", "bilibili"), "12.5,1,25,16777215,[bilibili]");
    }

    #[test]
    fn normalizes_dandanplay_three_field() {
        assert_eq!(normalize_p("12.5,1,16777215", "dandanplay"), "12.5,1,25,16777215,[dandanplay]");
    }

    #[test]
    fn normalizes_dandanplay_four_field_color_uidhash() {
        assert_eq!(normalize_p("12.5,1,16777215,abc123hash", "dandanplay"), "12.5,1,25,16777215,[dandanplay]");
    }

    #[test]
    fn falls_back_to_defaults_for_invalid_fields() {
        assert_eq!(normalize_p("garbage", "x"), "0,1,25,16777215,[x]");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_p("12.5,1,25,16777215,100,1,1,999", "bilibili");
        let twice = normalize_p(&once, "bilibili");
        assert_eq!(once, twice);
    }

    #[test]
    fn strips_control_characters() {
        let cleaned = strip_invalid_xml_chars("hello\u{0001}world\n");
        assert_eq!(cleaned, "helloworld\n");
    }

    #[test]
    fn round_trips_comment_count_and_fields() {
        let comments = vec![
            Comment { p: "1.0,1,25,16777215".to_string(), m: "hello".to_string(), t: 1.0, cid: None },
            Comment { p: "2.0,1,25,16777215".to_string(), m: "world".to_string(), t: 2.0, cid: None },
        ];
        let xml = serialize_document(25_000_001_010_003, "bilibili", &comments);
        let parsed = parse_document(&xml).unwrap();
        assert_eq!(parsed.comments.len(), 2);
        assert_eq!(parsed.comments[0].m, "hello");
        assert_eq!(parsed.sourceprovider.as_deref(), Some("bilibili"));
    }
}
