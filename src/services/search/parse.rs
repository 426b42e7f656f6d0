//! Stage 1 of the unified search pipeline: filename-style title/season/
//! episode extraction (spec §4.4).

use std::sync::OnceLock;

use regex::Regex;

use crate::models::ParsedQuery;

fn sxxeyy_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bS(\d{1,2})E(\d{1,3})\b").expect("valid regex"))
}

fn season_cjk_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"第\s*(\d+)\s*季").expect("valid regex"))
}

fn ova_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(OVA|OAD|SP|特别篇|剧场版|劇場版)\b").expect("valid regex"))
}

fn bracket_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\[【(（][^\]】)）]*[\]】)）]").expect("valid regex"))
}

fn quality_keyword_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(1080p|720p|2160p|4k|bdrip|webrip|web-dl|hevc|x264|x265|avc)\b").expect("valid regex")
    })
}

/// Strips season markers (SxxEyy's season half, CJK "第N季") from a
/// title, leaving episode markers and bracket/quality tags untouched.
/// Used to derive `${titleBase}` for path templates (spec §4.3), which
/// must stay stable across a season's worth of episodes.
#[must_use]
pub fn strip_season_tokens(title: &str) -> String {
    let mut working = sxxeyy_season_regex().replace_all(title, "").into_owned();
    working = season_cjk_regex().replace(&working, "").into_owned();
    working.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string()
}

fn sxxeyy_season_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bS(\d{1,2})E\d{1,3}\b").expect("valid regex"))
}

/// Parses a raw search term into its structural parts. Title extraction
/// strips recognized markers rather than attempting a full grammar, so
/// unrecognized input degrades to "whole string is the title".
#[must_use]
pub fn parse_query(term: &str) -> ParsedQuery {
    let mut season = None;
    let mut episode = None;
    let mut is_movie_hint = false;
    let mut working = term.to_string();

    if let Some(caps) = sxxeyy_regex().captures(&working) {
        season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
        working = sxxeyy_regex().replace(&working, "").into_owned();
    }

    if season.is_none()
        && let Some(caps) = season_cjk_regex().captures(&working)
    {
        season = caps.get(1).and_then(|m| m.as_str().parse().ok());
        working = season_cjk_regex().replace(&working, "").into_owned();
    }

    if ova_marker_regex().is_match(&working) {
        is_movie_hint = true;
        working = ova_marker_regex().replace_all(&working, "").into_owned();
    }

    working = bracket_tag_regex().replace_all(&working, "").into_owned();
    working = quality_keyword_regex().replace_all(&working, "").into_owned();

    let title = working.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string();
    let title = if title.is_empty() { term.trim().to_string() } else { title };

    ParsedQuery { title, season, episode, is_movie_hint }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_sxxeyy() {
        let parsed = parse_query("Demo Show S01E03");
        assert_eq!(parsed.title, "Demo Show");
        assert_eq!(parsed.season, Some(1));
        assert_eq!(parsed.episode, Some(3));
    }

    #[test]
    fn extracts_cjk_season_marker() {
        let parsed = parse_query("Demo Show 第2季");
        assert_eq!(parsed.title, "Demo Show");
        assert_eq!(parsed.season, Some(2));
    }

    #[test]
    fn strips_quality_and_bracket_tags() {
        let parsed = parse_query("[SubsGroup] Demo Show [1080p][BDRip]");
        assert_eq!(parsed.title, "Demo Show");
    }

    #[test]
    fn flags_ova_marker() {
        let parsed = parse_query("Demo Show OVA");
        assert!(parsed.is_movie_hint);
        assert_eq!(parsed.title, "Demo Show");
    }

    #[test]
    fn falls_back_to_whole_term_when_nothing_recognized() {
        let parsed = parse_query("Plain Title");
        assert_eq!(parsed.title, "Plain Title");
        assert_eq!(parsed.season, None);
        assert_eq!(parsed.episode, None);
    }

    #[test]
    fn strip_season_tokens_removes_sxxeyy_and_cjk_markers() {
        assert_eq!(strip_season_tokens("Demo Show S01E03"), "Demo Show");
        assert_eq!(strip_season_tokens("Demo Show 第2季"), "Demo Show");
    }

    #[test]
    fn strip_season_tokens_leaves_plain_title_untouched() {
        assert_eq!(strip_season_tokens("Plain Title"), "Plain Title");
    }
}
