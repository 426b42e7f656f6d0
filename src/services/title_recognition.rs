//! Title/season/episode normalization applied before anything lands in
//! the DB (spec §4.6 step 1): blocklist substrings, `A => B`
//! replacements, season/episode offset rules, and per-provider season
//! mappings. Grounded in the original's recognition-word handling.

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonOffsetRule {
    pub before_marker: String,
    pub after_marker: String,
    pub episode_offset: i32,
}

/// Parses `"前定位词 <> 后定位词 >> EP-1"`: a pair of markers that must
/// both appear in the title, and the episode-index adjustment to apply
/// when they do.
#[must_use]
pub fn parse_offset_rule(spec: &str) -> Option<SeasonOffsetRule> {
    let (markers, offset_part) = spec.split_once(">>")?;
    let (before, after) = markers.split_once("<>")?;
    let offset_part = offset_part.trim().trim_start_matches("EP");
    let episode_offset: i32 = offset_part.trim().parse().ok()?;
    Some(SeasonOffsetRule {
        before_marker: before.trim().to_string(),
        after_marker: after.trim().to_string(),
        episode_offset,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSeasonMapping {
    pub provider: String,
    pub from_season: i32,
    pub to_season: i32,
}

/// Parses `"{source=tencent;season_offset=9>13}"`.
#[must_use]
pub fn parse_provider_mapping(spec: &str) -> Option<ProviderSeasonMapping> {
    let inner = spec.trim().trim_start_matches('{').trim_end_matches('}');
    let mut provider = None;
    let mut from_season = None;
    let mut to_season = None;

    for part in inner.split(';') {
        let (key, value) = part.split_once('=')?;
        match key.trim() {
            "source" => provider = Some(value.trim().to_string()),
            "season_offset" => {
                let (from, to) = value.trim().split_once('>')?;
                from_season = from.trim().parse().ok();
                to_season = to.trim().parse().ok();
            }
            _ => {}
        }
    }

    Some(ProviderSeasonMapping { provider: provider?, from_season: from_season?, to_season: to_season? })
}

#[derive(Debug, Clone, Default)]
pub struct TitleRecognitionRules {
    pub blocklist: Vec<String>,
    pub replacements: Vec<(String, String)>,
    pub season_offset_rules: Vec<SeasonOffsetRule>,
    pub provider_season_mappings: Vec<ProviderSeasonMapping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedIdentity {
    pub title: String,
    pub season: i32,
    pub episode_index: Option<i32>,
}

impl TitleRecognitionRules {
    /// Applies blocklist stripping, replacements, episode-offset rules,
    /// and provider season mappings, in that order.
    #[must_use]
    pub fn normalize(&self, title: &str, season: i32, episode_index: Option<i32>, provider: &str) -> NormalizedIdentity {
        let mut title = title.to_string();
        for blocked in &self.blocklist {
            title = title.replace(blocked.as_str(), "");
        }
        for (from, to) in &self.replacements {
            title = title.replace(from.as_str(), to.as_str());
        }
        title = title.split_whitespace().collect::<Vec<_>>().join(" ").trim().to_string();

        let mut episode_index = episode_index;
        for rule in &self.season_offset_rules {
            if title.contains(&rule.before_marker) && title.contains(&rule.after_marker) {
                episode_index = episode_index.map(|e| e + rule.episode_offset);
            }
        }

        let mut season = season;
        for mapping in &self.provider_season_mappings {
            if mapping.provider == provider && mapping.from_season == season {
                season = mapping.to_season;
            }
        }

        NormalizedIdentity { title, season, episode_index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offset_rule() {
        let rule = parse_offset_rule("前定位词 <> 后定位词 >> EP-1").unwrap();
        assert_eq!(rule.before_marker, "前定位词");
        assert_eq!(rule.after_marker, "后定位词");
        assert_eq!(rule.episode_offset, -1);
    }

    #[test]
    fn parses_provider_season_mapping() {
        let mapping = parse_provider_mapping("{source=tencent;season_offset=9>13}").unwrap();
        assert_eq!(mapping.provider, "tencent");
        assert_eq!(mapping.from_season, 9);
        assert_eq!(mapping.to_season, 13);
    }

    #[test]
    fn strips_blocklist_and_applies_replacements() {
        let rules = TitleRecognitionRules {
            blocklist: vec!["[简体内嵌]".to_string()],
            replacements: vec![("旧名".to_string(), "新名".to_string())],
            ..Default::default()
        };
        let result = rules.normalize("旧名[简体内嵌]", 1, Some(5), "bilibili");
        assert_eq!(result.title, "新名");
    }

    #[test]
    fn applies_provider_season_mapping() {
        let rules = TitleRecognitionRules {
            provider_season_mappings: vec![ProviderSeasonMapping {
                provider: "tencent".to_string(),
                from_season: 9,
                to_season: 13,
            }],
            ..Default::default()
        };
        let result = rules.normalize("Demo", 9, None, "tencent");
        assert_eq!(result.season, 13);
    }

    #[test]
    fn applies_episode_offset_when_markers_present() {
        let rules = TitleRecognitionRules {
            season_offset_rules: vec![SeasonOffsetRule {
                before_marker: "前".to_string(),
                after_marker: "后".to_string(),
                episode_offset: -1,
            }],
            ..Default::default()
        };
        let result = rules.normalize("前Demo后", 1, Some(5), "bilibili");
        assert_eq!(result.episode_index, Some(4));
    }
}
