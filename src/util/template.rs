//! A tiny string-template engine with a fixed variable whitelist, the
//! idiomatic replacement for the original's dynamic-kwargs path
//! templating (spec §9, Design Notes). Generalizes the teacher's
//! `LibraryService::format_path` substitution-and-sanitize shape to the
//! artifact store's variable set.

use std::collections::HashMap;

/// Characters that are unsafe in a path component on common filesystems.
const UNSAFE_PATH_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

#[must_use]
pub fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| if UNSAFE_PATH_CHARS.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Renders `template` by replacing every `${name}` occurrence present in
/// `vars` with its sanitized value. Unknown `${...}` placeholders are left
/// untouched rather than erroring, matching the teacher's "missing token
/// stays literal" behavior.
#[must_use]
pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = &after[..end];
        match vars.get(name) {
            Some(value) => out.push_str(&sanitize_component(value)),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&'static str, &str)]) -> HashMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect()
    }

    #[test]
    fn substitutes_known_variables() {
        let rendered = render("${title}/${episodeId}.xml", &vars(&[("title", "Demo"), ("episodeId", "123")]));
        assert_eq!(rendered, "Demo/123.xml");
    }

    #[test]
    fn leaves_unknown_placeholders_literal() {
        let rendered = render("${title}/${unknownVar}.xml", &vars(&[("title", "Demo")]));
        assert_eq!(rendered, "Demo/${unknownVar}.xml");
    }

    #[test]
    fn sanitizes_path_hostile_characters() {
        let rendered = render("${title}.xml", &vars(&[("title", "Attack on Titan: Final")]));
        assert_eq!(rendered, "Attack on Titan_ Final.xml");
    }
}
