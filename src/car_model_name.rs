//! Splitting free-text car model names into base model and variant.
//!
//! Names typed by staff look like `"Hilux GRS 4x4"`, `"Vios - 1.3 XLE"` or
//! `"Civic (FD) 2006"`. Explicit separators win; otherwise the other models of
//! the same make decide whether the base is one word or two. The result is
//! stored in separate columns, so this only runs when a name is entered or
//! when legacy combined names are backfilled.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelName {
    pub base_model: String,
    pub variant: Option<String>,
}

impl ModelName {
    fn new(base: &str, variant: &str) -> Self {
        let variant = variant.trim();
        Self {
            base_model: base.trim().to_string(),
            variant: (!variant.is_empty()).then(|| variant.to_string()),
        }
    }
}

pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `siblings` are the display names of the other models of the same make.
pub fn parse_model_name<S: AsRef<str>>(name: &str, siblings: &[S]) -> ModelName {
    let name = normalize_whitespace(name);

    if let Some((base, variant)) = name.split_once(" - ") {
        if !base.trim().is_empty() {
            return ModelName::new(base, variant);
        }
    }

    if let Some(open) = name.find('(') {
        let base = &name[..open];
        if !base.trim().is_empty() {
            let rest = &name[open + 1..];
            let (inner, after) = rest.split_once(')').unwrap_or((rest, ""));
            let variant = normalize_whitespace(&format!("{inner} {after}"));
            return ModelName::new(base, &variant);
        }
    }

    let words: Vec<&str> = name.split(' ').filter(|w| !w.is_empty()).collect();
    if words.len() < 2 {
        return ModelName::new(&name, "");
    }

    let mut known: HashSet<String> = siblings
        .iter()
        .map(|s| normalize_whitespace(s.as_ref()).to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    known.insert(name.to_lowercase());

    let first = words[0].to_lowercase();
    let second = words[1].to_lowercase();
    let mut share_first = 0;
    let mut share_two = 0;
    for other in &known {
        let mut it = other.split(' ');
        if it.next() == Some(first.as_str()) {
            share_first += 1;
            if it.next() == Some(second.as_str()) {
                share_two += 1;
            }
        }
    }

    if share_two >= 2 && share_two == share_first {
        ModelName::new(&words[..2].join(" "), &words[2..].join(" "))
    } else {
        ModelName::new(words[0], &words[1..].join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str, siblings: &[&str]) -> (String, Option<String>) {
        let parsed = parse_model_name(name, siblings);
        (parsed.base_model, parsed.variant)
    }

    #[test]
    fn dash_separator_wins() {
        assert_eq!(
            parse("Vios - 1.3 XLE", &[]),
            ("Vios".into(), Some("1.3 XLE".into()))
        );
    }

    #[test]
    fn parentheses_become_variant() {
        assert_eq!(
            parse("Civic (FD) 2006", &[]),
            ("Civic".into(), Some("FD 2006".into()))
        );
        assert_eq!(
            parse("Lancer (Box Type", &[]),
            ("Lancer".into(), Some("Box Type".into()))
        );
    }

    #[test]
    fn single_word_has_no_variant() {
        assert_eq!(parse("  Innova ", &[]), ("Innova".into(), None));
    }

    #[test]
    fn one_word_base_when_second_word_varies() {
        let siblings = ["Hilux Conquest", "Hilux GRS 2WD"];
        assert_eq!(
            parse("Hilux GRS 4x4", &siblings),
            ("Hilux".into(), Some("GRS 4x4".into()))
        );
    }

    #[test]
    fn two_word_base_when_always_shared() {
        let siblings = ["Land Cruiser 200", "land  cruiser Prado", "Fortuner"];
        assert_eq!(
            parse("Land Cruiser 70", &siblings),
            ("Land Cruiser".into(), Some("70".into()))
        );
        assert_eq!(
            parse("Land Cruiser", &siblings),
            ("Land Cruiser".into(), None)
        );
    }

    #[test]
    fn lone_multi_word_model_falls_back_to_first_word() {
        assert_eq!(
            parse("Land Cruiser 200", &[]),
            ("Land".into(), Some("Cruiser 200".into()))
        );
    }

    #[test]
    fn duplicate_sibling_is_not_double_counted() {
        assert_eq!(
            parse("Hilux GRS", &["Hilux GRS"]),
            ("Hilux".into(), Some("GRS".into()))
        );
    }
}
