//! English noun inflection.
//!
//! Rule tables in the style of the classic Rails inflector. Irregular and
//! uncountable nouns are matched against the last word of an identifier
//! (`sales_person`, `SalesPerson`), regular rules against the whole string.
//! `singularize(pluralize(x)) == x` holds for the nouns the tool is expected
//! to see; relation propagation depends on it.

use regex::Regex;
use std::sync::LazyLock;

const UNCOUNTABLE: &[&str] = &[
    "equipment",
    "information",
    "rice",
    "money",
    "species",
    "series",
    "fish",
    "sheep",
    "jeans",
    "police",
    "news",
    "metadata",
];

/// (singular, plural) pairs, lowercase.
const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("man", "men"),
    ("woman", "women"),
    ("child", "children"),
    ("sex", "sexes"),
    ("move", "moves"),
    ("mouse", "mice"),
    ("ox", "oxen"),
    ("foot", "feet"),
    ("tooth", "teeth"),
    ("goose", "geese"),
    ("zombie", "zombies"),
    ("criterion", "criteria"),
    ("pie", "pies"),
    ("tie", "ties"),
    ("lie", "lies"),
];

static PLURAL_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)(quiz)$", "${1}zes"),
        (r"(?i)(matr|vert|ind)(?:ix|ex)$", "${1}ices"),
        (r"(?i)(x|ch|ss|sh)$", "${1}es"),
        (r"(?i)([^aeiouy]|qu)y$", "${1}ies"),
        (r"(?i)(hive)$", "${1}s"),
        (r"(?i)(?:([^f])fe|([lr])f)$", "${1}${2}ves"),
        (r"(?i)sis$", "ses"),
        (r"(?i)([ti])a$", "${1}a"),
        (r"(?i)([ti])um$", "${1}a"),
        (r"(?i)(buffal|tomat|potat|her)o$", "${1}oes"),
        (r"(?i)(bu)s$", "${1}ses"),
        (r"(?i)(alias|status|campus)$", "${1}es"),
        (r"(?i)(octop|vir)i$", "${1}i"),
        (r"(?i)(octop|vir)us$", "${1}i"),
        (r"(?i)^(ax|test)is$", "${1}es"),
        (r"(?i)s$", "s"),
        (r"$", "s"),
    ])
});

static SINGULAR_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    compile(&[
        (r"(?i)(database)s$", "${1}"),
        (r"(?i)(quiz)zes$", "${1}"),
        (r"(?i)(matr)ices$", "${1}ix"),
        (r"(?i)(vert|ind)ices$", "${1}ex"),
        (r"(?i)(alias|status|campus)(es)?$", "${1}"),
        (r"(?i)(octop|vir)(us|i)$", "${1}us"),
        (r"(?i)^(a)x[ie]s$", "${1}xis"),
        (r"(?i)(cris|test)(is|es)$", "${1}is"),
        (r"(?i)(shoe)s$", "${1}"),
        (r"(?i)(buffal|tomat|potat|her)oes$", "${1}o"),
        (r"(?i)(bus)(es)?$", "${1}"),
        (r"(?i)(x|ch|ss|sh)es$", "${1}"),
        (r"(?i)(m)ovies$", "${1}ovie"),
        (
            r"(?i)(cook|rook|self|calor|brown|hipp|smooth|goal|freeb|aunt|bird|sort|hood|prair|tech|food|vegg|group|newb|neckt|magp)ies$",
            "${1}ie",
        ),
        (r"(?i)([^aeiouy]|qu)ies$", "${1}y"),
        (r"(?i)(tive|hive)s$", "${1}"),
        (r"(?i)((?:^|[^o])(?:kn|l|w)i)ves$", "${1}fe"),
        (r"(?i)(val|cur|ner|ser|ver|sol|sal|twel|del)ves$", "${1}ve"),
        (r"(?i)([lr])ves$", "${1}f"),
        (r"(?i)ves$", "ve"),
        (r"(?i)(analy|ba|diagno|parenthe|progno|synop|the)(sis|ses)$", "${1}sis"),
        (r"(?i)([ti])a$", "${1}um"),
        (r"(?i)(ss|us)$", "${1}"),
        (r"(?i)s$", ""),
    ])
});

fn compile(rules: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    rules
        .iter()
        .filter_map(|(pattern, replacement)| match Regex::new(pattern) {
            Ok(regex) => Some((regex, *replacement)),
            Err(e) => {
                tracing::error!("Invalid inflection rule {}: {}", pattern, e);
                None
            }
        })
        .collect()
}

/// Plural form of `word`. Already-plural words come back unchanged.
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let (head, last) = split_last_word(word);
    let lower = last.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if lower == *plural {
            return word.to_string();
        }
        if lower == *singular {
            return format!("{}{}", head, match_case(last, plural));
        }
    }

    apply_rules(word, &PLURAL_RULES)
}

/// Singular form of `word`. Already-singular words come back unchanged.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let (head, last) = split_last_word(word);
    let lower = last.to_lowercase();

    if UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }

    for (singular, plural) in IRREGULAR {
        if lower == *singular {
            return word.to_string();
        }
        if lower == *plural {
            return format!("{}{}", head, match_case(last, singular));
        }
    }

    apply_rules(word, &SINGULAR_RULES)
}

fn apply_rules(word: &str, rules: &[(Regex, &'static str)]) -> String {
    for (regex, replacement) in rules {
        if regex.is_match(word) {
            return regex.replace(word, *replacement).into_owned();
        }
    }
    word.to_string()
}

/// Split an identifier into everything before its last word and the last word.
///
/// Words are separated by `_`, `-`, spaces, or a lower-to-upper case change.
fn split_last_word(word: &str) -> (&str, &str) {
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (idx, ch) in word.char_indices() {
        match prev {
            Some(p) if p == '_' || p == '-' || p == ' ' => start = idx,
            Some(p) if p.is_lowercase() && ch.is_uppercase() => start = idx,
            _ => {}
        }
        prev = Some(ch);
    }
    word.split_at(start)
}

/// Re-case `replacement` to follow the casing of `original`.
fn match_case(original: &str, replacement: &str) -> String {
    if original.len() > 1 && original.chars().all(|c| !c.is_lowercase()) {
        return replacement.to_uppercase();
    }
    match original.chars().next() {
        Some(first) if first.is_uppercase() => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}
