//! The `key=value|key=value|` property string Proteus attaches to entities.
use std::collections::BTreeMap;

pub type Properties = BTreeMap<String, String>;

/// Empty segments are skipped; a later duplicate key overwrites an earlier one.
pub fn decode_properties(raw: &str) -> Properties {
    raw.split('|')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (segment.to_string(), String::new()),
        })
        .collect()
}

/// Entries with an empty value and keys listed in `exclude` are left out.
pub fn encode_properties(props: &Properties, exclude: &[&str]) -> String {
    props
        .iter()
        .filter(|(key, value)| !value.is_empty() && !exclude.contains(&key.as_str()))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> Properties {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn decode_skips_empty_segments() {
        let decoded = decode_properties("|ttl=-1||absoluteName=app.example.com|");
        assert_eq!(
            decoded,
            props(&[("ttl", "-1"), ("absoluteName", "app.example.com")])
        );
        assert!(decode_properties("").is_empty());
    }

    #[test]
    fn decode_splits_on_first_equals_only() {
        let decoded = decode_properties("comments=a=b|flag");
        assert_eq!(decoded, props(&[("comments", "a=b"), ("flag", "")]));
    }

    #[test]
    fn later_duplicates_win() {
        assert_eq!(decode_properties("a=1|a=2"), props(&[("a", "2")]));
    }

    #[test]
    fn encode_drops_empty_values_and_excluded_keys() {
        let p = props(&[("name", "host"), ("admin_email", "x@example.com"), ("comments", "")]);
        assert_eq!(encode_properties(&p, &[]), "admin_email=x@example.com|name=host");
        assert_eq!(encode_properties(&p, &["name"]), "admin_email=x@example.com");
        assert_eq!(encode_properties(&Properties::new(), &[]), "");
    }

    #[test]
    fn decode_reverses_encode() {
        let p = props(&[
            ("admin_email", "ops@example.com"),
            ("admin_name", "Ops Team"),
            ("admin_phone", "+49 541 969"),
            ("empty", ""),
        ]);
        let mut expected = p.clone();
        expected.remove("empty");
        assert_eq!(decode_properties(&encode_properties(&p, &[])), expected);
    }
}
