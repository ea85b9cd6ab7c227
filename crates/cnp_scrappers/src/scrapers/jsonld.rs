use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use serde_json::Value;

/// Extracts the publication date from JSON-LD metadata in the HTML document.
/// Looks at top-level objects, arrays of objects and `@graph` entries.
pub fn extract_published(document: &Html) -> Option<DateTime<Utc>> {
    let script_selector = Selector::parse("script[type='application/ld+json']").ok()?;

    document
        .select(&script_selector)
        .filter_map(|script| serde_json::from_str::<Value>(script.text().collect::<String>().trim()).ok())
        .find_map(|json| find_date(&json))
}

fn find_date(json: &Value) -> Option<DateTime<Utc>> {
    match json {
        Value::Array(items) => items.iter().find_map(find_date),
        Value::Object(obj) => obj
            .get("datePublished")
            .and_then(Value::as_str)
            .and_then(parse_date)
            .or_else(|| obj.get("@graph").and_then(find_date)),
        _ => None,
    }
}

pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_from_graph() {
        let html = r#"
            <script type="application/ld+json">{"@type": "Organization", "name": "Decrypt"}</script>
            <script type="application/ld+json">
                {"@graph": [{"@type": "WebPage"}, {"@type": "NewsArticle", "datePublished": "2024-03-01T10:15:00+01:00"}]}
            </script>
        "#;
        let document = Html::parse_document(html);
        let date = extract_published(&document).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T09:15:00+00:00");
    }

    #[test]
    fn test_broken_json_is_ignored() {
        let html = r#"<script type="application/ld+json">{"datePublished": </script>"#;
        assert!(extract_published(&Html::parse_document(html)).is_none());
    }
}
