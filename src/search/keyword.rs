//! Simple keyword filtering (substring matching)

use crate::model::Item;

/// Items whose text or token contains `query`, case-insensitively
///
/// An empty or blank query matches everything.
pub fn keyword_filter<'a>(items: &'a [Item], query: &str) -> Vec<&'a Item> {
    let query_lower = query.trim().to_lowercase();
    items
        .iter()
        .filter(|it| query_lower.is_empty() || it.matches(&query_lower))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_filter() {
        let items = vec![
            Item::with_id("1", "Block open", vec![]).with_token("{"),
            Item::with_id("2", "block close", vec![]).with_token("}"),
            Item::with_id("3", "print", vec![]).with_token("console.log"),
        ];

        assert_eq!(keyword_filter(&items, "BLOCK").len(), 2);
        assert_eq!(keyword_filter(&items, "console").len(), 1);
        assert_eq!(keyword_filter(&items, "  ").len(), 3);
        assert!(keyword_filter(&items, "missing").is_empty());
    }
}
