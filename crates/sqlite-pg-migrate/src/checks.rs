//! CHECK constraint recovery from raw table definitions.
//!
//! The SQLite catalog does not expose check constraints structurally, so
//! they are recovered from the table's original CREATE TABLE text. The
//! extractor sits behind a trait so a structural catalog-based
//! implementation can replace the text scan without touching DDL synthesis.

/// Recovers CHECK clauses from a table's raw definition text.
pub trait CheckExtractor {
    /// Extract the table's CHECK clauses, in definition order.
    fn extract(&self, definition: &str) -> Vec<String>;
}

/// Best-effort line scanner, not a parser: any line containing the token
/// `CHECK` is captured whole. Misses constraints spanning multiple lines
/// and captures false positives when the word appears in a default value
/// or comment.
#[derive(Debug, Default)]
pub struct TextScanExtractor;

impl CheckExtractor for TextScanExtractor {
    fn extract(&self, definition: &str) -> Vec<String> {
        definition
            .lines()
            .filter(|line| line.contains("CHECK"))
            .map(|line| normalize_identifiers(line.trim().trim_end_matches(',')))
            .collect()
    }
}

/// Rewrite `[name]` and `` `name` `` identifier quoting to PostgreSQL's
/// double-quote syntax.
fn normalize_identifiers(clause: &str) -> String {
    clause
        .replace('[', "\"")
        .replace(']', "\"")
        .replace('`', "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_check_lines() {
        let definition = "CREATE TABLE t (\n\
                              age INTEGER,\n\
                              CHECK (age >= 0),\n\
                              name TEXT\n\
                          )";
        let checks = TextScanExtractor.extract(definition);
        assert_eq!(checks, vec!["CHECK (age >= 0)"]);
    }

    #[test]
    fn test_strips_trailing_comma() {
        let definition = "CREATE TABLE t (\n    CHECK (x > 0),\n    y TEXT\n)";
        let checks = TextScanExtractor.extract(definition);
        assert_eq!(checks, vec!["CHECK (x > 0)"]);
    }

    #[test]
    fn test_multiple_checks_keep_order() {
        let definition = "CREATE TABLE t (\n\
                              CHECK (a > 0),\n\
                              CHECK (b < 10)\n\
                          )";
        let checks = TextScanExtractor.extract(definition);
        assert_eq!(checks, vec!["CHECK (a > 0)", "CHECK (b < 10)"]);
    }

    #[test]
    fn test_normalizes_bracket_and_backtick_quoting() {
        let definition = "CREATE TABLE t (\n    CHECK ([age] >= 0 AND `age` < 200)\n)";
        let checks = TextScanExtractor.extract(definition);
        assert_eq!(checks, vec!["CHECK (\"age\" >= 0 AND \"age\" < 200)"]);
    }

    #[test]
    fn test_no_checks() {
        let definition = "CREATE TABLE t (\n    id INTEGER PRIMARY KEY\n)";
        assert!(TextScanExtractor.extract(definition).is_empty());
    }

    #[test]
    fn test_inline_column_check() {
        let definition = "CREATE TABLE t (\n    age INTEGER CHECK (age >= 0),\n    b TEXT\n)";
        let checks = TextScanExtractor.extract(definition);
        assert_eq!(checks, vec!["age INTEGER CHECK (age >= 0)"]);
    }
}
