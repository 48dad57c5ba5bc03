//! Query-string builder for the hosted REST tables.
//!
//! Produces the `(key, value)` pairs PostgREST expects: `select=...`,
//! `col=eq.value`, `col=in.(a,b)`, `order=col.desc`, `limit=n`.

/// Sort direction for `order=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableQuery {
    table: &'static str,
    params: Vec<(String, String)>,
}

impl TableQuery {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            params: Vec::new(),
        }
    }

    /// Path relative to the project URL, e.g. `rest/v1/leads`.
    pub fn path(&self) -> String {
        format!("rest/v1/{}", self.table)
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".into(), columns.into()));
        self
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.params.push((column.into(), format!("eq.{}", value)));
        self
    }

    pub fn in_list<S: AsRef<str>>(mut self, column: &str, values: &[S]) -> Self {
        let list = values
            .iter()
            .map(|v| quote_list_value(v.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        self.params.push((column.into(), format!("in.({})", list)));
        self
    }

    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.params
            .push(("order".into(), format!("{}.{}", column, direction.as_str())));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.params.push(("limit".into(), n.to_string()));
        self
    }
}

/// Values containing list delimiters must be double-quoted inside `in.(...)`.
fn quote_list_value(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ' ' | '.' | ':'));
    if !needs_quotes {
        return value.to_string();
    }
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Row total from a `Content-Range` header such as `0-24/57` or `*/0`.
pub fn parse_content_range_total(header: &str) -> Option<usize> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leads_listing_query() {
        let query = TableQuery::new("leads")
            .select("*,profiles:assigned_to(full_name)")
            .order("created_at", Direction::Desc);
        assert_eq!(query.path(), "rest/v1/leads");
        assert_eq!(
            query.params(),
            &[
                ("select".to_string(), "*,profiles:assigned_to(full_name)".to_string()),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_eq_and_limit() {
        let query = TableQuery::new("profiles").eq("id", "abc-123").limit(1);
        assert_eq!(query.params()[0], ("id".into(), "eq.abc-123".into()));
        assert_eq!(query.params()[1], ("limit".into(), "1".into()));
    }

    #[test]
    fn test_in_list_quotes_delimiters() {
        let query = TableQuery::new("leads").in_list("id", &["a1", "b,2", "say \"hi\""]);
        assert_eq!(query.params()[0].1, r#"in.(a1,"b,2","say \"hi\"")"#);
    }

    #[test]
    fn test_uuid_values_stay_bare() {
        let ids = vec!["4f1c2a7e-0b7d-4a55-9f2e-3f4a9b1c2d3e".to_string()];
        let query = TableQuery::new("leads").in_list("id", &ids);
        assert_eq!(
            query.params()[0].1,
            "in.(4f1c2a7e-0b7d-4a55-9f2e-3f4a9b1c2d3e)"
        );
    }

    #[test]
    fn test_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/57"), Some(57));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }
}
