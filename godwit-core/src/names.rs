//! Identifier conversion and per-backend quoting.

/// Convert an identifier-like value to its SQL form by replacing `-` with `_`.
pub fn to_sql_name(name: &str) -> String {
    name.replace('-', "_")
}

/// Join identifiers with ", " after converting each with [`to_sql_name`].
pub fn to_sql_list<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| to_sql_name(n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Words H2 v2 treats as reserved after upper-casing.
const H2V2_RESERVED: &[&str] = &["VALUE", "USER"];

/// H2 v2 identifier form: upper-cased, reserved words wrapped in backticks.
pub fn h2v2_name(name: &str) -> String {
    let upper = to_sql_name(name).to_uppercase();
    if H2V2_RESERVED.contains(&upper.as_str()) {
        format!("`{upper}`")
    } else {
        upper
    }
}

/// Words SQL Server will not accept unquoted.
const SQLSERVER_RESERVED: &[&str] = &["public", "user"];

/// SQL Server identifier form: reserved words wrapped in brackets.
///
/// `quote` suppresses the wrapping for contexts that want the bare
/// identifier, such as introspection queries.
pub fn sqlserver_name(name: &str, quote: bool) -> String {
    let converted = to_sql_name(name);
    if quote && SQLSERVER_RESERVED.contains(&converted.to_lowercase().as_str()) {
        format!("[{converted}]")
    } else {
        converted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sql_name() {
        assert_eq!(to_sql_name("foo-bar"), "foo_bar");
        assert_eq!(to_sql_name("plain"), "plain");
    }

    #[test]
    fn test_to_sql_list() {
        assert_eq!(to_sql_list(["a", "b-c"]), "a, b_c");
    }

    #[test]
    fn test_h2v2_reserved() {
        assert_eq!(h2v2_name("value"), "`VALUE`");
        assert_eq!(h2v2_name("user"), "`USER`");
        assert_eq!(h2v2_name("amount"), "AMOUNT");
    }

    #[test]
    fn test_sqlserver_reserved() {
        assert_eq!(sqlserver_name("public", true), "[public]");
        assert_eq!(sqlserver_name("user", true), "[user]");
        assert_eq!(sqlserver_name("user", false), "user");
        assert_eq!(sqlserver_name("orders", true), "orders");
    }
}
