//! SQL identifier validation
//!
//! Table, column, and field identifiers are validated once, when a schema
//! registry is built; statements are then rendered with bare identifiers.

use regex::Regex;

/// MySQL reserved keywords that cannot be used as bare identifiers
pub const MYSQL_RESERVED_WORDS: &[&str] = &[
    "ADD",
    "ALL",
    "ALTER",
    "AND",
    "AS",
    "ASC",
    "BETWEEN",
    "BY",
    "CASE",
    "CHECK",
    "COLUMN",
    "CONDITION",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DATABASE",
    "DEFAULT",
    "DELETE",
    "DESC",
    "DISTINCT",
    "DROP",
    "ELSE",
    "EXISTS",
    "FALSE",
    "FOR",
    "FOREIGN",
    "FROM",
    "GRANT",
    "GROUP",
    "HAVING",
    "IN",
    "INDEX",
    "INNER",
    "INSERT",
    "INTERVAL",
    "INTO",
    "IS",
    "JOIN",
    "KEY",
    "LEADING",
    "LEFT",
    "LIKE",
    "LIMIT",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NOT",
    "NULL",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "PRIMARY",
    "REFERENCES",
    "RIGHT",
    "SELECT",
    "SET",
    "TABLE",
    "THEN",
    "TO",
    "TRAILING",
    "TRUE",
    "UNION",
    "UNIQUE",
    "UPDATE",
    "USING",
    "VALUES",
    "WHEN",
    "WHERE",
    "WITH",
];

/// Validate a table, column, or field identifier.
///
/// Rules:
/// - Must start with a lowercase letter
/// - Can only contain lowercase letters, numbers, and underscores
/// - Cannot be a MySQL reserved word
///
/// # Returns
/// Ok(()) if valid, Err with a message naming the identifier otherwise
pub fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("identifier cannot be empty".to_string());
    }

    let re = Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier pattern is valid");
    if !re.is_match(name) {
        return Err(format!(
            "identifier '{}' is invalid: must start with a lowercase letter and contain only lowercase letters, numbers, and underscores",
            name
        ));
    }

    if MYSQL_RESERVED_WORDS.contains(&name.to_uppercase().as_str()) {
        return Err(format!(
            "identifier '{}' is a MySQL reserved keyword and cannot be used",
            name
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Valid Identifier Tests
    // =========================================================================

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("clients").is_ok());
        assert!(validate_identifier("pk_id").is_ok());
        assert!(validate_identifier("invoice_lines_2").is_ok());
        assert!(validate_identifier("a").is_ok());
    }

    // =========================================================================
    // Invalid Identifier Tests
    // =========================================================================

    #[test]
    fn test_empty_identifier() {
        let result = validate_identifier("");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("empty"));
    }

    #[test]
    fn test_identifier_starting_with_digit_or_underscore() {
        assert!(validate_identifier("1clients").is_err());
        assert!(validate_identifier("_clients").is_err());
    }

    #[test]
    fn test_identifier_uppercase_rejected() {
        assert!(validate_identifier("Clients").is_err());
        assert!(validate_identifier("pkId").is_err());
    }

    #[test]
    fn test_identifier_special_chars_rejected() {
        assert!(validate_identifier("my-table").is_err());
        assert!(validate_identifier("my.table").is_err());
        assert!(validate_identifier("my table").is_err());
    }

    #[test]
    fn test_reserved_keywords_rejected() {
        let result = validate_identifier("select");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("reserved"));
        assert!(validate_identifier("order").is_err());
        assert!(validate_identifier("key").is_err());
    }

    #[test]
    fn test_reserved_words_list_contains_common_keywords() {
        assert!(MYSQL_RESERVED_WORDS.contains(&"SELECT"));
        assert!(MYSQL_RESERVED_WORDS.contains(&"WHERE"));
        assert!(MYSQL_RESERVED_WORDS.contains(&"LIMIT"));
    }
}
