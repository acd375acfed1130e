/// Split a multi-statement script on `;` boundaries.
///
/// String literals and quoted identifiers are respected so a semicolon
/// inside a literal never splits. Empty fragments (trailing semicolons,
/// blank lines between statements) are dropped.
pub fn split_script(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == b'\'' {
                        if bytes.get(i + 1) == Some(&b'\'') {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                i += 1;
            }
            b';' => {
                let fragment = sql[start..i].trim();
                if !fragment.is_empty() {
                    statements.push(fragment);
                }
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }

    let tail = sql[start..].trim();
    if !tail.is_empty() {
        statements.push(tail);
    }

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_semicolons() {
        let script = "CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1); SELECT * FROM t";
        assert_eq!(
            split_script(script),
            vec![
                "CREATE TABLE t (id INTEGER)",
                "INSERT INTO t VALUES (1)",
                "SELECT * FROM t",
            ]
        );
    }

    #[test]
    fn test_semicolon_in_literal_does_not_split() {
        let script = "INSERT INTO t VALUES ('a;b'); SELECT 1";
        assert_eq!(
            split_script(script),
            vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]
        );
    }

    #[test]
    fn test_trailing_semicolon_and_blanks() {
        assert_eq!(split_script("SELECT 1; ;\n;"), vec!["SELECT 1"]);
        assert!(split_script("  \n ").is_empty());
    }
}
