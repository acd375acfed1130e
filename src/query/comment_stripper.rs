use std::borrow::Cow;

/// Strip SQL comments from a statement.
///
/// Removes single-line (`--`) and block (`/* */`) comments while leaving
/// string literals and quoted identifiers untouched. Borrows the input
/// unchanged when it contains no comment at all, which is the common case
/// on the compile path.
pub fn strip_sql_comments(sql: &str) -> Cow<'_, str> {
    // Fast reject: no '-' and no '/' means no comment can start anywhere
    if memchr::memchr2(b'-', b'/', sql.as_bytes()).is_none() {
        return Cow::Borrowed(sql);
    }

    let mut result = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_quote: Option<char> = None;
    let mut stripped = false;

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                match in_quote {
                    None => in_quote = Some(ch),
                    Some(q) if q == ch => {
                        // Doubled quote inside a literal is an escape
                        if chars.peek() == Some(&ch) {
                            result.push(ch);
                            result.push(chars.next().unwrap());
                            continue;
                        }
                        in_quote = None;
                    }
                    Some(_) => {}
                }
                result.push(ch);
            }
            '-' if in_quote.is_none() && chars.peek() == Some(&'-') => {
                stripped = true;
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            '/' if in_quote.is_none() && chars.peek() == Some(&'*') => {
                stripped = true;
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                // Space keeps adjacent tokens apart
                result.push(' ');
            }
            _ => result.push(ch),
        }
    }

    if stripped {
        Cow::Owned(result)
    } else {
        Cow::Borrowed(sql)
    }
}
