use crate::statement::{ParamKey, ParamOccurrence};

/// What a scan of one statement found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanOutcome {
    /// Every placeholder occurrence in source order
    pub params: Vec<ParamOccurrence>,
    pub saw_named: bool,
    pub saw_positional: bool,
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scan canonical SQL for parameter markers in a single pass.
///
/// Recognized marker syntaxes: `?` (anonymous positional, keyed by
/// occurrence order), `$n` (numbered, keyed as position n-1), `:name`
/// (named-colon) and `%(name)s` (named-percent). String literals, quoted
/// identifiers and `::` casts are skipped.
pub fn scan_parameters(sql: &str) -> ScanOutcome {
    let bytes = sql.as_bytes();
    let mut outcome = ScanOutcome::default();
    let mut anon_index: u32 = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                // String literal; '' is an escaped quote
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
                // Quoted identifier
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    i += 1;
                }
                i += 1;
            }
            b':' => {
                if bytes.get(i + 1) == Some(&b':') {
                    // Cast operator, not a parameter
                    i += 2;
                } else if bytes.get(i + 1).copied().is_some_and(is_ident_start) {
                    let start = i;
                    let mut end = i + 1;
                    while end < bytes.len() && is_ident_byte(bytes[end]) {
                        end += 1;
                    }
                    outcome.params.push(ParamOccurrence {
                        key: ParamKey::Named(sql[start + 1..end].to_string()),
                        start,
                        end,
                    });
                    outcome.saw_named = true;
                    i = end;
                } else {
                    i += 1;
                }
            }
            b'%' => {
                if bytes.get(i + 1) == Some(&b'%') {
                    i += 2;
                } else if bytes.get(i + 1) == Some(&b'(') {
                    let name_start = i + 2;
                    let mut end = name_start;
                    while end < bytes.len() && is_ident_byte(bytes[end]) {
                        end += 1;
                    }
                    if end > name_start
                        && bytes.get(end) == Some(&b')')
                        && bytes.get(end + 1) == Some(&b's')
                    {
                        outcome.params.push(ParamOccurrence {
                            key: ParamKey::Named(sql[name_start..end].to_string()),
                            start: i,
                            end: end + 2,
                        });
                        outcome.saw_named = true;
                        i = end + 2;
                    } else {
                        i += 1;
                    }
                } else {
                    i += 1;
                }
            }
            b'?' => {
                outcome.params.push(ParamOccurrence {
                    key: ParamKey::Position(anon_index),
                    start: i,
                    end: i + 1,
                });
                anon_index += 1;
                outcome.saw_positional = true;
                i += 1;
            }
            b'$' => {
                let mut end = i + 1;
                while end < bytes.len() && bytes[end].is_ascii_digit() {
                    end += 1;
                }
                if end > i + 1 {
                    let number: u32 = sql[i + 1..end].parse().unwrap_or(0);
                    if number > 0 {
                        outcome.params.push(ParamOccurrence {
                            key: ParamKey::Position(number - 1),
                            start: i,
                            end,
                        });
                        outcome.saw_positional = true;
                    }
                    i = end;
                } else {
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    outcome
}
