const QUERY_PREFIX: &str = "query:";

// Collapse raw model output into a single-line query.
// Backticks and line breaks become spaces, the result is trimmed and a
// leading `query:` label (any case) is dropped. An empty return means the
// model produced nothing usable.
pub fn sanitize(raw: &str) -> String {
    let cleaned = join_lines(&raw.replace("```", " ").replace('`', " "));
    let cleaned = cleaned.trim();

    let has_prefix = cleaned
        .get(..QUERY_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(QUERY_PREFIX));

    if has_prefix {
        cleaned[QUERY_PREFIX.len()..].trim().to_string()
    } else {
        cleaned.to_string()
    }
}

// A run of CR/LF (e.g. "\r\n") becomes one space
fn join_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                out.push(' ');
            }
            in_break = true;
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out
}
