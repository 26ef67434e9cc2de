use std::borrow::Cow;

/// Appends every value through `f`, inserting `separator` between the ones
/// that produced output.
pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Substitutes `{0}`, `{1}`, ... markers of an operator template with the
/// given arguments.
pub fn embed(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let tail = &rest[open + 1..];
        match tail.find('}').and_then(|close| {
            tail[..close]
                .parse::<usize>()
                .ok()
                .map(|index| (close, index))
        }) {
            Some((close, index)) => {
                out.push_str(&rest[..open]);
                out.push_str(args.get(index).copied().unwrap_or(""));
                rest = &tail[close + 1..];
            }
            None => {
                out.push_str(&rest[..open + 1]);
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Shortens long SQL for log lines.
pub fn clip(sql: &str) -> Cow<'_, str> {
    const LIMIT: usize = 497;
    if sql.len() <= LIMIT {
        Cow::Borrowed(sql)
    } else {
        let mut end = LIMIT;
        while !sql.is_char_boundary(end) {
            end -= 1;
        }
        Cow::Owned(format!("{}...", &sql[..end]))
    }
}
