//! Parameter references in template bodies.
//!
//! `$name` takes the longest run of ASCII letters, digits and underscores,
//! except that a digit or one of `*#$@!?-` right after the `$` is a name on
//! its own, the way a shell reads `$1` or `$$`. `${name}` takes everything
//! up to the closing brace. A `$` followed by anything else, `${}`, and an
//! unterminated `${` are copied through as text.

/// Replaces every parameter reference in `text` using `lookup`.
///
/// Stops at the first name `lookup` does not know and returns it as the
/// error.
pub fn substitute<F>(text: &str, lookup: F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(dollar) = rest.find('$') {
        out.push_str(&rest[..dollar]);
        let after = &rest[dollar + 1..];

        let (name, consumed) = match reference(after) {
            Some(found) => found,
            None => {
                out.push('$');
                rest = after;
                continue;
            }
        };

        match lookup(name) {
            Some(value) => out.push_str(&value),
            None => return Err(name.to_string()),
        }
        rest = &after[consumed..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Parses the reference following a `$`, returning the name and the number
/// of bytes it spans.
fn reference(s: &str) -> Option<(&str, usize)> {
    if let Some(braced) = s.strip_prefix('{') {
        let close = braced.find('}')?;
        if close == 0 {
            return None;
        }
        return Some((&braced[..close], close + 2));
    }

    match s.bytes().next() {
        Some(b) if b.is_ascii_digit() || b"*#$@!?-".contains(&b) => return Some((&s[..1], 1)),
        _ => {}
    }

    let len = s
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    (len > 0).then(|| (&s[..len], len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "name" => Some("World".into()),
            "x" => Some("1".into()),
            "long_name" => Some("L".into()),
            _ => None,
        }
    }

    #[test]
    fn substitution_cases() {
        let cases = [
            ("hello $name", "hello World"),
            ("hello ${name}!", "hello World!"),
            ("${x}${x}", "11"),
            ("$x-$x", "1-1"),
            ("$long_name.", "L."),
            ("cost: $", "cost: $"),
            ("a $ b", "a $ b"),
            ("${}", "${}"),
            ("${name", "${name"),
            ("no refs", "no refs"),
            ("", ""),
        ];
        for (input, want) in cases {
            assert_eq!(substitute(input, lookup).as_deref(), Ok(want), "{input:?}");
        }
    }

    #[test]
    fn identifier_run_is_greedy() {
        assert_eq!(substitute("$names", lookup), Err("names".to_string()));
        assert_eq!(substitute("${name}s", lookup).as_deref(), Ok("Worlds"));
    }

    #[test]
    fn special_names_are_one_character() {
        let lookup = |name: &str| (name == "1").then(|| "one".to_string());
        assert_eq!(substitute("$1abc", lookup).as_deref(), Ok("oneabc"));
        assert_eq!(substitute("${1}x", lookup).as_deref(), Ok("onex"));
        assert_eq!(substitute("pid $$", lookup), Err("$".to_string()));
        assert_eq!(substitute("all $*", lookup), Err("*".to_string()));
        assert_eq!(substitute("$9", lookup), Err("9".to_string()));
    }

    #[test]
    fn unknown_reference_is_reported() {
        assert_eq!(substitute("echo $nope", lookup), Err("nope".to_string()));
        assert_eq!(substitute("${a b}", lookup), Err("a b".to_string()));
    }

    #[test]
    fn values_are_not_rescanned() {
        let lookup = |name: &str| (name == "v").then(|| "$v".to_string());
        assert_eq!(substitute("$v", lookup).as_deref(), Ok("$v"));
    }
}
