/// Light suffix-stripping stemmer for code-adjacent English.
///
/// Handles -ies, -ing, -ed and plural -s with a doubled-consonant
/// correction ("stopping" -> "stop", not "stopp"). Deliberately not a full
/// Porter stemmer; identifiers are short and over-stemming merges unrelated
/// terms.
#[must_use]
pub fn stem(term: &str) -> String {
    let term = term.to_ascii_lowercase();
    let len = term.len();

    if len > 4 && term.ends_with("ies") {
        return format!("{}y", &term[..len - 3]);
    }

    if len > 5 && term.ends_with("ing") {
        let stem = &term[..len - 3];
        return undouble(stem).to_string();
    }

    if len > 4 && term.ends_with("ed") && !term.ends_with("eed") {
        let stem = &term[..len - 2];
        return undouble(stem).to_string();
    }

    // Plural -s, but not -ss ("class") or -us ("status").
    if len > 3 && term.ends_with('s') && !term.ends_with("ss") && !term.ends_with("us") {
        return term[..len - 1].to_string();
    }

    term
}

/// Strip a trailing doubled consonant left behind by suffix removal.
fn undouble(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    let n = bytes.len();
    if n >= 2 && bytes[n - 1] == bytes[n - 2] && !is_vowel(bytes[n - 1]) && bytes[n - 1] != b'l' {
        &stem[..n - 1]
    } else {
        stem
    }
}

fn is_vowel(b: u8) -> bool {
    matches!(b, b'a' | b'e' | b'i' | b'o' | b'u')
}
