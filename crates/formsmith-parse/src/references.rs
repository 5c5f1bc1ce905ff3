//! Locating parent-field ids inside formula text.
//!
//! Field ids are opaque strings, so they are not tokens of the formula
//! grammar. They are matched textually at identifier boundaries before the
//! formula is tokenized: an id never matches inside a longer identifier,
//! inside a number, or inside a string literal. When several ids match at the
//! same position the longest one wins.

use smallvec::SmallVec;

/// One occurrence of a field id in a formula, as a byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldReference<'a> {
    pub field_id: &'a str,
    pub start: usize,
    pub end: usize,
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Byte offset just past the string literal opening at `start`.
fn skip_string(formula: &str, start: usize) -> usize {
    let bytes = formula.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return i + 1,
            _ => i += 1,
        }
    }
    formula.len()
}

/// Find every occurrence of `ids` in `formula`, in text order.
pub fn find_references<'a, I>(formula: &str, ids: I) -> SmallVec<[FieldReference<'a>; 4]>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates: SmallVec<[&'a str; 8]> =
        ids.into_iter().filter(|id| !id.is_empty()).collect();
    candidates.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    candidates.dedup();

    let mut found = SmallVec::new();
    if candidates.is_empty() {
        return found;
    }

    let mut prev: Option<char> = None;
    let mut i = 0;
    while i < formula.len() {
        let rest = &formula[i..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        if ch == '"' {
            i = skip_string(formula, i);
            prev = Some('"');
            continue;
        }

        if !prev.is_some_and(is_word_char) {
            let hit = candidates.iter().copied().find(|id| {
                rest.starts_with(*id)
                    && !rest[id.len()..].chars().next().is_some_and(is_word_char)
            });
            if let Some(id) = hit {
                found.push(FieldReference {
                    field_id: id,
                    start: i,
                    end: i + id.len(),
                });
                prev = id.chars().next_back();
                i += id.len();
                continue;
            }
        }

        prev = Some(ch);
        i += ch.len_utf8();
    }

    found
}

/// Replace every reference to `ids` in `formula` with `render(id)`.
pub fn substitute_references<'a, I, F>(formula: &str, ids: I, mut render: F) -> String
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&str) -> String,
{
    let refs = find_references(formula, ids);
    if refs.is_empty() {
        return formula.to_string();
    }

    let mut out = String::with_capacity(formula.len() + refs.len() * 4);
    let mut cursor = 0;
    for r in &refs {
        out.push_str(&formula[cursor..r.start]);
        out.push_str(&render(r.field_id));
        cursor = r.end;
    }
    out.push_str(&formula[cursor..]);
    out
}
