use crate::parser::is_variable_name;
use crate::symbol::Inline;

/// Scan a run of text for `${NAME}` references and, when `wiki_words` is set,
/// for wiki word links. `offset` is the position of `text` in the page source.
pub fn parse_inlines(text: &str, offset: usize, wiki_words: bool) -> Vec<Inline> {
    let bytes = text.as_bytes();
    let mut inlines = Vec::new();
    let mut literal_start = 0;
    let mut in_code = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                if let Some(close) = text[i + 2..].find('}').map(|p| i + 2 + p) {
                    let name = &text[i + 2..close];
                    if is_variable_name(name) {
                        push_text(&mut inlines, &text[literal_start..i]);
                        inlines.push(Inline::Variable {
                            name: name.to_string(),
                            span: offset + i..offset + close + 1,
                        });
                        i = close + 1;
                        literal_start = i;
                        continue;
                    }
                }
                i += 2;
            }
            b'`' if wiki_words => {
                in_code = !in_code;
                i += 1;
            }
            _ if wiki_words && !in_code && at_word_boundary(bytes, i) => {
                match match_wiki_path(bytes, i) {
                    Some(end) => {
                        push_text(&mut inlines, &text[literal_start..i]);
                        inlines.push(Inline::WikiWord {
                            path: text[i..end].to_string(),
                            span: offset + i..offset + end,
                        });
                        i = end;
                        literal_start = i;
                    }
                    None => i += 1,
                }
            }
            _ => i += 1,
        }
    }

    push_text(&mut inlines, &text[literal_start..]);
    inlines
}

fn push_text(inlines: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text(previous)) = inlines.last_mut() {
        previous.push_str(text);
    } else {
        inlines.push(Inline::Text(text.to_string()));
    }
}

fn at_word_boundary(bytes: &[u8], i: usize) -> bool {
    match i.checked_sub(1).map(|p| bytes[p]) {
        None => true,
        Some(b) if b >= 0x80 => false,
        Some(b) => !(b.is_ascii_alphanumeric() || b"_/\\.:#?&=-@$".contains(&b)),
    }
}

/// Match a wiki word path such as `FrontPage`, `.FrontPage.SubPage`,
/// `<ParentPage.SubPage` or `>SubPage`. Returns the end position.
pub(crate) fn match_wiki_path(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start;
    if matches!(bytes.get(j), Some(b'.' | b'<' | b'>' | b'^')) {
        j += 1;
    }

    j = match_wiki_word(bytes, j)?;
    while bytes.get(j) == Some(&b'.') {
        match match_wiki_word(bytes, j + 1) {
            Some(end) => j = end,
            None => break,
        }
    }
    Some(j)
}

/// `[A-Z]([a-z0-9]+[A-Z][a-z0-9]*)+`, not followed by another letter or digit.
fn match_wiki_word(bytes: &[u8], start: usize) -> Option<usize> {
    if !bytes.get(start)?.is_ascii_uppercase() {
        return None;
    }

    let mut k = start + 1;
    let mut humps = 0;
    loop {
        let run_start = k;
        while k < bytes.len() && is_lower_or_digit(bytes[k]) {
            k += 1;
        }
        if k == run_start {
            break;
        }
        if k < bytes.len() && bytes[k].is_ascii_uppercase() {
            k += 1;
            humps += 1;
        } else {
            break;
        }
    }

    let ends_cleanly = bytes.get(k).is_none_or(|b| !b.is_ascii_alphanumeric());
    (humps > 0 && ends_cleanly).then_some(k)
}

fn is_lower_or_digit(b: u8) -> bool {
    b.is_ascii_lowercase() || b.is_ascii_digit()
}
