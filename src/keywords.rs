//! Request Keyword Extraction
//!
//! Tokenizes free-text requests into keyword runs used both to name new
//! artifacts and to match previously generated ones. A token is either a run
//! of CJK ideographs or a run of word characters; tokens appear in order of
//! first appearance and are not deduplicated.

/// Generic request phrases stripped before keyword extraction. These carry no
/// tool identity ("generate a", "tool") and would otherwise match everything.
const STOPLIST: &[&str] = &["生成一个", "生成", "一个", "工具"];

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Split text into raw token runs: CJK ideograph runs and word-character runs,
/// in order of appearance. Everything else is a separator.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_cjk = false;

    for c in text.chars() {
        let kind = if is_cjk(c) {
            Some(true)
        } else if is_word(c) {
            Some(false)
        } else {
            None
        };

        match kind {
            Some(cjk) => {
                // A CJK run and a word run are distinct tokens even when adjacent.
                if !current.is_empty() && cjk != current_cjk {
                    tokens.push(std::mem::take(&mut current));
                }
                current_cjk = cjk;
                current.push(c);
            }
            None => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Extract the keyword set of a request: strip the stoplist, tokenize, and
/// drop single-character tokens. Returns an empty set for unspecific requests.
pub fn extract_keywords(request: &str) -> Vec<String> {
    let mut cleaned = request.to_string();
    for stop in STOPLIST {
        cleaned = cleaned.replace(stop, "");
    }

    tokenize(cleaned.trim())
        .into_iter()
        .filter(|t| t.chars().count() > 1)
        .collect()
}
