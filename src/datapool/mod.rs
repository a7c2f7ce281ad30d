//! Inline image payload pooling.
//!
//! Base64 `data:` image URLs pasted into markdown are huge; editing
//! around them is miserable and syncing scroll against multi-kilobyte
//! lines is pointless. [`DataPool`] swaps each payload for a short
//! numbered token before the text reaches the editor, and swaps the
//! payloads back in before rendering or saving.
//!
//! `patch(simplify(text)) == text` for any text whose tokens all came
//! from this pool; tokens never seen by the pool pass through `patch`
//! untouched.

use regex::Regex;

const TOKEN_PREFIX: &str = "--data:image/";
const TOKEN_SUFFIX: &str = "--";

/// Pool of base64 image payloads keyed by short stand-in tokens.
#[derive(Debug)]
pub struct DataPool {
    // (token, payload), token index == vec position.
    entries: Vec<(String, String)>,
    payload_re: Regex,
}

impl Default for DataPool {
    fn default() -> Self {
        Self::new()
    }
}

impl DataPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            // Markdown image destinations: `(data:image/...;base64,...)`.
            payload_re: Regex::new(r"\(data:image/(?:jpeg|png|gif|webp);base64,[^)\s]*\)")
                .expect("static pattern"),
        }
    }

    /// Number of distinct payloads the pool currently holds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace every inline base64 image payload with its pool token,
    /// registering payloads not seen before.
    pub fn simplify(&mut self, text: &str) -> String {
        // Regex::replace_all takes Fn, not FnMut, so collect match
        // ranges first and splice manually.
        let ranges: Vec<(usize, usize)> = self
            .payload_re
            .find_iter(text)
            .map(|m| (m.start(), m.end()))
            .collect();

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (start, end) in ranges {
            out.push_str(&text[last..start]);
            // Strip the surrounding parentheses before pooling.
            let payload = &text[start + 1..end - 1];
            let token = self.cache(payload);
            out.push('(');
            out.push_str(&token);
            out.push(')');
            last = end;
        }
        out.push_str(&text[last..]);
        out
    }

    /// Replace every pool token with its original payload. Tokens that
    /// name an entry the pool does not hold are left as-is.
    pub fn patch(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (token, payload) in &self.entries {
            if out.contains(token.as_str()) {
                out = out.replace(token.as_str(), payload);
            }
        }
        out
    }

    /// Token for `payload`, reusing an existing entry when the same
    /// payload was pooled before.
    fn cache(&mut self, payload: &str) -> String {
        if let Some((token, _)) = self.entries.iter().find(|(_, p)| p == payload) {
            return token.clone();
        }
        // Tokens are numbered from 1.
        let token = format!("{TOKEN_PREFIX}{}{TOKEN_SUFFIX}", self.entries.len() + 1);
        self.entries.push((token.clone(), payload.to_string()));
        token
    }
}
