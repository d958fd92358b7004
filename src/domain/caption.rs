//! Merge a summary into an existing caption.
//!
//! Captions are HTML markup (the transport reads and writes them that way so
//! formatting survives). The summary block starts at [`SENTINEL`]; everything from
//! the sentinel on is replaced on every merge, so `merge(merge(c, s), s) == merge(c, s)`.

use crate::domain::summary::Summary;
use html_escape::encode_text;

/// Delimits the generated block inside a caption.
pub const SENTINEL: &str = "--- MediaInfo ---";
/// Telegram caption limit. Counted in UTF-8 bytes of markup, which never undercounts
/// the rendered length.
pub const CAPTION_LIMIT: usize = 1024;
/// User text kept in front of a summary block that alone exceeds the limit.
pub const KEPT_BODY_LIMIT: usize = 256;

const ELLIPSIS: &str = "...";
const SEPARATOR: &str = "\n\n";

/// Caption text with any previously generated block removed.
pub fn strip_summary(caption: &str) -> &str {
    match caption.find(SENTINEL) {
        Some(idx) => caption[..idx].trim(),
        None => caption.trim(),
    }
}

/// Replace (or append) the summary block. Output never exceeds [`CAPTION_LIMIT`] bytes.
///
/// When too long, the user's text is cut and marked with `...` so the block itself
/// survives. If the block alone does not fit, at most [`KEPT_BODY_LIMIT`] bytes of the
/// user's text are kept and the block is cut instead. Cuts never split a char, a tag
/// or an entity.
pub fn merge(original: &str, summary: &Summary) -> String {
    let body = strip_summary(original);
    let block = format!("{}\n{}", SENTINEL, encode_text(&summary.to_string()));

    if body.is_empty() {
        return cut_with_ellipsis(&block, CAPTION_LIMIT);
    }

    let merged = format!("{}{}{}", body, SEPARATOR, block);
    if merged.len() <= CAPTION_LIMIT {
        return merged;
    }

    let reserved = ELLIPSIS.len() + SEPARATOR.len() + block.len();
    if reserved > CAPTION_LIMIT {
        let kept = cut_with_ellipsis(body, KEPT_BODY_LIMIT);
        let room = CAPTION_LIMIT - kept.len() - SEPARATOR.len();
        return format!("{}{}{}", kept, SEPARATOR, cut_with_ellipsis(&block, room));
    }

    let cut = safe_cut(body, CAPTION_LIMIT - reserved);
    let head = body[..cut].trim_end();
    format!("{}{}{}{}", head, ELLIPSIS, SEPARATOR, block)
}

/// `s` if it fits in `max` bytes, otherwise a safe prefix ending in `...`.
fn cut_with_ellipsis(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let cut = safe_cut(s, max - ELLIPSIS.len());
    format!("{}{}", s[..cut].trim_end(), ELLIPSIS)
}

/// Largest cut at or below `max` that does not split a char, a tag or an entity.
fn safe_cut(s: &str, max: usize) -> usize {
    let mut idx = floor_char_boundary(s, max);
    if let Some(open) = s[..idx].rfind('<') {
        if !s[open..idx].contains('>') {
            idx = open;
        }
    }
    if let Some(amp) = s[..idx].rfind('&') {
        if !s[amp..idx].contains(';') {
            idx = amp;
        }
    }
    idx
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
