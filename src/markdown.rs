//! Markdown-to-HTML rendering for assistant replies.
//!
//! Only a constrained subset is supported: headings, bold, italic, links,
//! fenced and inline code, `•` bullet lists and line breaks. Input is HTML
//! escaped before any rule runs, so the only markup in the output is markup
//! produced by the rules below.
//!
//! Every rule is a standalone function. [`render`] applies them in a fixed
//! order; the order matters (bold before italic, fences before inline code).

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Bullet glyph recognised at the start of a list line.
pub const BULLET: char = '•';

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!("invalid pattern ", stringify!($name))));
    };
}

pattern!(GAP_BEFORE_BULLET, r"\n{2,}•");
pattern!(H3, r"(?m)^### ([^\r\n]*)\r?$");
pattern!(H2, r"(?m)^## ([^\r\n]*)\r?$");
pattern!(H1, r"(?m)^# ([^\r\n]*)\r?$");
pattern!(BOLD, r"\*\*([^*]+)\*\*");
pattern!(ITALIC, r"\*([^*]+)\*");
pattern!(LINK, r#"\[([^\]]+)\]\((https?://[^\s)"]+)\)"#);
pattern!(FENCE, r"(?s)```(?:([\w+#.-]+)[ \t]*\n|\n?)(.*?)```\n?");
pattern!(INLINE_CODE, r"`([^`\n]+)`");
pattern!(BULLET_BLOCK, r"(?m)^•[ \t]+.*(?:\n•[ \t]+.*)*\n?");

/// Render raw assistant text to display HTML.
pub fn render(text: &str) -> String {
    let text = normalize_bullet_spacing(text);
    let text = escape_html(&text);

    // Fenced blocks are rendered on their own; the prose rules never see
    // their contents.
    let mut html = String::with_capacity(text.len() + text.len() / 4);
    let mut last = 0;
    for caps in FENCE.captures_iter(&text) {
        let Some(fence) = caps.get(0) else { continue };
        html.push_str(&render_prose(&text[last..fence.start()]));
        html.push_str(&code_block(caps.get(1).map(|m| m.as_str()), &caps[2]));
        last = fence.end();
    }
    html.push_str(&render_prose(&text[last..]));
    html
}

/// Rules for text outside fenced code, applied to already-escaped text.
fn render_prose(text: &str) -> String {
    let text = headings(text);
    let text = bold(&text);
    let text = italic(&text);
    let text = links(&text);
    let text = inline_code(&text);
    let text = bullet_lists(&text);
    line_breaks(&text)
}

/// Collapse blank lines directly before a bullet line to a single newline.
pub fn normalize_bullet_spacing(text: &str) -> String {
    GAP_BEFORE_BULLET.replace_all(text, "\n•").into_owned()
}

/// Escape `&`, `<` and `>`, in that order.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Reverse [`escape_html`].
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// `#`, `##` and `###` line headings.
pub fn headings(text: &str) -> String {
    let text = H3.replace_all(text, "<h3>${1}</h3>");
    let text = H2.replace_all(&text, "<h2>${1}</h2>");
    H1.replace_all(&text, "<h1>${1}</h1>").into_owned()
}

/// `**text**` to `<strong>`.
pub fn bold(text: &str) -> String {
    emphasis(text, &BOLD, "strong", |_| false)
}

/// `*text*` to `<em>`, skipping asterisks that touch another asterisk.
pub fn italic(text: &str) -> String {
    let bytes = text.as_bytes();
    emphasis(text, &ITALIC, "em", |whole| {
        let touches_before = whole.start > 0 && bytes[whole.start - 1] == b'*';
        let touches_after = bytes.get(whole.end) == Some(&b'*');
        touches_before || touches_after
    })
}

/// Wrap each match of `re` in `tag`.
///
/// Asterisks inside a link URL are literal, so a match with a delimiter
/// in a URL is skipped, as is any match rejected by `skip`.
fn emphasis(text: &str, re: &Regex, tag: &str, skip: impl Fn(&Range<usize>) -> bool) -> String {
    let urls = link_urls(text);
    let in_url = |pos: usize| urls.iter().any(|url| url.contains(&pos));

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut search = 0;

    while let Some(caps) = re.captures_at(text, search) {
        let Some(whole) = caps.get(0).map(|m| m.range()) else { break };
        if skip(&whole) || in_url(whole.start) || in_url(whole.end - 1) {
            search = whole.start + 1;
            continue;
        }

        out.push_str(&text[last..whole.start]);
        out.push_str(&format!("<{tag}>{}</{tag}>", &caps[1]));
        last = whole.end;
        search = whole.end;
    }

    out.push_str(&text[last..]);
    out
}

/// Byte ranges of the URLs of `[label](url)` links.
fn link_urls(text: &str) -> Vec<Range<usize>> {
    LINK.captures_iter(text)
        .filter_map(|caps| caps.get(2))
        .map(|url| url.range())
        .collect()
}

/// `[label](http(s)://...)` to an anchor opening in a new tab.
///
/// Any other scheme is left as literal text.
pub fn links(text: &str) -> String {
    LINK.replace_all(
        text,
        r#"<a href="${2}" target="_blank" rel="noopener noreferrer">${1}</a>"#,
    )
    .into_owned()
}

/// Triple-backtick fenced blocks to `<pre><code>`.
pub fn fenced_code_blocks(text: &str) -> String {
    FENCE
        .replace_all(text, |caps: &Captures| {
            code_block(caps.get(1).map(|m| m.as_str()), &caps[2])
        })
        .into_owned()
}

fn code_block(language: Option<&str>, body: &str) -> String {
    let body = body.strip_suffix('\n').unwrap_or(body);
    // Normalise first so text that was already escaped is not escaped twice.
    let body = escape_html(&unescape_html(body)).replace('`', "&#96;");

    match language {
        Some(language) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            language.to_lowercase(),
            body
        ),
        None => format!("<pre><code>{}</code></pre>", body),
    }
}

/// Single-backtick spans to `<code>`.
pub fn inline_code(text: &str) -> String {
    INLINE_CODE.replace_all(text, "<code>${1}</code>").into_owned()
}

/// Consecutive `•` lines to one `<ul>`.
pub fn bullet_lists(text: &str) -> String {
    BULLET_BLOCK
        .replace_all(text, |caps: &Captures| {
            let block = &caps[0];
            let items: Vec<&str> = block
                .trim_end_matches('\n')
                .split('\n')
                .map(|line| line.strip_prefix(BULLET).unwrap_or(line).trim_start())
                .collect();

            if items.first().map_or(true, |first| first.starts_with('<')) {
                return block.to_string();
            }

            let mut list = String::from("<ul>");
            for item in items {
                list.push_str("<li>");
                list.push_str(item);
                list.push_str("</li>");
            }
            list.push_str("</ul>");
            list
        })
        .into_owned()
}

/// Every remaining newline to `<br>`.
pub fn line_breaks(text: &str) -> String {
    text.replace('\n', "<br>")
}
