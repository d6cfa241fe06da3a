use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

use crate::config::ColorConfig;

/// Colors used when drawing rendered replies.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub heading: Color,
    pub code: Color,
    pub link: Color,
}

impl Palette {
    /// Palette for assistant replies.
    pub fn assistant(colors: &ColorConfig) -> Self {
        Self {
            text: ColorConfig::to_color(&colors.assistant),
            heading: ColorConfig::to_color(&colors.heading),
            code: ColorConfig::to_color(&colors.code),
            link: ColorConfig::to_color(&colors.link),
        }
    }
}

/// Decode the entities the renderer emits.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#96;", "`")
        .replace("&amp;", "&")
}

/// Value of `href="..."` inside a tag.
fn href_of(tag: &str) -> Option<String> {
    let start = tag.find("href=\"")? + "href=\"".len();
    let end = tag[start..].find('"')? + start;
    Some(decode_entities(&tag[start..end]))
}

/// Index of the `>` closing the tag at the start of `html`.
///
/// A `>` inside a quoted attribute value does not close the tag.
fn tag_end(html: &str) -> Option<usize> {
    let mut quoted = false;
    for (i, b) in html.bytes().enumerate() {
        match b {
            b'"' => quoted = !quoted,
            b'>' if !quoted => return Some(i),
            _ => {}
        }
    }
    None
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push(&mut self, text: String, style: Style) {
        if !text.is_empty() {
            self.spans.push(Span::styled(text, style));
        }
    }

    /// End the current line, even if it is empty.
    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    /// End the current line only if something is on it.
    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.break_line();
        }
    }
}

/// Convert renderer HTML into styled terminal lines.
///
/// Understands the tags the markdown renderer produces: `h1`-`h3`,
/// `strong`, `em`, `code`, `pre`, `ul`/`li`, `a` and `br`. Anything else
/// is dropped.
pub fn html_to_lines(html: &str, palette: &Palette) -> Vec<Line<'static>> {
    let mut out = LineBuilder::default();
    let base = Style::default().fg(palette.text);

    let mut bold = false;
    let mut italic = false;
    let mut code = false;
    let mut heading = false;
    let mut in_pre = false;
    let mut link: Option<(String, String)> = None;

    let style = |bold: bool, italic: bool, code: bool, heading: bool, linked: bool| {
        let mut style = base;
        if heading {
            style = style.fg(palette.heading).add_modifier(Modifier::BOLD);
        }
        if code {
            style = style.fg(palette.code);
        }
        if linked {
            style = style.fg(palette.link).add_modifier(Modifier::UNDERLINED);
        }
        if bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        style
    };

    let mut rest = html;
    while !rest.is_empty() {
        let (text, tag) = match rest.find('<') {
            Some(0) => match tag_end(rest) {
                Some(end) => {
                    let tag = &rest[1..end];
                    rest = &rest[end + 1..];
                    ("", Some(tag))
                }
                None => {
                    let text = rest;
                    rest = "";
                    (text, None)
                }
            },
            Some(start) => {
                let text = &rest[..start];
                rest = &rest[start..];
                (text, None)
            }
            None => {
                let text = rest;
                rest = "";
                (text, None)
            }
        };

        if !text.is_empty() {
            let decoded = decode_entities(text);
            let current = style(bold, italic, code || in_pre, heading, link.is_some());
            if let Some((_, label)) = link.as_mut() {
                label.push_str(&decoded);
            }
            if in_pre {
                let mut parts = decoded.split('\n');
                if let Some(first) = parts.next() {
                    out.push(first.to_string(), current);
                }
                for part in parts {
                    out.break_line();
                    out.push(part.to_string(), current);
                }
            } else {
                out.push(decoded, current);
            }
        }

        let Some(tag) = tag else { continue };
        let name = tag
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        match name.as_str() {
            "h1" | "h2" | "h3" => {
                out.flush();
                heading = true;
            }
            "/h1" | "/h2" | "/h3" => heading = false,
            "strong" => bold = true,
            "/strong" => bold = false,
            "em" => italic = true,
            "/em" => italic = false,
            "code" => code = true,
            "/code" => code = false,
            "pre" => {
                out.flush();
                in_pre = true;
            }
            "/pre" => {
                out.flush();
                in_pre = false;
            }
            "ul" | "/li" => out.flush(),
            "li" => {
                out.flush();
                out.push(format!("  {} ", crate::markdown::BULLET), base);
            }
            "a" => link = Some((href_of(tag).unwrap_or_default(), String::new())),
            "/a" => {
                if let Some((href, label)) = link.take() {
                    if !href.is_empty() && href != label {
                        out.push(format!(" ({})", href), Style::default().fg(Color::DarkGray));
                    }
                }
            }
            "br" | "br/" => out.break_line(),
            _ => {}
        }
    }

    out.flush();
    out.lines
}

/// Word-wrap a styled line to `width` columns, keeping span styles.
///
/// Words longer than the width are split.
pub fn wrap_line(line: &Line<'static>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return vec![line.clone()];
    }

    let cells: Vec<(char, Style)> = line
        .spans
        .iter()
        .flat_map(|span| span.content.chars().map(move |c| (c, span.style)))
        .collect();
    if cells.is_empty() {
        return vec![Line::from("")];
    }

    // Split into words, each keeping its leading spaces.
    let mut words: Vec<&[(char, Style)]> = Vec::new();
    let mut start = 0;
    for i in 1..cells.len() {
        if cells[i].0 == ' ' && cells[i - 1].0 != ' ' {
            words.push(&cells[start..i]);
            start = i;
        }
    }
    words.push(&cells[start..]);

    let mut rows: Vec<Vec<(char, Style)>> = vec![Vec::new()];
    for word in words {
        let Some(row) = rows.last_mut() else { break };
        if !row.is_empty() && row.len() + word.len() > width {
            let trimmed: Vec<(char, Style)> = word
                .iter()
                .skip_while(|(c, _)| *c == ' ')
                .copied()
                .collect();
            if trimmed.is_empty() {
                continue;
            }
            rows.push(Vec::new());
            push_cells(&mut rows, &trimmed, width);
        } else {
            push_cells(&mut rows, word, width);
        }
    }

    rows.into_iter().map(cells_to_line).collect()
}

fn push_cells(rows: &mut Vec<Vec<(char, Style)>>, cells: &[(char, Style)], width: usize) {
    for &cell in cells {
        if rows.last().map_or(true, |row| row.len() >= width) {
            rows.push(Vec::new());
        }
        if let Some(row) = rows.last_mut() {
            row.push(cell);
        }
    }
}

fn cells_to_line(row: Vec<(char, Style)>) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut current_style: Option<Style> = None;

    for (c, style) in row {
        if current_style != Some(style) {
            if let Some(previous) = current_style {
                spans.push(Span::styled(std::mem::take(&mut current), previous));
            }
            current_style = Some(style);
        }
        current.push(c);
    }
    if let Some(style) = current_style {
        spans.push(Span::styled(current, style));
    }

    Line::from(spans)
}

/// Plain text to lines, one per `\n`.
pub fn plain_lines(text: &str, style: Style) -> Vec<Line<'static>> {
    text.split('\n')
        .map(|line| Line::from(Span::styled(line.to_string(), style)))
        .collect()
}

/// Flatten a line back to its text.
pub fn line_text(line: &Line<'_>) -> String {
    line.spans.iter().map(|span| span.content.as_ref()).collect()
}
