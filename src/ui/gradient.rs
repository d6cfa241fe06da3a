use ratatui::{
    layout::Alignment,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{block::Title, Block, BorderType, Borders},
};

/// Create a gradient color between two RGB values.
///
/// # Arguments
/// * `start` - Starting RGB color
/// * `end` - Ending RGB color
/// * `position` - Position in gradient (0.0 to 1.0)
pub fn gradient_color(start: (u8, u8, u8), end: (u8, u8, u8), position: f32) -> Color {
    let position = position.clamp(0.0, 1.0);
    let r = (start.0 as f32 + (end.0 as f32 - start.0 as f32) * position) as u8;
    let g = (start.1 as f32 + (end.1 as f32 - start.1 as f32) * position) as u8;
    let b = (start.2 as f32 + (end.2 as f32 - start.2 as f32) * position) as u8;
    Color::Rgb(r, g, b)
}

/// Color each character of `text` along the gradient.
pub fn gradient_line(text: &str, start: (u8, u8, u8), end: (u8, u8, u8)) -> Line<'static> {
    let total = text.chars().count().max(2) - 1;
    let spans: Vec<Span<'static>> = text
        .chars()
        .enumerate()
        .map(|(i, c)| {
            Span::styled(
                c.to_string(),
                Style::default()
                    .fg(gradient_color(start, end, i as f32 / total as f32))
                    .add_modifier(Modifier::BOLD),
            )
        })
        .collect();
    Line::from(spans)
}

/// Rounded block with a gradient title on the left and a status on the right.
pub fn gradient_block_with_status(
    title: &str,
    status: String,
    status_color: Color,
    start: (u8, u8, u8),
    end: (u8, u8, u8),
) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(gradient_color(start, end, 0.5)))
        .title(Title::from(gradient_line(title, start, end)).alignment(Alignment::Left))
        .title(
            Title::from(Span::styled(format!(" {} ", status), Style::default().fg(status_color)))
                .alignment(Alignment::Right),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(gradient_color((0, 0, 0), (100, 200, 50), 0.0), Color::Rgb(0, 0, 0));
        assert_eq!(gradient_color((0, 0, 0), (100, 200, 50), 1.0), Color::Rgb(100, 200, 50));
        assert_eq!(gradient_color((0, 0, 0), (100, 200, 50), 2.0), Color::Rgb(100, 200, 50));
    }

    #[test]
    fn test_gradient_line_one_span_per_char() {
        let line = gradient_line(" Eugene ", (0, 0, 0), (255, 255, 255));
        assert_eq!(line.spans.len(), 8);
    }
}
