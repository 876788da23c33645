use tui::{
    backend::Backend,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::Paragraph,
    Frame,
};

/// One-line feedback shown under every screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Busy(String),
    Info(String),
    Error(String),
}

impl Status {
    pub fn is_busy(&self) -> bool {
        matches!(self, Status::Busy(_))
    }
}

pub fn render_status<B: Backend>(frame: &mut Frame<B>, status: &Status, area: Rect) {
    let line = match status {
        Status::Idle => Spans::from(""),
        Status::Busy(msg) => Spans::from(vec![
            Span::styled("⟳ ", Style::default().fg(Color::Cyan)),
            Span::styled(msg.as_str(), Style::default().fg(Color::Cyan)),
        ]),
        Status::Info(msg) => Spans::from(Span::styled(
            msg.as_str(),
            Style::default().fg(Color::Green),
        )),
        Status::Error(msg) => Spans::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(msg.as_str(), Style::default().fg(Color::Red)),
        ]),
    };

    frame.render_widget(Paragraph::new(line), area);
}
