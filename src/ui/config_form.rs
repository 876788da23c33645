use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::ui::components::status::{render_status, Status};

pub enum ConfigFormAction {
    Cancel,
    Save(String),
}

/// Single-field form editing the remote endpoint. Leaving it blank switches
/// to local mode.
pub struct ConfigFormState {
    pub endpoint: String,
    pub error: Option<String>,
}

impl ConfigFormState {
    pub fn new(current: Option<&str>) -> Self {
        Self {
            endpoint: current.unwrap_or_default().to_string(),
            error: None,
        }
    }
}

pub fn render_config_form<B: Backend>(
    f: &mut Frame<B>,
    state: &mut ConfigFormState,
    status: &Status,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title = Paragraph::new("Remote Configuration")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let input = Paragraph::new(Spans::from(vec![
        Span::styled("Endpoint URL: ", Style::default().fg(Color::Yellow)),
        Span::styled(
            format!("{}|", state.endpoint),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(input, chunks[1]);

    let explanation = Paragraph::new(vec![
        Spans::from("Projects are read with GET and written with POST on this URL."),
        Spans::from("Leave it empty to keep projects on this machine only (local mode)."),
    ])
    .style(Style::default().fg(Color::Gray))
    .wrap(Wrap { trim: true });
    f.render_widget(explanation, chunks[2]);

    match &state.error {
        Some(error) => render_status(f, &Status::Error(error.clone()), chunks[3]),
        None => render_status(f, status, chunks[3]),
    }

    let help = Paragraph::new("Enter - Save | Esc - Cancel")
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[4]);
}

pub fn handle_key(state: &mut ConfigFormState, key: KeyCode) -> Option<ConfigFormAction> {
    match key {
        KeyCode::Esc => return Some(ConfigFormAction::Cancel),
        KeyCode::Enter => return Some(ConfigFormAction::Save(state.endpoint.clone())),
        KeyCode::Char(c) => {
            state.endpoint.push(c);
            state.error = None;
        }
        KeyCode::Backspace => {
            state.endpoint.pop();
            state.error = None;
        }
        _ => {}
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefilled_with_current_endpoint() {
        let state = ConfigFormState::new(Some("https://example.org"));
        assert_eq!(state.endpoint, "https://example.org");
        assert!(ConfigFormState::new(None).endpoint.is_empty());
    }

    #[test]
    fn typing_then_enter_submits_raw_input() {
        let mut state = ConfigFormState::new(None);
        for c in "http://x".chars() {
            assert!(handle_key(&mut state, KeyCode::Char(c)).is_none());
        }
        handle_key(&mut state, KeyCode::Backspace);

        match handle_key(&mut state, KeyCode::Enter) {
            Some(ConfigFormAction::Save(raw)) => assert_eq!(raw, "http://"),
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn editing_clears_previous_error() {
        let mut state = ConfigFormState::new(None);
        state.error = Some("bad url".into());
        handle_key(&mut state, KeyCode::Char('h'));
        assert!(state.error.is_none());
    }
}
