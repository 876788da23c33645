use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{Project, ProjectType, Stats};
use crate::store::PendingDelete;
use crate::ui::components::popup::render_popup;
use crate::ui::components::status::{render_status, Status};

// Represents the state of the project table screen
pub struct ProjectsState {
    table_state: TableState,
    pending_delete: Option<PendingDelete>,
}

impl ProjectsState {
    pub fn new() -> Self {
        Self {
            table_state: TableState::default(),
            pending_delete: None,
        }
    }

    pub fn next(&mut self, len: usize) {
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self, len: usize) {
        if len == 0 {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    /// Keeps the selection inside a collection that may have shrunk or grown.
    pub fn clamp(&mut self, len: usize) {
        let selected = match (len, self.table_state.selected()) {
            (0, _) => None,
            (_, None) => Some(0),
            (len, Some(i)) => Some(i.min(len - 1)),
        };
        self.table_state.select(selected);
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.table_state.select(index);
    }

    pub fn selected(&self) -> Option<usize> {
        self.table_state.selected()
    }

    pub fn selected_project<'a>(&self, projects: &'a [Project]) -> Option<&'a Project> {
        self.selected().and_then(|i| projects.get(i))
    }

    pub fn ask_delete(&mut self, pending: PendingDelete) {
        self.pending_delete = Some(pending);
    }

    pub fn take_pending_delete(&mut self) -> Option<PendingDelete> {
        self.pending_delete.take()
    }

    pub fn is_confirming_delete(&self) -> bool {
        self.pending_delete.is_some()
    }
}

impl Default for ProjectsState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectsAction {
    Quit,
    NewProject,
    EditProject(String),
    RequestDelete(String),
    ConfirmDelete,
    Refresh,
    Configure,
}

pub fn render_projects<B: Backend>(
    frame: &mut Frame<B>,
    state: &mut ProjectsState,
    projects: &[Project],
    endpoint: Option<&str>,
    status: &Status,
) {
    let size = frame.size();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    render_stats(frame, &Stats::from_projects(projects), endpoint, chunks[0]);

    let header_cells = ["Subject", "Lead", "Type", "Team", "Quality", "Notes"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells)
        .style(Style::default())
        .height(1)
        .bottom_margin(1);

    let rows = projects.iter().map(|project| {
        let kind_style = match project.kind {
            ProjectType::Incertain => Style::default().fg(Color::Gray),
            _ => Style::default().fg(Color::Cyan),
        };
        Row::new(vec![
            Cell::from(project.subject.as_str()),
            Cell::from(project.lead.as_str()),
            Cell::from(project.kind.label()).style(kind_style),
            Cell::from(project.team.as_str()),
            Cell::from(project.quality.label()),
            Cell::from(first_line(&project.notes)),
        ])
        .height(1)
    });

    let title = if projects.is_empty() {
        "Projects (none yet, press N to add one)".to_string()
    } else {
        format!("Projects ({})", projects.len())
    };
    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .widths(&[
            Constraint::Percentage(25),
            Constraint::Percentage(15),
            Constraint::Percentage(10),
            Constraint::Percentage(15),
            Constraint::Percentage(10),
            Constraint::Percentage(25),
        ]);

    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    render_status(frame, status, chunks[2]);

    let buttons_text = if state.selected_project(projects).is_some() {
        "<N> New | <E> Edit | <D> Delete | <R> Refresh | <C> Configure | <Q> Quit"
    } else {
        "<N> New | <R> Refresh | <C> Configure | <Q> Quit"
    };
    let buttons = Paragraph::new(buttons_text)
        .block(Block::default().borders(Borders::TOP))
        .style(Style::default().fg(Color::White));
    frame.render_widget(buttons, chunks[3]);

    if let Some(pending) = &state.pending_delete {
        render_popup(
            frame,
            "Confirm Delete",
            vec![
                Spans::from(""),
                Spans::from(format!("Delete project \"{}\"?", pending.subject())),
                Spans::from(""),
                Spans::from("<Y> Yes  <N> No"),
            ],
            size,
        );
    }
}

fn render_stats<B: Backend>(
    frame: &mut Frame<B>,
    stats: &Stats,
    endpoint: Option<&str>,
    area: tui::layout::Rect,
) {
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);

    let line = Spans::from(vec![
        Span::styled("Total ", label),
        Span::styled(stats.total.to_string(), value),
        Span::styled("   CIR potential ", label),
        Span::styled(stats.cir_potential.to_string(), value),
        Span::styled("   CII potential ", label),
        Span::styled(stats.cii_potential.to_string(), value),
        Span::styled("   Well documented ", label),
        Span::styled(stats.well_documented.to_string(), value),
    ]);

    let mode = match endpoint {
        Some(url) => format!("R&D Projects - synced with {url}"),
        None => "R&D Projects - local mode".to_string(),
    };
    let stats_widget =
        Paragraph::new(line).block(Block::default().title(mode).borders(Borders::ALL));
    frame.render_widget(stats_widget, area);
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

pub fn handle_key(
    state: &mut ProjectsState,
    projects: &[Project],
    key: KeyCode,
) -> Option<ProjectsAction> {
    if state.is_confirming_delete() {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => return Some(ProjectsAction::ConfirmDelete),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.pending_delete = None;
            }
            _ => {}
        }
        return None;
    }

    match key {
        KeyCode::Char('q') | KeyCode::Esc => Some(ProjectsAction::Quit),
        KeyCode::Char('n') => Some(ProjectsAction::NewProject),
        KeyCode::Char('e') | KeyCode::Enter => state
            .selected_project(projects)
            .map(|p| ProjectsAction::EditProject(p.id.clone())),
        KeyCode::Char('d') => state
            .selected_project(projects)
            .map(|p| ProjectsAction::RequestDelete(p.id.clone())),
        KeyCode::Char('r') => Some(ProjectsAction::Refresh),
        KeyCode::Char('c') => Some(ProjectsAction::Configure),
        KeyCode::Down => {
            state.next(projects.len());
            None
        }
        KeyCode::Up => {
            state.previous(projects.len());
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ProjectStore;
    use crate::sync::SyncClient;

    fn projects() -> Vec<Project> {
        ["a", "b", "c"]
            .iter()
            .map(|id| {
                let mut project = Project::with_id(*id);
                project.subject = id.to_uppercase();
                project
            })
            .collect()
    }

    #[test]
    fn selection_wraps_around() {
        let projects = projects();
        let mut state = ProjectsState::new();
        state.clamp(projects.len());
        assert_eq!(state.selected(), Some(0));

        handle_key(&mut state, &projects, KeyCode::Up);
        assert_eq!(state.selected(), Some(2));
        handle_key(&mut state, &projects, KeyCode::Down);
        assert_eq!(state.selected(), Some(0));
    }

    #[test]
    fn clamp_follows_collection_size() {
        let mut state = ProjectsState::new();
        state.select(Some(5));
        state.clamp(2);
        assert_eq!(state.selected(), Some(1));
        state.clamp(0);
        assert_eq!(state.selected(), None);
    }

    #[test]
    fn edit_and_delete_need_a_selection() {
        let mut state = ProjectsState::new();
        assert_eq!(handle_key(&mut state, &[], KeyCode::Char('e')), None);
        assert_eq!(handle_key(&mut state, &[], KeyCode::Char('d')), None);

        let projects = projects();
        state.clamp(projects.len());
        handle_key(&mut state, &projects, KeyCode::Down);
        assert_eq!(
            handle_key(&mut state, &projects, KeyCode::Char('d')),
            Some(ProjectsAction::RequestDelete("b".into()))
        );
        assert_eq!(
            handle_key(&mut state, &projects, KeyCode::Enter),
            Some(ProjectsAction::EditProject("b".into()))
        );
    }

    #[tokio::test]
    async fn delete_popup_swallows_other_keys() {
        let mut store = ProjectStore::new(SyncClient::new(None));
        for project in projects() {
            store.save(project, true).await.unwrap();
        }
        let mut state = ProjectsState::new();
        state.ask_delete(store.request_delete("a").unwrap());

        assert_eq!(handle_key(&mut state, store.projects(), KeyCode::Char('q')), None);
        assert!(state.is_confirming_delete());

        assert_eq!(handle_key(&mut state, store.projects(), KeyCode::Char('n')), None);
        assert!(!state.is_confirming_delete());
        assert_eq!(store.projects().len(), 3);

        state.ask_delete(store.request_delete("a").unwrap());
        assert_eq!(
            handle_key(&mut state, store.projects(), KeyCode::Char('y')),
            Some(ProjectsAction::ConfirmDelete)
        );
    }
}
