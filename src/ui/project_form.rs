use crossterm::event::KeyCode;
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::models::Project;
use crate::ui::components::status::{render_status, Status};

pub enum ProjectFormAction {
    Cancel,
    Save { project: Project, is_new: bool },
}

#[derive(Clone, PartialEq, Eq, Copy, Debug)]
pub enum ProjectField {
    Subject,
    Lead,
    Type,
    Team,
    Quality,
    Notes,
}

impl ProjectField {
    const ALL: [ProjectField; 6] = [
        ProjectField::Subject,
        ProjectField::Lead,
        ProjectField::Type,
        ProjectField::Team,
        ProjectField::Quality,
        ProjectField::Notes,
    ];

    fn label(self) -> &'static str {
        match self {
            ProjectField::Subject => "Subject",
            ProjectField::Lead => "Lead",
            ProjectField::Type => "Type",
            ProjectField::Team => "Team",
            ProjectField::Quality => "Documentation",
            ProjectField::Notes => "Notes",
        }
    }

    fn is_choice(self) -> bool {
        matches!(self, ProjectField::Type | ProjectField::Quality)
    }
}

pub struct ProjectFormState {
    pub project: Project,
    pub is_new: bool,
    pub current_field: ProjectField,
    pub editing: bool,
    pub error: Option<String>,
}

impl ProjectFormState {
    /// Blank form; the identifier is fixed now, before anything is saved.
    pub fn new() -> Self {
        Self::open(Project::draft(), true)
    }

    pub fn from_existing(project: Project) -> Self {
        Self::open(project, false)
    }

    /// Reopens a form after its save was rolled back, keeping what was typed.
    pub fn reopen(project: Project, is_new: bool, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::open(project, is_new)
        }
    }

    fn open(project: Project, is_new: bool) -> Self {
        Self {
            project,
            is_new,
            current_field: ProjectField::Subject,
            editing: false,
            error: None,
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = !self.editing;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Subject => ProjectField::Lead,
            ProjectField::Lead => ProjectField::Type,
            ProjectField::Type => ProjectField::Team,
            ProjectField::Team => ProjectField::Quality,
            ProjectField::Quality => ProjectField::Notes,
            ProjectField::Notes => ProjectField::Subject,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            ProjectField::Subject => ProjectField::Notes,
            ProjectField::Lead => ProjectField::Subject,
            ProjectField::Type => ProjectField::Lead,
            ProjectField::Team => ProjectField::Type,
            ProjectField::Quality => ProjectField::Team,
            ProjectField::Notes => ProjectField::Quality,
        };
    }

    fn text_field_mut(&mut self) -> Option<&mut String> {
        match self.current_field {
            ProjectField::Subject => Some(&mut self.project.subject),
            ProjectField::Lead => Some(&mut self.project.lead),
            ProjectField::Team => Some(&mut self.project.team),
            ProjectField::Notes => Some(&mut self.project.notes),
            ProjectField::Type | ProjectField::Quality => None,
        }
    }

    pub fn edit_current_field(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        if let Some(field_value) = self.text_field_mut() {
            match key {
                KeyCode::Char(c) => {
                    field_value.push(c);
                }
                KeyCode::Backspace => {
                    field_value.pop();
                }
                _ => {}
            }
        }
    }

    pub fn cycle_choice(&mut self, forward: bool) {
        match self.current_field {
            ProjectField::Type => {
                let kind = self.project.kind;
                self.project.kind = if forward { kind.next() } else { kind.previous() };
            }
            ProjectField::Quality => {
                let quality = self.project.quality;
                self.project.quality = if forward { quality.next() } else { quality.previous() };
            }
            _ => {}
        }
    }

    pub fn is_valid(&self) -> bool {
        self.project.has_subject()
    }

    fn field_value(&self, field: ProjectField) -> String {
        match field {
            ProjectField::Subject => self.project.subject.clone(),
            ProjectField::Lead => self.project.lead.clone(),
            ProjectField::Type => format!("< {} >", self.project.kind.label()),
            ProjectField::Team => self.project.team.clone(),
            ProjectField::Quality => format!("< {} >", self.project.quality.label()),
            ProjectField::Notes => self.project.notes.clone(),
        }
    }
}

impl Default for ProjectFormState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_project_form<B: Backend>(
    f: &mut Frame<B>,
    state: &mut ProjectFormState,
    status: &Status,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(1),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.is_new {
        "New R&D Project"
    } else {
        "Edit R&D Project"
    };
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_form(f, state, chunks[1]);

    // Validation errors take precedence over the app-wide status.
    match &state.error {
        Some(error) => render_status(f, &Status::Error(error.clone()), chunks[2]),
        None => render_status(f, status, chunks[2]),
    }

    let help_text = if state.editing {
        "Enter - Done | Esc - Done"
    } else if state.current_field.is_choice() {
        "Left/Right - Change value | Up/Down - Navigate fields | S - Save | Esc - Cancel"
    } else {
        "Enter - Edit field | Up/Down - Navigate fields | S - Save | Esc - Cancel"
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn render_form<B: Backend>(f: &mut Frame<B>, state: &mut ProjectFormState, area: Rect) {
    let items: Vec<ListItem> = ProjectField::ALL
        .iter()
        .map(|&field| {
            let value = state.field_value(field);
            let is_current = field == state.current_field;
            let required = if field == ProjectField::Subject { " *" } else { "" };

            let content = if is_current && state.editing {
                Spans::from(vec![
                    Span::styled(
                        format!("{}{}: ", field.label(), required),
                        Style::default().fg(Color::Yellow),
                    ),
                    Span::styled(
                        format!("{value}|"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                let style = if is_current {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Spans::from(vec![
                    Span::styled(format!("{}{}: ", field.label(), required), style),
                    Span::raw(value),
                ])
            };

            ListItem::new(content)
        })
        .collect();

    let form_list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Project {}", state.project.id)),
    );

    f.render_widget(form_list, area);
}

pub fn handle_key(state: &mut ProjectFormState, key: KeyCode) -> Option<ProjectFormAction> {
    match key {
        KeyCode::Esc => {
            if state.editing {
                state.toggle_editing();
            } else {
                return Some(ProjectFormAction::Cancel);
            }
        }
        KeyCode::Enter => {
            if state.current_field.is_choice() {
                state.cycle_choice(true);
            } else {
                state.toggle_editing();
            }
        }
        KeyCode::Up if !state.editing => {
            state.previous_field();
        }
        KeyCode::Down | KeyCode::Tab if !state.editing => {
            state.next_field();
        }
        KeyCode::Left if !state.editing => {
            state.cycle_choice(false);
        }
        KeyCode::Right if !state.editing => {
            state.cycle_choice(true);
        }
        KeyCode::Char('s') if !state.editing => {
            if state.is_valid() {
                return Some(ProjectFormAction::Save {
                    project: state.project.clone(),
                    is_new: state.is_new,
                });
            }
            state.error = Some("Subject is required".to_string());
            state.current_field = ProjectField::Subject;
        }
        _ if state.editing => {
            state.edit_current_field(key);
            state.error = None;
        }
        _ => {}
    }

    None
}
