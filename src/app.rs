use crossterm::event::KeyCode;
use tracing::{debug, error, info};
use tui::{backend::Backend, Frame};

use crate::config::{Settings, SettingsStore};
use crate::models::Project;
use crate::store::{LoadOutcome, PendingDelete, ProjectStore};
use crate::ui::components::status::Status;
use crate::ui::config_form::{self, ConfigFormAction, ConfigFormState, render_config_form};
use crate::ui::project_form::{self, ProjectFormAction, ProjectFormState, render_project_form};
use crate::ui::projects::{self, ProjectsAction, ProjectsState, render_projects};

// Represents the current screen in the app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Projects,
    ProjectForm,
    ConfigForm,
}

/// Work that talks to the remote. Produced by key handling, executed by the
/// main loop after the busy status has been drawn.
#[derive(Debug)]
pub enum Command {
    Load,
    Save { project: Project, is_new: bool },
    Delete(PendingDelete),
}

pub struct App {
    store: ProjectStore,
    settings_store: SettingsStore,
    screen: AppScreen,
    projects_state: ProjectsState,
    project_form_state: Option<ProjectFormState>,
    config_form_state: Option<ConfigFormState>,
    status: Status,
    should_quit: bool,
}

impl App {
    pub fn new(store: ProjectStore, settings_store: SettingsStore) -> Self {
        Self {
            store,
            settings_store,
            screen: AppScreen::Projects,
            projects_state: ProjectsState::new(),
            project_form_state: None,
            config_form_state: None,
            status: Status::Idle,
            should_quit: false,
        }
    }

    pub fn screen(&self) -> AppScreen {
        self.screen
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn project_form(&self) -> Option<&ProjectFormState> {
        self.project_form_state.as_ref()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Marks the app busy and returns the startup load.
    pub fn start(&mut self) -> Command {
        self.begin(Command::Load)
    }

    pub fn render<B: Backend>(&mut self, frame: &mut Frame<B>) {
        match self.screen {
            AppScreen::Projects => render_projects(
                frame,
                &mut self.projects_state,
                self.store.projects(),
                self.store.client().endpoint(),
                &self.status,
            ),
            AppScreen::ProjectForm => {
                if let Some(state) = &mut self.project_form_state {
                    render_project_form(frame, state, &self.status);
                }
            }
            AppScreen::ConfigForm => {
                if let Some(state) = &mut self.config_form_state {
                    render_config_form(frame, state, &self.status);
                }
            }
        }
    }

    /// Routes a key press to the current screen.
    ///
    /// Keys are ignored while a command is in flight so that a second
    /// mutation can never start before the first one settled.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<Command> {
        if self.status.is_busy() {
            return None;
        }

        match self.screen {
            AppScreen::Projects => self.handle_projects_key(key),
            AppScreen::ProjectForm => self.handle_project_form_key(key),
            AppScreen::ConfigForm => self.handle_config_form_key(key),
        }
    }

    fn handle_projects_key(&mut self, key: KeyCode) -> Option<Command> {
        let action = projects::handle_key(&mut self.projects_state, self.store.projects(), key)?;

        match action {
            ProjectsAction::Quit => {
                self.should_quit = true;
                None
            }
            ProjectsAction::NewProject => {
                self.project_form_state = Some(ProjectFormState::new());
                self.screen = AppScreen::ProjectForm;
                None
            }
            ProjectsAction::EditProject(id) => {
                if let Some(project) = self.store.get(&id) {
                    self.project_form_state =
                        Some(ProjectFormState::from_existing(project.clone()));
                    self.screen = AppScreen::ProjectForm;
                }
                None
            }
            ProjectsAction::RequestDelete(id) => {
                if let Some(pending) = self.store.request_delete(&id) {
                    self.projects_state.ask_delete(pending);
                }
                None
            }
            ProjectsAction::ConfirmDelete => self
                .projects_state
                .take_pending_delete()
                .map(|pending| self.begin(Command::Delete(pending))),
            ProjectsAction::Refresh => Some(self.begin(Command::Load)),
            ProjectsAction::Configure => {
                self.config_form_state = Some(ConfigFormState::new(self.store.client().endpoint()));
                self.screen = AppScreen::ConfigForm;
                None
            }
        }
    }

    fn handle_project_form_key(&mut self, key: KeyCode) -> Option<Command> {
        let state = self.project_form_state.as_mut()?;

        match project_form::handle_key(state, key)? {
            ProjectFormAction::Cancel => {
                self.close_project_form();
                None
            }
            ProjectFormAction::Save { project, is_new } => {
                // The form closes before the remote answers.
                self.close_project_form();
                Some(self.begin(Command::Save { project, is_new }))
            }
        }
    }

    fn handle_config_form_key(&mut self, key: KeyCode) -> Option<Command> {
        let state = self.config_form_state.as_mut()?;

        match config_form::handle_key(state, key)? {
            ConfigFormAction::Cancel => {
                self.config_form_state = None;
                self.screen = AppScreen::Projects;
                None
            }
            ConfigFormAction::Save(raw) => self.save_config(&raw),
        }
    }

    fn save_config(&mut self, raw: &str) -> Option<Command> {
        let endpoint = match Settings::parse_endpoint(raw) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                if let Some(state) = &mut self.config_form_state {
                    state.error = Some(err.to_string());
                }
                return None;
            }
        };

        let settings = Settings {
            endpoint: endpoint.clone(),
        };
        if let Err(err) = self.settings_store.save(&settings) {
            error!(error = %err, "could not persist settings");
            if let Some(state) = &mut self.config_form_state {
                state.error = Some(err.to_string());
            }
            return None;
        }

        self.store.set_endpoint(endpoint);
        self.config_form_state = None;
        self.screen = AppScreen::Projects;

        if self.store.client().is_local() {
            self.status = Status::Info("Local mode: projects stay on this machine".to_string());
            None
        } else {
            Some(self.begin(Command::Load))
        }
    }

    fn close_project_form(&mut self) {
        self.project_form_state = None;
        self.screen = AppScreen::Projects;
        self.projects_state.clamp(self.store.projects().len());
    }

    fn begin(&mut self, command: Command) -> Command {
        let message = match &command {
            Command::Load => "Loading projects...",
            Command::Save { is_new: true, .. } => "Creating project...",
            Command::Save { is_new: false, .. } => "Updating project...",
            Command::Delete(_) => "Deleting project...",
        };
        self.status = Status::Busy(message.to_string());
        command
    }

    /// Runs a command to completion and records its outcome.
    pub async fn execute(&mut self, command: Command) {
        self.status = match command {
            Command::Load => match self.store.load().await {
                Ok(LoadOutcome::LocalOnly) => Status::Idle,
                Ok(LoadOutcome::Replaced(count)) => {
                    Status::Info(format!("Loaded {count} project(s)"))
                }
                Err(err) => Status::Error(format!("{err} (press R to retry)")),
            },
            Command::Save { project, is_new } => {
                let subject = project.subject.clone();
                match self.store.save(project.clone(), is_new).await {
                    Ok(()) => {
                        if is_new {
                            let last = self.store.projects().len().checked_sub(1);
                            self.projects_state.select(last);
                        }
                        Status::Info(format!("Saved \"{subject}\""))
                    }
                    Err(err) => {
                        let message = err.to_string();
                        self.project_form_state =
                            Some(ProjectFormState::reopen(project, is_new, message.clone()));
                        self.screen = AppScreen::ProjectForm;
                        Status::Error(message)
                    }
                }
            }
            Command::Delete(pending) => {
                debug!(id = pending.id(), "confirmed delete");
                let subject = pending.subject().to_string();
                match self.store.delete(pending).await {
                    Ok(()) => Status::Info(format!("Deleted \"{subject}\"")),
                    Err(err) => Status::Error(format!("Could not delete \"{subject}\": {err}")),
                }
            }
        };

        if let Status::Info(msg) = &self.status {
            info!("{msg}");
        }
        self.projects_state.clamp(self.store.projects().len());
    }
}
