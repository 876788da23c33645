//! Optimistic project collection.
//!
//! Every mutation is applied locally first, then pushed to the remote. If the
//! remote write fails the collection is restored to the exact value it had
//! before the mutation.

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Project, Stats};
use crate::sync::{SyncClient, SyncError, WriteRequest};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("a project needs a subject")]
    EmptySubject,
    #[error("project {0} already exists")]
    DuplicateId(String),
    #[error("no project with id {0}")]
    UnknownId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No endpoint configured, collection left as is
    LocalOnly,
    /// Collection replaced by the remote contents
    Replaced(usize),
}

/// A delete the user has been asked to confirm.
///
/// Only [`ProjectStore::delete`] consumes it; dropping it cancels the delete.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a delete only happens once the pending delete is confirmed"]
pub struct PendingDelete {
    id: String,
    subject: String,
}

impl PendingDelete {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

pub struct ProjectStore {
    projects: Vec<Project>,
    client: SyncClient,
}

impl ProjectStore {
    pub fn new(client: SyncClient) -> Self {
        Self {
            projects: Vec::new(),
            client,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_projects(&self.projects)
    }

    pub fn client(&self) -> &SyncClient {
        &self.client
    }

    pub fn set_endpoint(&mut self, endpoint: Option<String>) {
        self.client.set_endpoint(endpoint);
    }

    /// Replaces the collection with the remote contents.
    ///
    /// On failure the current collection is kept.
    pub async fn load(&mut self) -> Result<LoadOutcome, StoreError> {
        match self.client.fetch_all().await {
            Ok(None) => Ok(LoadOutcome::LocalOnly),
            Ok(Some(projects)) => {
                let count = projects.len();
                self.projects = projects;
                info!(count, "projects loaded");
                Ok(LoadOutcome::Replaced(count))
            }
            Err(err) => {
                warn!(error = %err, "load failed, keeping local collection");
                Err(err.into())
            }
        }
    }

    /// Inserts a new project or replaces an existing one by id.
    pub async fn save(&mut self, project: Project, is_new: bool) -> Result<(), StoreError> {
        if !project.has_subject() {
            return Err(StoreError::EmptySubject);
        }

        let exists = self.get(&project.id).is_some();
        if is_new && exists {
            return Err(StoreError::DuplicateId(project.id));
        }
        if !is_new && !exists {
            return Err(StoreError::UnknownId(project.id));
        }

        let request = if is_new {
            WriteRequest::Create {
                data: project.clone(),
            }
        } else {
            WriteRequest::Update {
                data: project.clone(),
            }
        };

        self.optimistic(
            move |projects| {
                if is_new {
                    projects.push(project);
                } else if let Some(slot) = projects.iter_mut().find(|p| p.id == project.id) {
                    *slot = project;
                }
            },
            request,
        )
        .await
    }

    /// First step of a delete. No state changes until the returned value is
    /// passed to [`ProjectStore::delete`].
    pub fn request_delete(&self, id: &str) -> Option<PendingDelete> {
        self.get(id).map(|project| PendingDelete {
            id: project.id.clone(),
            subject: project.subject.clone(),
        })
    }

    pub async fn delete(&mut self, pending: PendingDelete) -> Result<(), StoreError> {
        let PendingDelete { id, .. } = pending;
        if self.get(&id).is_none() {
            return Err(StoreError::UnknownId(id));
        }

        let request = WriteRequest::Delete { id: id.clone() };
        self.optimistic(move |projects| projects.retain(|p| p.id != id), request)
            .await
    }

    // Snapshot, mutate, push; restore the snapshot if the push fails.
    async fn optimistic<F>(&mut self, mutate: F, request: WriteRequest) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Vec<Project>),
    {
        let snapshot = self.projects.clone();
        mutate(&mut self.projects);

        match self.client.write(&request).await {
            Ok(()) => {
                info!(action = request.action(), "write settled");
                Ok(())
            }
            Err(err) => {
                warn!(action = request.action(), error = %err, "write failed, rolling back");
                self.projects = snapshot;
                Err(err.into())
            }
        }
    }
}
