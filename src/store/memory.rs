//! In-memory store for development and testing.
//!
//! Uses `DashMap` for concurrent access without external locks. Data is
//! lost on restart and not shared across processes; use the PostgREST
//! backend for production.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{AccessRole, Document, FileRecord, Store, StoreError, Team};

pub struct MemoryStore {
    teams: DashMap<(String, String), Team>,
    user_groups: DashMap<String, Vec<String>>,
    user_roles: DashMap<String, AccessRole>,
    documents: DashMap<String, Document>,
    document_groups: DashMap<String, Vec<String>>,
    files: DashMap<String, FileRecord>,
    next_team_id: AtomicUsize,
    calls: AtomicUsize,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            teams: DashMap::new(),
            user_groups: DashMap::new(),
            user_roles: DashMap::new(),
            documents: DashMap::new(),
            document_groups: DashMap::new(),
            files: DashMap::new(),
            next_team_id: AtomicUsize::new(1),
            calls: AtomicUsize::new(0),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate an outage: while unavailable every call fails with
    /// `StoreError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of `Store` calls served (including failed ones).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn insert_document(&self, document: Document, access_groups: &[&str]) {
        self.document_groups.insert(
            document.id.clone(),
            access_groups.iter().map(|g| g.to_string()).collect(),
        );
        self.documents.insert(document.id.clone(), document);
    }

    pub fn insert_file(&self, file: FileRecord) {
        self.files.insert(file.id.clone(), file);
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable)
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    async fn list_team_names(&self) -> Result<Vec<String>, StoreError> {
        self.enter()?;
        Ok(self.teams.iter().map(|e| e.value().name.clone()).collect())
    }

    async fn find_team(&self, name: &str, organization_id: &str) -> Result<Option<Team>, StoreError> {
        self.enter()?;
        Ok(self
            .teams
            .get(&(name.to_string(), organization_id.to_string()))
            .map(|e| e.value().clone()))
    }

    async fn upsert_team(&self, name: &str, organization_id: &str) -> Result<Team, StoreError> {
        self.enter()?;
        let entry = self
            .teams
            .entry((name.to_string(), organization_id.to_string()))
            .or_insert_with(|| Team {
                id: format!(
                    "team-{}",
                    self.next_team_id.fetch_add(1, Ordering::SeqCst)
                ),
                name: name.to_string(),
                parent_organization_id: Some(organization_id.to_string()),
            });
        Ok(entry.value().clone())
    }

    async fn user_group_names(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        self.enter()?;
        Ok(self
            .user_groups
            .get(user_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn add_user_group(&self, user_id: &str, group_name: &str) -> Result<(), StoreError> {
        self.enter()?;
        let mut groups = self.user_groups.entry(user_id.to_string()).or_default();
        if !groups.iter().any(|g| g == group_name) {
            groups.push(group_name.to_string());
        }
        Ok(())
    }

    async fn user_role(&self, user_id: &str) -> Result<Option<AccessRole>, StoreError> {
        self.enter()?;
        Ok(self.user_roles.get(user_id).map(|e| *e.value()))
    }

    async fn set_user_role(&self, user_id: &str, role: AccessRole) -> Result<(), StoreError> {
        self.enter()?;
        self.user_roles.insert(user_id.to_string(), role);
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        self.enter()?;
        Ok(self.documents.get(document_id).map(|e| e.value().clone()))
    }

    async fn document_access_groups(&self, document_id: &str) -> Result<Vec<String>, StoreError> {
        self.enter()?;
        Ok(self
            .document_groups
            .get(document_id)
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn get_file(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        self.enter()?;
        Ok(self.files.get(file_id).map(|e| e.value().clone()))
    }
}
