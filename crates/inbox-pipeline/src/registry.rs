//! Growable set of known projects shared by every note in a batch

use inbox_processor::match_known_project;
use std::sync::{Arc, PoisonError, RwLock};

/// Known projects, seeded from configuration and grown as routing
/// discovers new ones
///
/// Cloning shares the underlying set.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    projects: Arc<RwLock<Vec<String>>>,
}

impl ProjectRegistry {
    /// Create a registry seeded with `projects`
    ///
    /// Blank names and names matching an earlier one are skipped.
    pub fn new<I, S>(projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Self::default();
        for project in projects {
            registry.record(&project.into());
        }
        registry
    }

    /// Copy of the current project list, in insertion order
    pub fn snapshot(&self) -> Vec<String> {
        self.projects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Add `project` unless an equivalent name is already known
    ///
    /// Returns `true` when the project was inserted. The check and the insert
    /// happen under one write lock, so two notes discovering the same project
    /// concurrently insert it once.
    ///
    /// # Examples
    ///
    /// ```
    /// use inbox_pipeline::ProjectRegistry;
    ///
    /// let registry = ProjectRegistry::new(["Home"]);
    /// assert!(registry.record("Garden"));
    /// assert!(!registry.record("garden"));
    /// assert_eq!(registry.snapshot(), vec!["Home", "Garden"]);
    /// ```
    pub fn record(&self, project: &str) -> bool {
        let name = project.trim();
        if name.is_empty() {
            return false;
        }

        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        if match_known_project(name, &projects).is_some() {
            return false;
        }
        projects.push(name.to_string());
        true
    }

    /// Whether an equivalent name is known
    pub fn contains(&self, project: &str) -> bool {
        let projects = self.projects.read().unwrap_or_else(PoisonError::into_inner);
        match_known_project(project, &projects).is_some()
    }

    /// Number of known projects
    pub fn len(&self) -> usize {
        self.projects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no project is known yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
