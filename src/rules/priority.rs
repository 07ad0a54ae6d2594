use chrono::Utc;

use crate::error::{Error, Result};
use crate::store::Repository;
use crate::types::{Priority, RepositoryPriority};

pub struct PriorityTable<'r, R: ?Sized> {
    repo: &'r R,
}

impl<'r, R: Repository + ?Sized> PriorityTable<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Repositories without a row are `Priority::Default`.
    pub fn priority_of(&self, repository: &str) -> Result<Priority> {
        Ok(self
            .repo
            .get_repository_priority(repository)?
            .map(|row| row.priority)
            .unwrap_or_default())
    }

    pub fn set(&self, repository: &str, priority: Priority) -> Result<RepositoryPriority> {
        if repository.trim().is_empty() {
            return Err(Error::InvalidName("repository cannot be empty".to_string()));
        }

        let row = RepositoryPriority {
            repository: repository.to_string(),
            priority,
            updated_at: Utc::now(),
        };
        self.repo.upsert_repository_priority(&row)?;
        Ok(row)
    }

    /// Repositories explicitly set to `priority`. Repositories that are
    /// default only by absence are not listed.
    pub fn repositories_with(&self, priority: Priority) -> Result<Vec<String>> {
        Ok(self
            .repo
            .list_repository_priorities(priority)?
            .into_iter()
            .map(|row| row.repository)
            .collect())
    }
}
