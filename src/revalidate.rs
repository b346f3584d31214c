//! Path-scoped revalidation: after a mutation, views rendered from a path
//! are told their data is stale.

use std::collections::HashMap;
use std::sync::Mutex;

/// Path of the admin dashboard.
pub const ADMIN_PATH: &str = "/admin";

pub trait Revalidator: Send + Sync {
    fn revalidate(&self, path: &str);
}

/// Keeps a generation counter per path; a view compares the generation it
/// rendered with the current one to decide whether to refetch.
#[derive(Default)]
pub struct PathRevalidator {
    generations: Mutex<HashMap<String, u64>>,
}

impl PathRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self, path: &str) -> u64 {
        self.generations
            .lock()
            .map(|g| g.get(path).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Revalidator for PathRevalidator {
    fn revalidate(&self, path: &str) {
        match self.generations.lock() {
            Ok(mut generations) => {
                let generation = generations.entry(path.to_string()).or_insert(0);
                *generation += 1;
                tracing::debug!(path, generation = *generation, "Path revalidated");
            }
            Err(_) => tracing::warn!(path, "Revalidation skipped: lock poisoned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_are_per_path() {
        let r = PathRevalidator::new();
        assert_eq!(r.generation(ADMIN_PATH), 0);
        r.revalidate(ADMIN_PATH);
        r.revalidate(ADMIN_PATH);
        r.revalidate("/patients");
        assert_eq!(r.generation(ADMIN_PATH), 2);
        assert_eq!(r.generation("/patients"), 1);
    }
}
