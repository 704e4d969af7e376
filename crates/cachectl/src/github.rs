//! Simulated GitHub star counts

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{json, Value};

/// Stars gained per fetch at or above which a repository counts as growing fast
pub const FAST_GROWTH: u64 = 100;

const DEFAULT_STARS: u64 = 19;

/// Repository name -> (stars, growth per fetch)
pub struct StarSource {
    repos: Mutex<HashMap<String, (u64, u64)>>,
    requests: Mutex<u64>,
}

impl StarSource {
    /// Source seeded with a few well-known repositories
    pub fn new() -> Self {
        let mut repos = HashMap::new();
        repos.insert("rails/rails".to_string(), (55_000, 120));
        repos.insert("rust-lang/rust".to_string(), (98_000, 40));
        repos.insert("cacheable/cacheable".to_string(), (DEFAULT_STARS, 1));
        Self {
            repos: Mutex::new(repos),
            requests: Mutex::new(0),
        }
    }

    /// Current star count; every request lets the repository grow
    pub fn fetch(&self, repo: &str) -> Value {
        println!("Fetching data from GitHub for {}", repo);
        *self.requests.lock() += 1;

        let mut repos = self.repos.lock();
        let entry = repos.entry(repo.to_string()).or_insert((DEFAULT_STARS, 1));
        let stars = entry.0;
        entry.0 += entry.1;

        json!({ "repo": repo, "stars": stars, "fetched_at": Utc::now().to_rfc3339() })
    }

    /// Stars gained per fetch; unknown repositories grow by one
    pub fn growth(&self, repo: &str) -> u64 {
        self.repos.lock().get(repo).map(|(_, growth)| *growth).unwrap_or(1)
    }

    /// Requests that reached the simulated API
    pub fn requests(&self) -> u64 {
        *self.requests.lock()
    }
}

impl Default for StarSource {
    fn default() -> Self {
        Self::new()
    }
}
