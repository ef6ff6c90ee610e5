//! Session-scoped object id allocation.

use crate::shapes::ObjectId;
use uuid::Uuid;

/// Hands out `<prefix>-<n>` ids, monotonic within one editing session.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl IdGenerator {
    pub const DEFAULT_PREFIX: &'static str = "id";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Generator with a random prefix, for sessions the server did not name.
    pub fn session() -> Self {
        let uuid = Uuid::new_v4().simple().to_string();
        Self::new(&uuid[..8])
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Start a new session under `prefix`.
    pub fn restart(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
        self.next = 0;
        log::info!("Id generator restarted with prefix {:?}", self.prefix);
    }

    /// Next id for which `taken` is false.
    pub fn next_id(&mut self, taken: impl Fn(&str) -> bool) -> ObjectId {
        loop {
            let id = format!("{}-{}", self.prefix, self.next);
            self.next += 1;
            if !taken(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_ids() {
        let mut ids = IdGenerator::default();
        assert_eq!(ids.next_id(|_| false), "id-0");
        assert_eq!(ids.next_id(|_| false), "id-1");
    }

    #[test]
    fn test_skips_taken_ids() {
        let mut ids = IdGenerator::new("s");
        assert_eq!(ids.next_id(|id| id == "s-0" || id == "s-1"), "s-2");
    }

    #[test]
    fn test_restart_and_session() {
        let mut ids = IdGenerator::session();
        assert_eq!(ids.prefix().len(), 8);
        ids.next_id(|_| false);
        ids.restart("abc");
        assert_eq!(ids.next_id(|_| false), "abc-0");
    }
}
