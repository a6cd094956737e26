//! Per-user connection quota tracking (component G).
//!
//! Grounded on `switchboard.rs`'s direct `DashMap` usage: one concurrent map
//! guards all counters, no outer mutex needed.

use dashmap::DashMap;

/// Tracks how many of a user's quota slots are currently in use.
///
/// Every login starts with `default_quota` available slots; a successful
/// lookup (see `AuthService::get_user`) decrements it, `notify_logout`
/// returns it. The map only ever holds entries for users seen at least
/// once, to avoid growing unbounded for logins that never connect.
#[derive(Debug)]
pub struct AvailableConnections {
    default_quota: u32,
    remaining: DashMap<String, u32>,
}

impl AvailableConnections {
    /// Builds a tracker with the given default quota per user (§6: 100).
    pub fn new(default_quota: u32) -> AvailableConnections {
        AvailableConnections { default_quota, remaining: DashMap::new() }
    }

    /// Attempts to claim one slot for `login`. Returns `true` and
    /// decrements the counter if one was available, `false` (no mutation)
    /// if the user's quota is already exhausted.
    pub fn try_acquire(&self, login: &str) -> bool {
        let mut entry = self.remaining.entry(login.to_string()).or_insert(self.default_quota);
        if *entry == 0 {
            return false;
        }
        *entry -= 1;
        true
    }

    /// Releases one slot for `login`, capped at the configured default so
    /// a stray double-release cannot grant more than the starting quota.
    pub fn release(&self, login: &str) {
        let mut entry = self.remaining.entry(login.to_string()).or_insert(self.default_quota);
        if *entry < self.default_quota {
            *entry += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausts_then_releases() {
        let conns = AvailableConnections::new(1);
        assert!(conns.try_acquire("alice"));
        assert!(!conns.try_acquire("alice"));
        conns.release("alice");
        assert!(conns.try_acquire("alice"));
    }
}
