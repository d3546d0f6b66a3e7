//! Process name lookup

use std::collections::HashMap;

/// Name stored when a pid cannot be resolved
pub const UNKNOWN_PNAME: &str = "???";

/// Maps a process id to a process name
pub trait PidResolver: Send {
    /// Look up the name of `pid`, `None` if it cannot be determined
    fn lookup(&mut self, pid: i32) -> Option<String>;
}

impl<F> PidResolver for F
where
    F: FnMut(i32) -> Option<String> + Send,
{
    fn lookup(&mut self, pid: i32) -> Option<String> {
        self(pid)
    }
}

/// Resolver that never knows a name
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl PidResolver for NoResolver {
    fn lookup(&mut self, _pid: i32) -> Option<String> {
        None
    }
}

/// Memoizing front for a [`PidResolver`]
///
/// Every pid is looked up at most once. Failed lookups are cached as
/// [`UNKNOWN_PNAME`] so a dead process does not cost a lookup per record.
pub struct PnameCache {
    names: HashMap<i32, String>,
    resolver: Box<dyn PidResolver>,
    lookups: u64,
}

impl PnameCache {
    pub fn new(resolver: impl PidResolver + 'static) -> Self {
        Self {
            names: HashMap::new(),
            resolver: Box::new(resolver),
            lookups: 0,
        }
    }

    /// Name for `pid`, resolving and caching it on first use
    pub fn resolve(&mut self, pid: i32) -> String {
        if let Some(name) = self.names.get(&pid) {
            return name.clone();
        }

        self.lookups += 1;
        let name = self
            .resolver
            .lookup(pid)
            .unwrap_or_else(|| UNKNOWN_PNAME.to_string());
        tracing::trace!(pid, pname = %name, "Resolved process name");
        self.names.insert(pid, name.clone());
        name
    }

    /// Forget every cached name
    pub fn clear(&mut self) {
        self.names.clear();
    }

    /// Number of pids currently cached
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of resolver calls made so far
    pub fn lookups(&self) -> u64 {
        self.lookups
    }
}

impl Default for PnameCache {
    fn default() -> Self {
        Self::new(NoResolver)
    }
}

impl std::fmt::Debug for PnameCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PnameCache")
            .field("cached", &self.names.len())
            .field("lookups", &self.lookups)
            .finish()
    }
}
