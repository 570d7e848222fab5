//! cache memoizes `parse_file` results by canonical path and modification
//! time.

use crate::ast::StatementList;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

struct Entry {
    mtime: SystemTime,
    statements: StatementList,
}

lazy_static! {
    static ref CACHE: Mutex<HashMap<PathBuf, Entry>> = Mutex::new(HashMap::new());
}

/// get returns the cached StatementList for `path` if present and still
/// fresh against `mtime`, cloning it out of the cache.
pub fn get(path: &PathBuf, mtime: SystemTime) -> Option<StatementList> {
    let cache = CACHE.lock().unwrap();
    let entry = cache.get(path)?;
    if entry.mtime == mtime {
        Some(entry.statements.clone())
    } else {
        None
    }
}

/// put stores a fresh parse result for `path`, replacing any stale entry.
pub fn put(path: PathBuf, mtime: SystemTime, statements: StatementList) {
    let mut cache = CACHE.lock().unwrap();
    cache.insert(path, Entry { mtime, statements });
}

/// clear drops every cached entry. Exposed for tests that need a clean
/// process-wide cache between cases.
#[cfg(test)]
pub fn clear() {
    CACHE.lock().unwrap().clear();
}

#[test]
fn test_miss_then_hit_then_invalidate_on_mtime_change() {
    clear();
    let path = PathBuf::from("/tmp/does-not-exist.mk");
    let t0 = SystemTime::UNIX_EPOCH;
    assert!(get(&path, t0).is_none());

    put(path.clone(), t0, vec![]);
    assert!(get(&path, t0).is_some());

    let t1 = t0 + std::time::Duration::from_secs(1);
    assert!(get(&path, t1).is_none());
}
