use crate::function::Function;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

type Registry = FxHashMap<&'static str, Arc<dyn Function>>;

static REG: Lazy<RwLock<Registry>> = Lazy::new(|| {
    let mut map = Registry::default();
    for f in crate::builtins::all() {
        insert(&mut map, f);
    }
    RwLock::new(map)
});

fn insert(map: &mut Registry, f: Arc<dyn Function>) {
    for &alias in f.aliases() {
        map.insert(alias, Arc::clone(&f));
    }
    map.insert(f.name(), f);
}

/// Add (or replace) a function under its name and aliases.
pub fn register(f: Arc<dyn Function>) {
    let mut map = REG.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    insert(&mut map, f);
}

pub fn get(name: &str) -> Option<Arc<dyn Function>> {
    let map = REG.read().unwrap_or_else(|poisoned| poisoned.into_inner());
    map.get(name).map(Arc::clone)
}

pub fn contains(name: &str) -> bool {
    get(name).is_some()
}
