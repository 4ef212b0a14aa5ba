use parking_lot::RwLock;
use std::collections::BTreeSet;

/// Symbols starred from the dashboard. Read on every merge, written rarely.
#[derive(Default)]
pub struct Watchlist {
    starred: RwLock<BTreeSet<String>>,
}

impl Watchlist {
    pub fn is_starred(&self, symbol: &str) -> bool {
        self.starred.read().contains(symbol)
    }

    /// Returns `true` if the symbol was newly starred.
    pub fn star(&self, symbol: &str) -> bool {
        self.starred.write().insert(symbol.to_string())
    }

    /// Returns `true` if the symbol was starred before.
    pub fn unstar(&self, symbol: &str) -> bool {
        self.starred.write().remove(symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.starred.read().iter().cloned().collect()
    }

    pub fn replace(&self, symbols: impl IntoIterator<Item = String>) {
        *self.starred.write() = symbols.into_iter().collect();
    }
}
