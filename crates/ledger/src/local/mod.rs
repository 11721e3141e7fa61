//! In-process stores with the same contracts as the remote ones.
//!
//! Records are kept per partition in a map indexed by sort key. Each
//! partition sits behind its own async mutex and every operation runs
//! entirely under that lock, so concurrent callers observe the same
//! all-or-nothing behavior the remote table guarantees.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use tokio::sync::Mutex;

mod categories;
mod expenses;

pub use categories::LocalCategoryStore;
pub use expenses::LocalExpenseStore;

type Partition<V> = Arc<Mutex<BTreeMap<String, V>>>;

#[derive(Debug)]
struct Partitions<V> {
    inner: Mutex<HashMap<String, Partition<V>>>,
}

impl<V> Default for Partitions<V> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> Partitions<V> {
    /// Handle on the partition `pk`, created empty on first use.
    async fn get(&self, pk: String) -> Partition<V> {
        let mut partitions = self.inner.lock().await;
        Arc::clone(partitions.entry(pk).or_default())
    }
}
