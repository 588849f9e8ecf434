use std::sync::Arc;

/// Materialized rows of a loaded relation.
///
/// A frozen buffer may have been handed out through [`RecordBuffer::share`];
/// mutating it copies the rows first and leaves the buffer frozen.
#[derive(Clone, Debug)]
pub struct RecordBuffer<T> {
    records: Arc<Vec<T>>,
    frozen: bool,
}

impl<T> Default for RecordBuffer<T> {
    fn default() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            frozen: false,
        }
    }
}

impl<T> RecordBuffer<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self {
            records: Arc::new(records),
            frozen: false,
        }
    }

    pub fn frozen(records: Vec<T>) -> Self {
        Self {
            records: Arc::new(records),
            frozen: true,
        }
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn as_slice(&self) -> &[T] {
        self.records.as_slice()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.records.get(index)
    }

    /// Read-only snapshot of the current rows.
    pub fn share(&self) -> Arc<Vec<T>> {
        Arc::clone(&self.records)
    }
}

impl<T: Clone> RecordBuffer<T> {
    /// Remove and return the record at `index`, if there is one.
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.records.len() {
            return None;
        }
        if self.frozen {
            let mut working = self.records.as_ref().clone();
            let removed = working.remove(index);
            self.records = Arc::new(working);
            return Some(removed);
        }
        Some(Arc::make_mut(&mut self.records).remove(index))
    }

    pub fn into_vec(self) -> Vec<T> {
        Arc::try_unwrap(self.records).unwrap_or_else(|shared| shared.as_ref().clone())
    }
}

impl<T> From<Vec<T>> for RecordBuffer<T> {
    fn from(records: Vec<T>) -> Self {
        Self::new(records)
    }
}
