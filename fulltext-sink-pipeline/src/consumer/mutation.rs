//! Key/value mutations.

use crate::consumer::log_record::LogRecord;

/// A single storage-level change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Put { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
    RemoveRange { start: Vec<u8>, end: Vec<u8> },
}

impl Mutation {
    /// Key the mutation applies to; the start key for range removes.
    pub fn key(&self) -> &[u8] {
        match self {
            Self::Put { key, .. } | Self::Remove { key } => key,
            Self::RemoveRange { start, .. } => start,
        }
    }
}

/// Mutations collected from one window of the log, in log order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationBatch {
    mutations: Vec<Mutation>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.mutations.push(Mutation::Put { key, value });
    }

    pub fn remove(&mut self, key: Vec<u8>) {
        self.mutations.push(Mutation::Remove { key });
    }

    /// Append every mutation carried by `record`.
    pub fn extend_from_record(&mut self, record: LogRecord) {
        self.mutations.extend(record.into_mutations());
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.mutations.iter()
    }
}

impl<'a> IntoIterator for &'a MutationBatch {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_order() {
        let mut batch = MutationBatch::new();
        batch.put(b"a".to_vec(), b"1".to_vec());
        batch.remove(b"a".to_vec());
        batch.extend_from_record(LogRecord::RemoveRange {
            start: b"b".to_vec(),
            end: b"c".to_vec(),
        });

        let keys: Vec<&[u8]> = batch.iter().map(Mutation::key).collect();
        assert_eq!(keys, vec![&b"a"[..], &b"a"[..], &b"b"[..]]);
        assert_eq!(batch.len(), 3);
    }
}
