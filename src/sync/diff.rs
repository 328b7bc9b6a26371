use crate::locales::LocaleMapping;
use crate::messages::Message;

/// Messages whose key has no translation yet, in canonical order.
pub fn diff_keys<'a>(messages: &'a [Message], existing: &LocaleMapping) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|message| !existing.contains_key(&message.key))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a, T> {
    /// 1-based position among `total` batches.
    pub number: usize,
    pub total: usize,
    pub items: &'a [T],
}

pub fn batch_count(len: usize, batch_size: usize) -> usize {
    len.div_ceil(batch_size.max(1))
}

/// Splits `items` into contiguous chunks of at most `batch_size`.
pub fn batches<T>(items: &[T], batch_size: usize) -> impl Iterator<Item = Batch<'_, T>> {
    let size = batch_size.max(1);
    let total = batch_count(items.len(), size);
    items
        .chunks(size)
        .enumerate()
        .map(move |(index, items)| Batch {
            number: index + 1,
            total,
            items,
        })
}
