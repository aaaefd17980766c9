// ============================================
// Dispatch - Параллельный проход по срезам + append-буфер
// ============================================
//
// Каждая задача пишет в свой AppendBuffer, результаты склеиваются
// в порядке срезов: вывод не зависит от числа потоков.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Как раскладывать работу по вокселям
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dispatch {
    /// Всё на вызывающем потоке
    Sequential,
    /// Пул rayon, одна задача на срез
    Parallel,
}

impl Default for Dispatch {
    fn default() -> Self {
        Dispatch::Parallel
    }
}

impl Dispatch {
    /// Применить `f` к каждому срезу 0..count, результат в порядке срезов
    pub fn map_slices<R, F>(self, count: u32, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(u32) -> R + Sync + Send,
    {
        match self {
            Dispatch::Sequential => (0..count).map(f).collect(),
            Dispatch::Parallel => (0..count).into_par_iter().map(f).collect(),
        }
    }

    /// Одна задача на элемент (например, на чанк), порядок сохраняется
    pub fn map_items<T, R, F>(self, items: Vec<T>, f: F) -> Vec<R>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync + Send,
    {
        match self {
            Dispatch::Sequential => items.into_iter().map(f).collect(),
            Dispatch::Parallel => items.into_par_iter().map(f).collect(),
        }
    }
}

/// Буфер заранее известной ёмкости со счётчиком записанного.
/// Переполнение - ошибка конфигурации, а не повод обрезать вывод.
#[derive(Clone, Debug)]
pub struct AppendBuffer<T> {
    items: Vec<T>,
    capacity: usize,
}

impl<T> AppendBuffer<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { items: Vec::with_capacity(capacity), capacity }
    }

    #[inline]
    pub fn append(&mut self, item: T) {
        assert!(
            self.items.len() < self.capacity,
            "append buffer overflow: capacity {} exhausted", self.capacity
        );
        self.items.push(item);
    }

    /// Слить другой буфер (частичный вывод среза) в этот
    pub fn extend(&mut self, other: AppendBuffer<T>) {
        assert!(
            self.items.len() + other.items.len() <= self.capacity,
            "append buffer overflow: {} + {} exceeds capacity {}",
            self.items.len(), other.items.len(), self.capacity
        );
        self.items.extend(other.items);
    }

    /// Сколько записей реально произведено
    #[inline]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Забрать только записанные элементы
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_slices_keeps_order() {
        let seq = Dispatch::Sequential.map_slices(64, |i| i * 3);
        let par = Dispatch::Parallel.map_slices(64, |i| i * 3);
        assert_eq!(seq, par);
        assert_eq!(seq[10], 30);
    }

    #[test]
    fn test_map_items_keeps_order() {
        let words = vec!["a", "bb", "ccc"];
        assert_eq!(Dispatch::Parallel.map_items(words.clone(), |w| w.len()), vec![1, 2, 3]);
        assert_eq!(Dispatch::Sequential.map_items(words, |w| w.len()), vec![1, 2, 3]);
    }

    #[test]
    fn test_append_counts() {
        let mut buffer = AppendBuffer::with_capacity(4);
        buffer.append(1);
        buffer.append(2);
        assert_eq!(buffer.count(), 2);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.into_vec(), vec![1, 2]);
    }

    #[test]
    #[should_panic(expected = "append buffer overflow")]
    fn test_append_overflow_panics() {
        let mut buffer = AppendBuffer::with_capacity(1);
        buffer.append(1);
        buffer.append(2);
    }

    #[test]
    fn test_extend_merges_in_order() {
        let mut total = AppendBuffer::with_capacity(4);
        let mut part = AppendBuffer::with_capacity(2);
        part.append('b');
        part.append('c');
        total.append('a');
        total.extend(part);
        assert_eq!(total.as_slice(), &['a', 'b', 'c']);
    }

    #[test]
    #[should_panic(expected = "append buffer overflow")]
    fn test_extend_overflow_panics() {
        let mut total = AppendBuffer::with_capacity(1);
        let mut part = AppendBuffer::with_capacity(2);
        part.append(1);
        part.append(2);
        total.extend(part);
    }
}
