//! Hash-consing slot table.
//!
//! Values live in slots addressed by a stable index. [`Table::put`] returns
//! the index of an existing equal value if there is one, so every distinct
//! value is stored exactly once. Index 0 is a reserved sentry and is never
//! handed out, which lets chains use 0 as their terminator.

use std::cmp::min;
use std::ops::Index;

use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<T> {
    value: T,
    next: usize,
}

impl<T> Entry<T> {
    /// Create a new cell with the given value.
    pub fn new(value: T) -> Self {
        Self { value, next: 0 }
    }
}

impl<T> Entry<T> {
    /// Get the reference to the value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Get the index of the next cell.
    pub fn next(&self) -> usize {
        self.next
    }
    /// Set the index of the next cell.
    pub fn set_next(&mut self, next: usize) {
        self.next = next;
    }
}

pub struct Table<T> {
    data: Vec<Entry<T>>,

    buckets: Vec<usize>,
    bitmask: u64,

    /// Maximum number of cells, including the sentry.
    capacity: usize,
}

impl<T> Table<T>
where
    T: Default,
{
    /// Create a new table holding at most `2^bits - 1` values.
    ///
    /// Cells are allocated on demand; only the bucket array is sized up front.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Storage bits should be in the range 0..=31");

        let capacity = 1 << bits;
        let mut data = Vec::with_capacity(min(capacity, 1 << 10));
        data.push(Entry::new(T::default())); // 0th cell is the sentry.

        let buckets_bits = min(bits, 16);
        let buckets_size = 1 << buckets_bits;
        let buckets = vec![0; buckets_size];
        let bitmask = (buckets_size - 1) as u64;

        Self {
            data,
            buckets,
            bitmask,
            capacity,
        }
    }
}

impl<T> Table<T> {
    /// Get the capacity of the table.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Get the number of stored values.
    pub fn len(&self) -> usize {
        self.data.len() - 1
    }
    /// Check whether the table holds no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the reference to the value at the given index.
    pub fn value(&self, index: usize) -> &T {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].value()
    }

    /// Get the index of the next cell.
    pub fn next(&self, index: usize) -> usize {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].next()
    }
    /// Set the index of the next cell.
    fn set_next(&mut self, index: usize, next: usize) {
        assert_ne!(index, 0, "Index is 0");
        self.data[index].set_next(next);
    }

    /// Add a new value to the table and return its index.
    pub fn add(&mut self, value: T) -> usize {
        let index = self.data.len();
        if index >= self.capacity() {
            panic!("Storage is full");
        }
        self.data.push(Entry::new(value));
        index
    }

    /// Iterate over `(index, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &T)> + '_ {
        self.data.iter().enumerate().skip(1).map(|(i, e)| (i, e.value()))
    }
}

impl<T> Table<T>
where
    T: MyHash,
{
    fn bucket_index(&self, value: &T) -> usize {
        (value.hash() & self.bitmask) as usize
    }

    /// Find the index of a value equal to `value`, if it is stored.
    pub fn find(&self, value: &T) -> Option<usize>
    where
        T: Eq,
    {
        let mut index = self.buckets[self.bucket_index(value)];
        while index != 0 {
            if value == self.value(index) {
                return Some(index);
            }
            index = self.next(index);
        }
        None
    }

    /// Put a value into the table.
    ///
    /// Returns the index of the canonical copy and whether `value` was new.
    /// When an equal value is already stored, `value` is dropped.
    pub fn put(&mut self, value: T) -> (usize, bool)
    where
        T: Eq,
    {
        let bucket_index = self.bucket_index(&value);
        let mut index = self.buckets[bucket_index];

        if index == 0 {
            // Create new value and put it into the bucket.
            let i = self.add(value);
            self.buckets[bucket_index] = i;
            return (i, true);
        }

        loop {
            assert!(index > 0);

            if &value == self.value(index) {
                // The value already exists.
                return (index, false);
            }

            let next = self.next(index);

            if next == 0 {
                // Create new value and append it to the bucket.
                let i = self.add(value);
                self.set_next(index, i);
                return (i, true);
            } else {
                // Go to the next value in the bucket.
                index = next;
            }
        }
    }
}

impl<T> Index<usize> for Table<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        self.value(index)
    }
}
