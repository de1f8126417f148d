use std::collections::HashMap;

use crate::{
    Error,
    Result,
};

/// A set of exclusively owned values addressed by integral handles, for
/// callers that can only hold an integer.
///
/// Handles start at 1 so that 0 can stand for "no handle", and are never
/// handed out twice. A removed handle stays invalid for the life of the
/// table.
#[derive(Debug)]
pub struct HandleTable<T> {
    values: HashMap<i64, T>,
    next: i64,
}

impl<T> HandleTable<T> {
    pub fn new() -> HandleTable<T> {
        HandleTable {
            values: HashMap::new(),
            next: 1,
        }
    }

    /// Adds a value and returns a new handle.
    pub fn insert(&mut self, value: T) -> i64 {
        let handle = self.next;
        self.next += 1;
        self.values.insert(handle, value);
        handle
    }

    /// Returns the value with the specified handle.
    pub fn get_mut(&mut self, handle: i64) -> Result<&mut T> {
        self.values.get_mut(&handle).ok_or(Error::Handle(handle))
    }

    /// Removes and returns the value with the specified handle. Removing a
    /// handle twice is an error.
    pub fn remove(&mut self, handle: i64) -> Result<T> {
        self.values.remove(&handle).ok_or(Error::Handle(handle))
    }

    /// Returns the number of live handles.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> HandleTable<T> {
        HandleTable::new()
    }
}
