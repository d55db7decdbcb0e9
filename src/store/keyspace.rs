//! The keyspace: an array of `dbnum` independent hash maps (spec.md ยง3).

use ahash::AHashMap;
use bytes::Bytes;
use rand::seq::IteratorRandom;

use super::value::ValueRef;

#[derive(Default)]
pub struct Database {
    pub map: AHashMap<Bytes, ValueRef>,
}

impl Database {
    pub fn get(&self, key: &[u8]) -> Option<&ValueRef> {
        self.map.get(key)
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<ValueRef> {
        self.map.remove(key)
    }

    pub fn set(&mut self, key: Bytes, value: ValueRef) {
        self.map.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Sample a key uniformly at random, or `None` if the database is empty.
    /// Used only by `RANDOMKEY`; the spec treats this as a primitive.
    pub fn random_key(&self) -> Option<&Bytes> {
        self.map.keys().choose(&mut rand::rng())
    }
}

pub struct Keyspace {
    pub databases: Vec<Database>,
}

impl Keyspace {
    pub fn new(dbnum: usize) -> Self {
        Keyspace {
            databases: (0..dbnum).map(|_| Database::default()).collect(),
        }
    }

    pub fn db(&self, index: usize) -> &Database {
        &self.databases[index]
    }

    pub fn db_mut(&mut self, index: usize) -> &mut Database {
        &mut self.databases[index]
    }

    pub fn dbnum(&self) -> usize {
        self.databases.len()
    }
}
