//! A single-bucket, blind put/get/delete backend.
//!
//! Stands in for the external `boltdb`/`leveldb`/`rocksdb` tags — each of
//! those is, at the shape this simulator exercises them, one bucket with
//! blind byte-string puts and gets (see
//! `examples/original_source/kvdb/boltdb.go`: `tx.Bucket("cache").Put/Get`).
//! `index` is advisory here, unlike [`super::iodb::IoDb`]: content-addressed
//! stores like this one don't need it to locate a value.

use std::collections::HashMap;

use crate::error::KvError;
use crate::kv::KvStore;

#[derive(Debug, Default)]
pub struct SimpleKv {
    bucket: HashMap<String, Vec<u8>>,
}

impl SimpleKv {
    pub fn new() -> Self {
        SimpleKv::default()
    }
}

impl KvStore for SimpleKv {
    fn put(&mut self, key: &str, value: &[u8], _index: u64) -> Result<(), KvError> {
        self.bucket.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&mut self, key: &str, _index: u64) -> Result<Vec<u8>, KvError> {
        self.bucket.get(key).cloned().ok_or(KvError::NotFound)
    }

    fn delete(&mut self, key: &str, _index: u64) -> Result<(), KvError> {
        self.bucket.remove(key);
        Ok(())
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let mut kv = SimpleKv::new();
        kv.put("a", b"payload", 0).unwrap();
        assert_eq!(kv.get("a", 0).unwrap(), b"payload");
    }

    #[test]
    fn get_missing_key_is_not_found() {
        let mut kv = SimpleKv::new();
        assert!(matches!(kv.get("missing", 0), Err(KvError::NotFound)));
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let mut kv = SimpleKv::new();
        kv.put("a", b"x", 0).unwrap();
        kv.delete("a", 0).unwrap();
        assert!(matches!(kv.get("a", 0), Err(KvError::NotFound)));
    }
}
