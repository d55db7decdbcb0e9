//! The on-disk binary format (spec.md ยง4.6) and the owned, `Send` snapshot
//! of the keyspace used to serialize it off the reactor thread.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::SnapshotError;
use crate::store::{Keyspace, Value};

pub const MAGIC: &[u8] = b"REDIS0000";
pub const OP_SELECTDB: u8 = 0xFE;
pub const OP_EOF: u8 = 0xFF;
pub const TYPE_STRING: u8 = 0;
pub const TYPE_LIST: u8 = 1;
pub const TYPE_SET: u8 = 2;

/// A deep, owned copy of one value, detached from the `Rc<RefCell<_>>` the
/// live keyspace uses so it can cross to a `spawn_blocking` thread.
#[derive(Debug, Clone)]
pub enum OwnedValue {
    Str(Bytes),
    List(Vec<Bytes>),
    Set(Vec<Bytes>),
}

/// A point-in-time, `Send` copy of every database. Building one is the
/// application-level stand-in for fork's copy-on-write page sharing
/// (spec.md Design Notes, "Fork-as-snapshot", option (b)): `Bytes` clones
/// are refcounted and cheap, so the only real copying is of the per-key
/// container structure, taken once while still on the reactor thread.
pub struct OwnedSnapshot {
    pub databases: Vec<Vec<(Bytes, OwnedValue)>>,
}

pub fn snapshot_keyspace(keyspace: &Keyspace) -> OwnedSnapshot {
    let databases = keyspace
        .databases
        .iter()
        .map(|db| {
            db.map
                .iter()
                .map(|(key, value)| {
                    let owned = match &*value.borrow() {
                        Value::Str(s) => OwnedValue::Str(s.clone()),
                        Value::List(items) => OwnedValue::List(items.iter().cloned().collect()),
                        Value::Set(items) => OwnedValue::Set(items.iter().cloned().collect()),
                    };
                    (key.clone(), owned)
                })
                .collect()
        })
        .collect();
    OwnedSnapshot { databases }
}

pub fn serialize(snapshot: &OwnedSnapshot) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_slice(MAGIC);
    for (idx, db) in snapshot.databases.iter().enumerate() {
        if db.is_empty() {
            continue;
        }
        buf.put_u8(OP_SELECTDB);
        buf.put_u32(idx as u32);
        for (key, value) in db {
            match value {
                OwnedValue::Str(s) => {
                    buf.put_u8(TYPE_STRING);
                    put_sized(&mut buf, key);
                    put_sized(&mut buf, s);
                }
                OwnedValue::List(items) => {
                    buf.put_u8(TYPE_LIST);
                    put_sized(&mut buf, key);
                    buf.put_u32(items.len() as u32);
                    for item in items {
                        put_sized(&mut buf, item);
                    }
                }
                OwnedValue::Set(items) => {
                    buf.put_u8(TYPE_SET);
                    put_sized(&mut buf, key);
                    buf.put_u32(items.len() as u32);
                    for item in items {
                        put_sized(&mut buf, item);
                    }
                }
            }
        }
    }
    buf.put_u8(OP_EOF);
    buf.to_vec()
}

fn put_sized(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}

/// Load a snapshot file into `keyspace`. Absence of the file is not an
/// error (spec.md ยง4.6 "Load"); any other failure (bad magic, short read,
/// duplicate key, out-of-range db index) is fatal to the caller.
pub fn load(data: &[u8], keyspace: &mut Keyspace) -> Result<(), SnapshotError> {
    let mut cur = data;
    let magic = read_exact(&mut cur, MAGIC.len())?;
    if magic != MAGIC {
        return Err(SnapshotError::BadMagic);
    }

    let mut db_index = 0usize;
    loop {
        let opcode = read_u8(&mut cur)?;
        match opcode {
            OP_EOF => break,
            OP_SELECTDB => {
                let idx = read_u32(&mut cur)?;
                if idx as usize >= keyspace.dbnum() {
                    return Err(SnapshotError::DbIndexOverflow(idx));
                }
                db_index = idx as usize;
            }
            TYPE_STRING => {
                let key = read_sized(&mut cur)?;
                let value = Value::Str(read_sized(&mut cur)?);
                insert_unique(keyspace, db_index, key, value)?;
            }
            TYPE_LIST => {
                let key = read_sized(&mut cur)?;
                let count = read_u32(&mut cur)?;
                let mut items = std::collections::VecDeque::with_capacity(count as usize);
                for _ in 0..count {
                    items.push_back(read_sized(&mut cur)?);
                }
                insert_unique(keyspace, db_index, key, Value::List(items))?;
            }
            TYPE_SET => {
                let key = read_sized(&mut cur)?;
                let count = read_u32(&mut cur)?;
                let mut items = ahash::AHashSet::with_capacity(count as usize);
                for _ in 0..count {
                    items.insert(read_sized(&mut cur)?);
                }
                insert_unique(keyspace, db_index, key, Value::Set(items))?;
            }
            other => return Err(SnapshotError::UnknownTypeTag(other)),
        }
    }
    Ok(())
}

fn insert_unique(
    keyspace: &mut Keyspace,
    db_index: usize,
    key: Bytes,
    value: Value,
) -> Result<(), SnapshotError> {
    let db = keyspace.db_mut(db_index);
    if db.map.contains_key(&key) {
        return Err(SnapshotError::DuplicateKey { db: db_index });
    }
    db.set(key, value.into_ref());
    Ok(())
}

fn read_u8(cur: &mut &[u8]) -> Result<u8, SnapshotError> {
    if cur.is_empty() {
        return Err(SnapshotError::ShortRead { want: 1, got: 0 });
    }
    let b = cur[0];
    *cur = &cur[1..];
    Ok(b)
}

fn read_u32(cur: &mut &[u8]) -> Result<u32, SnapshotError> {
    if cur.len() < 4 {
        return Err(SnapshotError::ShortRead { want: 4, got: cur.len() });
    }
    let mut arr = [0u8; 4];
    arr.copy_from_slice(&cur[..4]);
    *cur = &cur[4..];
    Ok(u32::from_be_bytes(arr))
}

fn read_exact<'a>(cur: &mut &'a [u8], len: usize) -> Result<&'a [u8], SnapshotError> {
    if cur.len() < len {
        return Err(SnapshotError::ShortRead { want: len, got: cur.len() });
    }
    let (head, tail) = cur.split_at(len);
    *cur = tail;
    Ok(head)
}

fn read_sized(cur: &mut &[u8]) -> Result<Bytes, SnapshotError> {
    let len = read_u32(cur)? as usize;
    let bytes = read_exact(cur, len)?;
    Ok(Bytes::copy_from_slice(bytes))
}
