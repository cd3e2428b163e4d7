use serde_json::Value;

use crate::content::{ContentKind, Document};
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_backfill_updated_at", m002_backfill_updated_at),
    ]
}

/// 执行所有未应用的数据库迁移。
///
/// - 每个迁移必须幂等：迁移成功但版本号尚未写入时进程可能中断，重启后会重跑。
/// - 版本号在每个迁移成功后立即持久化。
/// - 仅向前，set_version 拒绝降级。
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().unwrap_or([0; 4]);
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// 早期导入的记录只有 createdAt，补齐 updatedAt
fn m002_backfill_updated_at(store: &Store) -> Result<(), StoreError> {
    for kind in ContentKind::ALL {
        let tree = store.content_tree(kind);
        for item in tree.iter() {
            let (key, raw) = item?;
            let mut doc: Document = Store::deserialize(&raw)?;
            if doc.contains_key("updatedAt") {
                continue;
            }
            let created_at = doc.get("createdAt").cloned().unwrap_or(Value::Null);
            doc.insert("updatedAt".to_string(), created_at);
            tree.insert(key, Store::serialize(&doc)?)?;
        }
    }
    Ok(())
}
