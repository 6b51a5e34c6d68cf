pub mod redis;
pub mod storage;

pub use self::redis::create_redis_store;
pub use self::redis::RedisStore;
pub use storage::{
    read_json, write_json, write_json_if_absent, KeyValueStore, MemoryStore, StorageKey,
};
