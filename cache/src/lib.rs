pub mod device;
pub mod error;
pub mod memory_store;
pub mod rate_limit;
pub mod redis_store;
pub mod store;
pub mod tokens;

pub use device::DeviceCheck;
pub use error::{StoreError, StoreResult};
pub use memory_store::MemoryStore;
pub use rate_limit::{RateDecision, RateLimitPolicy};
pub use redis_store::{RedisConfig, RedisStore};
pub use store::EphemeralStore;
pub use tokens::{CooldownState, ScanLock, SessionSnapshot, TokenManager, TokenSettings};
