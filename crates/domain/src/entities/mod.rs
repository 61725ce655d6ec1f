pub mod pool_key;
pub mod pool_range;
pub mod position;
pub mod yield_record;

// Re-export for easier access
pub use pool_key::PoolKey;
pub use pool_range::PoolRange;
pub use position::Position;
pub use yield_record::YieldRecord;
