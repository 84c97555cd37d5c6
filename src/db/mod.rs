pub mod executor;
pub mod pool;

pub use executor::PgExecutor;
pub use pool::create_pool;
