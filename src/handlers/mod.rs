pub mod chunk;
pub mod field;
pub mod health;
pub mod performance;
pub mod status;

pub use chunk::get_field_chunk;
pub use field::{cancel_field, create_field};
pub use health::hello;
pub use performance::get_performance;
pub use status::get_field_status;
