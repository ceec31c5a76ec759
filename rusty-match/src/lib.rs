pub mod table;
pub use table::*;

pub mod geometry;
pub use geometry::*;

pub mod segment;
pub use segment::*;

pub mod index;
pub use index::*;

pub mod aggregate;
pub mod conf;
pub mod engine;
pub mod error;
pub mod io;
pub mod partition;
pub mod plan;
pub mod score;
pub mod select;
pub mod summary;

pub use aggregate::*;
pub use conf::*;
pub use engine::*;
pub use error::*;
pub use partition::*;
pub use plan::*;
pub use score::*;
pub use select::*;
pub use summary::*;

pub type Id = u64;
