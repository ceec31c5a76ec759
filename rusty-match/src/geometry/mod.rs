mod clip;
pub use clip::*;
mod measure;
pub use measure::*;
mod merge;
pub use merge::*;

pub type Meter = f64;
pub type Degrees = f64;
