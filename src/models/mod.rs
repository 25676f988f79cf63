pub mod job;
pub mod pagination;
pub mod parallel;
pub mod params;
pub mod text;

pub use job::*;
pub use pagination::*;
pub use parallel::*;
pub use params::*;
pub use text::*;
