//! Database models.

pub mod candidate;
pub mod channel;
pub mod decision;
pub mod rule;
pub mod upload;

pub use candidate::*;
pub use channel::*;
pub use decision::*;
pub use rule::*;
pub use upload::*;
