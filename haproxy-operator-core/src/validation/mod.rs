mod origin;
mod range;
mod report;

pub use origin::Origin;
pub use range::*;
pub use report::*;
