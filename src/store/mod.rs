mod page;
mod record;
mod traits;

pub use page::*;
pub use record::*;
pub use traits::*;
