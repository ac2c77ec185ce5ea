mod inmem;
mod postgres;
mod traits;


pub use inmem::*;
pub use postgres::*;
pub use traits::*;
