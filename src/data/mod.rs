pub mod driver;
pub mod parser;
pub mod quantity;

pub use driver::{DriverInterpolation, DriverSeries};
pub use parser::{read_drivers, read_drivers_from, write_result, write_result_to};
pub use quantity::QuantityMap;
