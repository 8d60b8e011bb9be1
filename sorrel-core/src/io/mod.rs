mod npy;
mod table;

pub use npy::write_numpy;

pub use table::numeric_column;
pub use table::read_table;
pub use table::write_table;
pub use table::write_table_pq;
