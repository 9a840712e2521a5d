//! Reading monthly series from disk.

mod csv_loader;

pub use csv_loader::{load_csv, load_reader, LoaderConfig};
