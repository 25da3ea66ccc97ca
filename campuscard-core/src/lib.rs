//! campuscard-core: transaction records, batch files and query ranges shared
//! by the fetcher and the analyzer.

pub mod batch;
pub mod range;
pub mod record;
pub mod time;

pub use batch::{latest_batch_file, load_batch, parse_batch, render_batch, save_batch};
pub use range::{output_file_name, QueryRange};
pub use record::CardTransaction;
