mod footer;
mod header;
mod help;
mod tables;

pub use footer::render_footer;
pub use header::render_header;
pub use help::render_help;
pub use tables::{render_tables, render_waiting};
