mod walk;

pub use walk::{build_file_record_map, dir_key};
