pub mod path;
pub mod selector;

pub use path::FieldPath;
pub use selector::{select, Location, NodePointer, Step};
