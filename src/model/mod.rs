pub mod descriptor;
pub mod linker;
pub mod options;

pub use descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor};
pub use linker::LinkedFile;
