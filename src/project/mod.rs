pub mod paths;
pub mod scanner;
pub mod tree;

pub use scanner::{ScannedFile, Scanner};
pub use tree::ProjectTree;
