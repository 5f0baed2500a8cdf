pub mod certificate;
pub mod common;
pub mod layout;
pub mod recipient;

pub use certificate::*;
pub use common::*;
pub use layout::*;
pub use recipient::*;
