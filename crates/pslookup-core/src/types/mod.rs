mod element;
pub mod event;
mod identifier;
pub mod namespace;
mod registration;

pub use element::*;
pub use event::MessageKind;
pub use identifier::*;
pub use namespace::Namespace;
pub use registration::*;
