pub mod form;
pub mod names;
pub mod team;

pub use form::focus_advantage;
pub use team::qualify;
