pub mod diagnostics;
pub mod form_create;
pub mod form_delete;
pub mod form_get;
pub mod form_join;
pub mod form_list;
pub mod form_response;
pub mod health;

pub use diagnostics::*;
pub use form_create::*;
pub use form_delete::*;
pub use form_get::*;
pub use form_join::*;
pub use form_list::*;
pub use form_response::*;
pub use health::*;
