mod context;
pub use context::{AuthenticatedUser, RequestContext, UserRole};

mod error;
pub use error::{ErrorResponse, WebError, WebResult};

mod extract;
pub use extract::ValidJson;

pub mod dto;
pub mod middlewares;

mod state;
pub use state::AppState;

pub mod routes;
pub mod validate;

pub mod doc;
