/// Business logic layer
///
/// Services own the request pipeline for each resource: authorization gates,
/// parent scoping, payload validation and the store call. Handlers only
/// translate between HTTP and these calls.
pub mod auth;
pub mod comments;
pub mod groups;
pub mod posts;
pub mod scope;

pub use auth::AuthService;
pub use comments::{CommentPayload, CommentService};
pub use groups::GroupService;
pub use posts::{PostPayload, PostService, UpdateMode};
pub use scope::PostScope;
