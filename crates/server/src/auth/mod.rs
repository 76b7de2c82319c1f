mod callback;
mod error;
mod logout;
mod middleware;
mod provider;
mod session;

pub use callback::{LoginCallbackService, LoginOutcome};
pub use error::AuthError;
pub use logout::LogoutRedirect;
pub use middleware::{AuthGuard, RequestContext, require_identity};
pub use provider::{Identity, IdentityProviderClient, SessionTokens, USER_AGENT};
pub use session::{CookieDirective, SessionCodec, SetCookies};
