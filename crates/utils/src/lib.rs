pub mod api;
pub mod jwt;
pub mod response;
pub mod sentry;
