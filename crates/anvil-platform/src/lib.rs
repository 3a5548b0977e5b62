//! Anvil Platform
//!
//! Platform access primitives shared by every remote workflow:
//! - Service-principal credentials and the OAuth2 client-credentials
//!   token exchange (`TokenClient`)
//! - Workspace coordinates and the REST base URLs derived from them
//!   (`WorkspaceCoordinates`)

pub mod auth;
pub mod error;
pub mod workspace;

pub use auth::{AccessToken, ServicePrincipal, TokenClient};
pub use error::{AuthError, AuthResult};
pub use workspace::WorkspaceCoordinates;
