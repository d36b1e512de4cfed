//! Authentication: password crypto, the session token codec, and the
//! registration/login workflows.

pub mod confirmation;
pub mod crypto;
pub mod seed;
pub mod service;
pub mod token;

pub use crypto::{AuthCrypto, AuthCryptoError};
pub use seed::ensure_default_roles;
pub use service::{
    AuthError, AuthService, AuthenticatedUser, LoginResponse,
    RegistrationOutcome,
};
pub use token::{Claims, TokenCodec, TokenError, TOKEN_TTL_SECONDS};
