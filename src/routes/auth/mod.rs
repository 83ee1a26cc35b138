mod handler;
mod model;

pub use handler::{login, logout, refresh, session, signup};
pub use model::{
    Account, AuthResponse, LoginRequest, RefreshTokenResponse, SignupRequest, validate_username,
};
