//! Authentication: password hashing, session tokens and the extractor for the calling
//! [`crate::api::models::users::CurrentUser`].
//!
//! Users log in with `POST /user/login` using their employee ID and password. On success a
//! signed JWT is returned in the body and set as an HTTP-only session cookie. Handlers that
//! need the caller take a [`crate::api::models::users::CurrentUser`] argument, which reads
//! the cookie or an `Authorization: Bearer` header.
//!
//! - [`password`]: Argon2id hashing and verification
//! - [`session`]: JWT claims, token creation and verification, cookie strings
//! - [`current_user`]: the axum extractor

pub mod current_user;
pub mod password;
pub mod session;
