//! Client for the file-transfer REST API.
//!
//! Every authenticated call takes an explicit [`Session`]. A session is
//! created by [`FileTransferClient::login`], read by each call, and cleared
//! on logout or as soon as the backend answers 401.

pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use client::FileTransferClient;
pub use error::ClientError;
pub use session::Session;
pub use types::{DepartmentFiles, FileListQuery, SigninResponse};
