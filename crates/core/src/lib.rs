//! # Gatehouse Core
//!
//! Domain types cho onboarding portal: trạng thái phê duyệt, hồ sơ người dùng,
//! catalog ứng dụng và quyền truy cập (grant).
//!
//! ## Approval state machine
//!
//! ```text
//!            approve
//!  PENDING ───────────▶ APPROVED
//!     │
//!     │ reject
//!     ▼
//!  REJECTED
//! ```
//!
//! Không có transition nào ra khỏi trạng thái terminal.

pub mod catalog;
pub mod error;
pub mod identity;
pub mod profile;
pub mod status;

pub use catalog::{CatalogEntry, Grant, NewCatalogEntry, UserApp, DEFAULT_CATEGORY};
pub use error::{CoreError, CoreResult};
pub use identity::{IdentityEvent, NewIdentity, USER_CREATED};
pub use profile::{ApprovalRequest, Role, UserProfile};
pub use status::{AccessStatus, Decision};
