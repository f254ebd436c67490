//! Typed access to each backend table.
//!
//! Repositories are zero-sized namespaces whose functions take the
//! [`BackendClient`](crate::BackendClient) to act with, so the caller
//! decides whether a call runs as the signed-in user or the service role.

pub mod admin_settings_repo;
pub mod generation_repo;
pub mod menu_photo_repo;
pub mod organization_repo;
pub mod profile_repo;
pub mod style_repo;

pub use admin_settings_repo::AdminSettingsRepo;
pub use generation_repo::GenerationRepo;
pub use menu_photo_repo::MenuPhotoRepo;
pub use organization_repo::OrganizationRepo;
pub use profile_repo::ProfileRepo;
pub use style_repo::StyleRepo;
