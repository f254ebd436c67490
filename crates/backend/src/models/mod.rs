pub mod admin_setting;
pub mod generation;
pub mod menu_photo;
pub mod organization;
pub mod profile;
pub mod style;
