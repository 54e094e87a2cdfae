//! Services module
//!
//! Business logic services that coordinate between the controller and the
//! repository.

pub mod images;
pub mod notes;
pub mod packaging;
pub mod retention;
pub mod settings;

pub use images::ImagesService;
pub use notes::NotesService;
pub use packaging::PackagingService;
pub use retention::RetentionService;
pub use settings::SettingsService;
