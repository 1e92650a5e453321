pub mod api;
pub mod composer;
pub mod config;
pub mod error;
pub mod templates;

pub use api::{router, AppState, ServiceComposer};
pub use composer::Composer;
pub use config::ServiceConfig;
pub use error::{ComposerError, ComposerResult};
pub use templates::TemplateRenderer;
