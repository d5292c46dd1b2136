pub mod config_service;
pub mod golf_data_repository;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::golf_data_repository::{InMemoryGolfDataRepository, JsonGolfDataRepository};
pub use crate::paths::CaddiePaths;
