//! Holders module - account owners and their stored credentials.

mod holders_model;
mod holders_traits;

pub use holders_model::Holder;
pub use holders_traits::HolderRepositoryTrait;
