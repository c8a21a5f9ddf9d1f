//! Assets module - instruments held in the portfolio.

mod assets_model;
mod assets_service;
mod assets_traits;

pub use assets_model::{Asset, AssetType, AssetUpdate, NewAsset, PriceMode, PriceStatus};
pub use assets_service::AssetService;
pub use assets_traits::{AssetRepositoryTrait, AssetServiceTrait};
