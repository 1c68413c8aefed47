// Asset bulk operations
pub mod bulk_assets;
