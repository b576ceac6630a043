pub mod apply;
pub mod destroy;
pub mod import;
pub mod lookup;
pub mod plan;
pub mod refresh;
pub mod show;
