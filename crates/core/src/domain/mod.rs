pub mod context;
pub mod conversation;
pub mod product;
pub mod qa;
pub mod response;
