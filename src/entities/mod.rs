//! sea-orm entities, one module per table.

pub mod customer;
pub mod customer_address;
pub mod customer_product_interaction;
pub mod order;
pub mod order_item;
pub mod product;
pub mod product_category;
pub mod product_image;
pub mod product_rating;
pub mod product_statistics;
pub mod related_product;
pub mod user;
pub mod vendor;
pub mod wishlist_item;

pub use related_product::RelationKind;
