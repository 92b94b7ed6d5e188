pub mod addresses;
pub mod audit_logs;
pub mod cart_items;
pub mod carts;
pub mod categories;
pub mod enums;
pub mod inventories;
pub mod inventory_history;
pub mod order_items;
pub mod orders;
pub mod product_details;
pub mod product_images;
pub mod product_promotions;
pub mod product_sub_categories;
pub mod products;
pub mod promotions;
pub mod sub_categories;
pub mod users;
pub mod wishlist_items;
pub mod wishlists;

pub use addresses::Entity as Addresses;
pub use audit_logs::Entity as AuditLogs;
pub use cart_items::Entity as CartItems;
pub use carts::Entity as Carts;
pub use categories::Entity as Categories;
pub use inventories::Entity as Inventories;
pub use inventory_history::Entity as InventoryHistory;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_details::Entity as ProductDetails;
pub use product_images::Entity as ProductImages;
pub use product_promotions::Entity as ProductPromotions;
pub use product_sub_categories::Entity as ProductSubCategories;
pub use products::Entity as Products;
pub use promotions::Entity as Promotions;
pub use sub_categories::Entity as SubCategories;
pub use users::Entity as Users;
pub use wishlist_items::Entity as WishlistItems;
pub use wishlists::Entity as Wishlists;
