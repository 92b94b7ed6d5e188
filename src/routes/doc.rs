use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    catalog::ProductStatus,
    dto::{
        addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
        auth::{
            ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
            ResetPasswordRequest,
        },
        cart::{AddToCartRequest, UpdateQuantityRequest, ValidateCartRequest},
        categories::{
            CategoryList, CreateCategoryRequest, CreateSubCategoryRequest, SubCategoryList,
            UpdateCategoryRequest, UpdateSubCategoryRequest,
        },
        orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderRequest},
        products::{
            AdjustStockRequest, ApplyPromotionRequest, CreateProductRequest,
            InventoryHistoryList, ProductList, StockLevelList, UpdateProductRequest,
            UpdateStockRequest,
        },
        promotions::{CreatePromotionRequest, PromotionList, UpdatePromotionRequest},
        users::{UpdatePasswordRequest, UpdateProfileRequest},
        wishlist::AddWishlistItemRequest,
    },
    entity::enums::{
        OrderStatus, PaymentStatus, PromotionScope, PromotionType, ShippingStatus,
    },
    models::{
        Address, Cart, CartLine, Category, InventoryEntry, Order, OrderItem, Product,
        ProductDetails, ProductImage, Promotion, StockLevel, SubCategory, User, Wishlist,
        WishlistItem,
    },
    response::{ApiResponse, Meta},
    routes::{
        addresses, auth, cart, categories, health, orders, params, products, promotions, users,
        wishlist,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::logout,
        auth::forgot_password,
        auth::reset_password,
        users::get_profile,
        users::update_profile,
        users::delete_account,
        users::update_password,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::search_products,
        products::new_arrivals,
        products::active_promotions,
        products::recommendations,
        products::low_stock,
        products::update_stock,
        products::adjust_stock,
        products::stock_history,
        products::apply_promotion,
        products::remove_promotion,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        categories::list_sub_categories,
        categories::create_sub_category,
        categories::update_sub_category,
        categories::delete_sub_category,
        categories::category_products,
        promotions::list_promotions,
        promotions::get_promotion,
        promotions::create_promotion,
        promotions::update_promotion,
        promotions::delete_promotion,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::empty_cart,
        cart::validate_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
        wishlist::get_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        addresses::list_addresses,
        addresses::create_address,
        addresses::update_address,
        addresses::delete_address
    ),
    components(
        schemas(
            User,
            Category,
            SubCategory,
            Promotion,
            Product,
            ProductDetails,
            ProductImage,
            ProductStatus,
            InventoryEntry,
            StockLevel,
            Cart,
            CartLine,
            Order,
            OrderItem,
            Wishlist,
            WishlistItem,
            Address,
            OrderStatus,
            PaymentStatus,
            ShippingStatus,
            PromotionType,
            PromotionScope,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            UpdateProfileRequest,
            UpdatePasswordRequest,
            CreateProductRequest,
            UpdateProductRequest,
            UpdateStockRequest,
            AdjustStockRequest,
            ApplyPromotionRequest,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CreateSubCategoryRequest,
            UpdateSubCategoryRequest,
            CreatePromotionRequest,
            UpdatePromotionRequest,
            AddToCartRequest,
            UpdateQuantityRequest,
            ValidateCartRequest,
            CreateOrderRequest,
            UpdateOrderRequest,
            AddWishlistItemRequest,
            CreateAddressRequest,
            UpdateAddressRequest,
            ProductList,
            CategoryList,
            SubCategoryList,
            PromotionList,
            InventoryHistoryList,
            StockLevelList,
            OrderList,
            OrderWithItems,
            AddressList,
            params::Pagination,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and password reset"),
        (name = "Users", description = "Profile of the current user"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Inventory", description = "Stock ledger endpoints"),
        (name = "Categories", description = "Category and sub-category endpoints"),
        (name = "Promotions", description = "Promotion endpoints"),
        (name = "Cart", description = "Cart and checkout endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Wishlist", description = "Wishlist endpoints"),
        (name = "Addresses", description = "Shipping address endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
