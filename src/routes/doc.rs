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
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, CartLine, CartList},
        history::{LoginHistoryList, RecordLoginRequest},
        orders::{CheckoutResponse, OrderList, OrderWithItems, UpdateOrderStatusRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        profile::UpdateProfileRequest,
    },
    models::{CartItem, LoginRecord, Order, OrderItem, OrderStatus, Product, Profile, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, health, history, orders, params, products, profile},
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
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        orders::delete_order,
        orders::pay_order,
        profile::get_profile,
        profile::update_profile,
        history::record_login,
        history::list_history
    ),
    components(
        schemas(
            User,
            Profile,
            Product,
            CartItem,
            Order,
            OrderItem,
            OrderStatus,
            LoginRecord,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            AddToCartRequest,
            CartLine,
            CartList,
            CheckoutResponse,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            UpdateProfileRequest,
            RecordLoginRequest,
            LoginHistoryList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartList>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<CheckoutResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Product catalog endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order lifecycle endpoints"),
        (name = "Profile", description = "Profile endpoints"),
        (name = "History", description = "Login history endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
