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
        addresses, analytics as analytics_dto, auth as auth_dto, cart as cart_dto, compatibility,
        couriers, orders as order_dto, products as product_dto, supplies as supply_dto, users,
    },
    error::ErrorBody,
    models,
    response::{ApiResponse, Meta},
    routes::{
        addresses as address_routes, admin, analytics, auth, cart, catalog, health, locations,
        orders, params, products, shipping, supplies, vehicles,
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
        health::readiness,
        auth::register,
        auth::login,
        auth::me,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::get_compatibility,
        products::set_compatibility,
        catalog::list_brands,
        catalog::create_brand,
        catalog::rename_brand,
        catalog::delete_brand,
        catalog::list_categories,
        catalog::create_category,
        catalog::rename_category,
        catalog::delete_category,
        vehicles::list_makes,
        vehicles::create_make,
        vehicles::list_models,
        vehicles::create_model,
        vehicles::products_for_model,
        locations::list_regions,
        locations::list_provinces,
        locations::list_municipalities,
        locations::list_barangays,
        address_routes::list_my_addresses,
        address_routes::create_address,
        address_routes::set_default_address,
        address_routes::delete_address,
        address_routes::list_approved,
        address_routes::create_approved,
        address_routes::deactivate_approved,
        shipping::list_couriers,
        shipping::shipping_quote,
        shipping::create_courier,
        shipping::update_courier,
        cart::cart_list,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        cart::clear_cart,
        cart::merge_cart,
        orders::list_orders,
        orders::checkout,
        orders::list_statuses,
        orders::get_order,
        orders::cancel_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::list_low_stock,
        admin::adjust_inventory,
        admin::list_products_admin,
        admin::get_product_admin,
        admin::list_users,
        admin::create_staff,
        admin::change_role,
        admin::set_active,
        supplies::list_suppliers,
        supplies::create_supplier,
        supplies::list_supplies,
        supplies::create_supply,
        supplies::get_supply,
        analytics::sales_summary,
        analytics::supply_summary,
        analytics::dashboard,
    ),
    components(
        schemas(
            models::Role,
            models::User,
            models::Brand,
            models::Category,
            models::Product,
            models::CarMake,
            models::CarModel,
            models::Compatibility,
            models::Location,
            models::Address,
            models::ApprovedAddress,
            models::Courier,
            models::DeliveryStatus,
            models::Order,
            models::SaleItem,
            models::Delivery,
            models::DeliveryHistoryEntry,
            models::Supplier,
            models::Supply,
            models::SupplyLine,
            auth_dto::RegisterRequest,
            auth_dto::LoginRequest,
            auth_dto::LoginResponse,
            product_dto::CreateProductRequest,
            product_dto::UpdateProductRequest,
            product_dto::ProductList,
            product_dto::ProductDetail,
            product_dto::NameRequest,
            product_dto::BrandList,
            product_dto::CategoryList,
            product_dto::InventoryAdjustRequest,
            compatibility::CreateMakeRequest,
            compatibility::CreateModelRequest,
            compatibility::CompatibilityEntry,
            compatibility::SetCompatibilityRequest,
            compatibility::MakeList,
            compatibility::ModelList,
            compatibility::CompatibilityList,
            addresses::CreateAddressRequest,
            addresses::CreateApprovedAddressRequest,
            addresses::LocationList,
            addresses::AddressList,
            addresses::ApprovedAddressList,
            couriers::CreateCourierRequest,
            couriers::UpdateCourierRequest,
            couriers::CourierList,
            couriers::CourierQuote,
            couriers::ShippingQuote,
            cart_dto::AddToCartRequest,
            cart_dto::UpdateCartItemRequest,
            cart_dto::MergeCartRequest,
            cart_dto::CartLine,
            cart_dto::CartSummary,
            cart_dto::SkippedLine,
            cart_dto::MergeResult,
            order_dto::PaymentMethod,
            order_dto::CheckoutRequest,
            order_dto::UpdateOrderStatusRequest,
            order_dto::CancelOrderRequest,
            order_dto::OrderDetail,
            order_dto::OrderList,
            order_dto::DeliveryStatusList,
            users::CreateStaffRequest,
            users::ChangeRoleRequest,
            users::SetActiveRequest,
            users::UserList,
            supply_dto::CreateSupplierRequest,
            supply_dto::NewSupplyProduct,
            supply_dto::SupplyLineRequest,
            supply_dto::CreateSupplyRequest,
            supply_dto::SupplierList,
            supply_dto::SupplyList,
            supply_dto::SupplyDetail,
            analytics_dto::DailySales,
            analytics_dto::TopProduct,
            analytics_dto::SalesSummary,
            analytics_dto::SupplierTotal,
            analytics_dto::SupplySummary,
            analytics_dto::DashboardCounts,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            params::UserListQuery,
            params::SupplyListQuery,
            params::LowStockQuery,
            params::DateRangeQuery,
            params::YearQuery,
            health::HealthData,
            ErrorBody,
            Meta,
            ApiResponse<models::Product>,
            ApiResponse<product_dto::ProductList>,
            ApiResponse<order_dto::OrderDetail>,
            ApiResponse<order_dto::OrderList>,
            ApiResponse<cart_dto::CartSummary>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Auth", description = "Registration, login and current account"),
        (name = "Products", description = "Parts catalog"),
        (name = "Catalog", description = "Brands and categories"),
        (name = "Vehicles", description = "Car makes, models and fitment"),
        (name = "Locations", description = "Region to barangay lookups"),
        (name = "Addresses", description = "Customer and approved pickup addresses"),
        (name = "Shipping", description = "Couriers and shipping quotes"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Admin", description = "Back office: orders, inventory, accounts"),
        (name = "Supplies", description = "Suppliers and stock receipts"),
        (name = "Analytics", description = "Sales and supply reports"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
