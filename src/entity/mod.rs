pub mod address;
pub mod approved_address;
pub mod barangay;
pub mod brand;
pub mod car_models;
pub mod cars;
pub mod category;
pub mod courier;
pub mod delivery;
pub mod delivery_history;
pub mod delivery_statuses;
pub mod municipality;
pub mod product;
pub mod product_car_compatibility;
pub mod province;
pub mod region;
pub mod sale;
pub mod sale_details;
pub mod supplier;
pub mod supply;
pub mod supply_details;
pub mod user_cart;
pub mod user_employee;

pub use address::Entity as Address;
pub use approved_address::Entity as ApprovedAddress;
pub use barangay::Entity as Barangay;
pub use brand::Entity as Brand;
pub use car_models::Entity as CarModels;
pub use cars::Entity as Cars;
pub use category::Entity as Category;
pub use courier::Entity as Courier;
pub use delivery::Entity as Delivery;
pub use delivery_history::Entity as DeliveryHistory;
pub use delivery_statuses::Entity as DeliveryStatuses;
pub use municipality::Entity as Municipality;
pub use product::Entity as Product;
pub use product_car_compatibility::Entity as ProductCarCompatibility;
pub use province::Entity as Province;
pub use region::Entity as Region;
pub use sale::Entity as Sale;
pub use sale_details::Entity as SaleDetails;
pub use supplier::Entity as Supplier;
pub use supply::Entity as Supply;
pub use supply_details::Entity as SupplyDetails;
pub use user_cart::Entity as UserCart;
pub use user_employee::Entity as UserEmployee;
