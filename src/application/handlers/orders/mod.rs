//! Order handlers: customer queries, cancellation, vendor fulfilment.

mod cancel_order;
mod get_order;
mod list_customer_orders;
mod list_vendor_items;
mod update_item_status;

pub use cancel_order::{CancelOrderCommand, CancelOrderHandler};
pub use get_order::{GetOrderHandler, GetOrderQuery};
pub use list_customer_orders::{
    CustomerOrdersView, ListCustomerOrdersHandler, OrdersSummary,
};
pub use list_vendor_items::{ListVendorItemsHandler, VendorItemsSummary, VendorItemsView};
pub use update_item_status::{
    UpdateItemStatusCommand, UpdateItemStatusHandler, UpdateItemStatusResult,
};
