//! Checkout module.
//!
//! Contains order types, the order status state machine and the order
//! transaction engine.

mod engine;
mod order;
mod status;

pub use engine::{OrderService, MAX_ORDER_PAGE_SIZE};
pub use order::{
    generate_order_number, CustomerInfo, Order, OrderItem, OrderLine, OrderListQuery,
    OrderReceipt, PlaceOrder, ORDER_NUMBER_PREFIX,
};
pub use status::OrderStatus;

pub(crate) use order::build_items;
