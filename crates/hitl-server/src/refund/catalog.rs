//! Fixed demo order catalog and the canonical refund reasons.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Order {
    pub order_id: &'static str,
    pub customer_name: &'static str,
    pub product_name: &'static str,
    pub order_amount: f64,
    pub order_status: &'static str,
    pub order_time: &'static str,
    pub shipping_address: &'static str,
    pub tracking_status: &'static str,
    pub estimated_delivery: &'static str,
}

pub static ORDERS: [Order; 5] = [
    Order {
        order_id: "ORD20260101001",
        customer_name: "Zhang Xiaoming",
        product_name: "Wireless Bluetooth Earbuds",
        order_amount: 299.00,
        order_status: "shipped",
        order_time: "2026-01-01 10:30:00",
        shipping_address: "Mong Kok, Kowloon, Hong Kong",
        tracking_status: "in transit",
        estimated_delivery: "2026-01-05",
    },
    Order {
        order_id: "ORD20260102002",
        customer_name: "Li Meihua",
        product_name: "Running Shoes",
        order_amount: 599.00,
        order_status: "delivered",
        order_time: "2026-01-02 14:20:00",
        shipping_address: "Central, Hong Kong Island",
        tracking_status: "delivered",
        estimated_delivery: "2026-01-04",
    },
    Order {
        order_id: "ORD20260103003",
        customer_name: "Wang Dali",
        product_name: "Smart Band",
        order_amount: 89.00,
        order_status: "awaiting shipment",
        order_time: "2026-01-03 09:15:00",
        shipping_address: "Sha Tin, New Territories, Hong Kong",
        tracking_status: "awaiting dispatch",
        estimated_delivery: "2026-01-06",
    },
    Order {
        order_id: "ORD20260104004",
        customer_name: "Chen Xiaofang",
        product_name: "Laptop Backpack",
        order_amount: 158.00,
        order_status: "out for delivery",
        order_time: "2026-01-04 11:00:00",
        shipping_address: "Tsim Sha Tsui, Kowloon, Hong Kong",
        tracking_status: "out for delivery",
        estimated_delivery: "2026-01-04",
    },
    Order {
        order_id: "ORD20260104005",
        customer_name: "Liu Zhiqiang",
        product_name: "Mechanical Keyboard",
        order_amount: 899.00,
        order_status: "shipped",
        order_time: "2026-01-04 15:30:00",
        shipping_address: "Causeway Bay, Hong Kong Island",
        tracking_status: "in transit",
        estimated_delivery: "2026-01-06",
    },
];

pub static REFUND_REASONS: [&str; 8] = [
    "Product quality issue",
    "Item not as described",
    "Wrong size",
    "Changed my mind",
    "Item arrived damaged",
    "Wrong item shipped",
    "Shipping too slow",
    "Price dropped",
];

pub fn find_order(order_id: &str) -> Option<&'static Order> {
    ORDERS.iter().find(|order| order.order_id == order_id.trim())
}

pub fn order_ids() -> impl Iterator<Item = &'static str> {
    ORDERS.iter().map(|order| order.order_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_trims_and_misses_cleanly() {
        assert_eq!(
            find_order(" ORD20260104005 ").map(|o| o.order_amount),
            Some(899.0)
        );
        assert!(find_order("ORD00000000000").is_none());
        assert_eq!(order_ids().count(), 5);
    }
}
