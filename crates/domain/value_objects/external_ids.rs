const ORDER_PREFIX: &str = "order-";

pub fn external_id_for_order(order_id: i64) -> String {
    format!("{ORDER_PREFIX}{order_id}")
}

/// Recovers the order id from an `order-<id>` external id.
///
/// Anything that does not follow the scheme maps to order `0` instead of
/// failing. Callers then look up "order zero", which has no payment row.
/// Kept as-is until product decides whether malformed ids should be rejected
/// up front.
pub fn order_id_from_external_id(external_id: &str) -> i64 {
    external_id
        .strip_prefix(ORDER_PREFIX)
        .and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(0)
}
