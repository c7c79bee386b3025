//! Order management commands.

use anyhow::{bail, Context as _, Result};
use dialoguer::Confirm;
use storefront_commerce::checkout::{
    CustomerInfo, Order, OrderLine, OrderListQuery, OrderStatus, PlaceOrder, ORDER_NUMBER_PREFIX,
};
use storefront_commerce::{OrderId, Storefront};

use super::{OrderArgs, OrderCommand};
use crate::context::Context;
use crate::output::{format_timestamp, status_badge, truncate};

/// Run the order command.
pub async fn run(args: OrderArgs, ctx: &Context) -> Result<()> {
    match args.command {
        OrderCommand::Place {
            items,
            name,
            email,
            phone,
            company,
            delivery,
            address,
            payment,
            notes,
        } => {
            let mut customer = CustomerInfo::new(name, email, phone);
            if let Some(company) = company {
                customer = customer.with_company(company);
            }
            let lines = items
                .iter()
                .map(|item| parse_line(item))
                .collect::<Result<Vec<_>>>()?;

            let mut request = PlaceOrder::new(customer, lines);
            if let Some(method) = delivery {
                request = request.with_delivery(method, address);
            } else if address.is_some() {
                bail!("--address needs --delivery");
            }
            if let Some(method) = payment {
                request = request.with_payment_method(method);
            }
            if let Some(notes) = notes {
                request = request.with_notes(notes);
            }
            place(request, ctx).await
        }
        OrderCommand::Show { order } => show(&order, ctx).await,
        OrderCommand::List {
            email,
            status,
            page,
            limit,
        } => list(email, status, page, limit, ctx).await,
        OrderCommand::Status { order, status, yes } => {
            set_status(&order, &status, yes, ctx).await
        }
        OrderCommand::Cancel { order, yes } => cancel(&order, yes, ctx).await,
        OrderCommand::Notes { order, text } => notes(&order, text.as_deref(), ctx).await,
    }
}

/// Parse `PRODUCT_ID[:QUANTITY]`.
fn parse_line(item: &str) -> Result<OrderLine> {
    let (id, quantity) = match item.rsplit_once(':') {
        Some((id, qty)) => {
            let qty = qty
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid quantity in '{}'", item))?;
            (id.trim(), qty)
        }
        None => (item.trim(), 1),
    };
    if id.is_empty() {
        bail!("Missing product id in '{}'", item);
    }
    Ok(OrderLine::new(id, quantity))
}

/// Look an order up by id, or by number when it carries the order prefix.
async fn resolve(shop: &Storefront, key: &str) -> Result<Order> {
    let key = key.trim();
    let order = if key.starts_with(&format!("{}-", ORDER_NUMBER_PREFIX)) {
        shop.find_order_by_number(key).await?
    } else {
        shop.get_order(&OrderId::new(key)).await?
    };
    Ok(order)
}

async fn place(request: PlaceOrder, ctx: &Context) -> Result<()> {
    let shop = ctx.storefront().await?;
    let receipt = shop.place_order(&request).await?;

    if ctx.output.is_json() {
        ctx.output.json(&receipt);
        return Ok(());
    }

    ctx.output.success(&format!("Order {} placed", receipt.order_number));
    ctx.output.kv("id", receipt.order_id.as_str());
    ctx.output.kv("total", &receipt.total.display());
    ctx.output.kv("status", receipt.status.display_name());
    Ok(())
}

async fn show(key: &str, ctx: &Context) -> Result<()> {
    let order = resolve(ctx.storefront().await?, key).await?;

    if ctx.output.is_json() {
        ctx.output.json(&order);
        return Ok(());
    }

    print_order(&order, ctx);
    Ok(())
}

fn print_order(order: &Order, ctx: &Context) {
    ctx.output.header(&format!("Order {}", order.order_number));
    ctx.output.kv("id", order.id.as_str());
    ctx.output.kv("status", &status_badge(order.status.as_str(), 0));
    ctx.output.kv("created", &format_timestamp(order.created_at));
    if let Some(cancelled_at) = order.cancelled_at {
        ctx.output.kv("cancelled", &format_timestamp(cancelled_at));
    }
    ctx.output.kv(
        "customer",
        &format!(
            "{} <{}>, {}",
            order.customer.name, order.customer.email, order.customer.phone
        ),
    );
    if let Some(company) = &order.customer.company {
        ctx.output.kv("company", company);
    }
    if let Some(method) = &order.delivery_method {
        let address = order.delivery_address.as_deref().unwrap_or("-");
        ctx.output.kv("delivery", &format!("{} ({})", method, address));
    }
    if let Some(method) = &order.payment_method {
        ctx.output.kv("payment", method);
    }
    if let Some(notes) = &order.notes {
        ctx.output.kv("notes", notes);
    }

    let widths = [14, 32, 5, 16, 16];
    ctx.output.info("");
    ctx.output
        .table_header(&["SKU", "PRODUCT", "QTY", "PRICE", "TOTAL"], &widths);
    for item in &order.items {
        ctx.output.table_row(
            &[
                &item.sku,
                &truncate(&item.product_name, widths[1]),
                &item.quantity.to_string(),
                &item.price.display(),
                &item.total.display(),
            ],
            &widths,
        );
    }
    ctx.output.info("");
    ctx.output.kv("total", &order.total.display());
}

async fn list(
    email: Option<String>,
    status: Option<String>,
    page: i64,
    limit: Option<i64>,
    ctx: &Context,
) -> Result<()> {
    let mut query = OrderListQuery::new();
    if let Some(email) = email {
        query = query.with_customer_email(email);
    }
    if let Some(status) = status {
        query = query.with_status_param(&status)?;
    }
    let per_page = limit.unwrap_or(ctx.config.orders.page_size);
    query = query.with_pagination(page, per_page);

    let page = ctx.storefront().await?.list_orders(&query).await?;

    if ctx.output.is_json() {
        ctx.output.json(&page);
        return Ok(());
    }

    ctx.output.header("Orders");
    if page.is_empty() {
        ctx.output.info("No orders found.");
        return Ok(());
    }

    let widths = [24, 20, 12, 28, 16];
    ctx.output.table_header(
        &["NUMBER", "CREATED", "STATUS", "CUSTOMER", "TOTAL"],
        &widths,
    );
    for order in &page.items {
        ctx.output.table_row(
            &[
                &order.order_number,
                &format_timestamp(order.created_at),
                &status_badge(order.status.as_str(), widths[2]),
                &truncate(&order.customer.email, widths[3]),
                &order.total.display(),
            ],
            &widths,
        );
    }

    let p = &page.pagination;
    ctx.output.info("");
    ctx.output.info(&format!(
        "Page {} of {} ({} order(s))",
        p.page, p.total_pages, p.total
    ));
    Ok(())
}

async fn set_status(key: &str, status: &str, yes: bool, ctx: &Context) -> Result<()> {
    let target: OrderStatus = status.parse()?;
    let shop = ctx.storefront().await?;
    let order = resolve(shop, key).await?;

    if !order.status.can_transition_to(target) {
        let allowed: Vec<&str> = order
            .status
            .allowed_transitions()
            .iter()
            .map(|s| s.as_str())
            .collect();
        bail!(
            "Order {} is {}; allowed next: {}",
            order.order_number,
            order.status,
            if allowed.is_empty() {
                "none".to_string()
            } else {
                allowed.join(", ")
            }
        );
    }

    if target == OrderStatus::Cancelled && !confirm_cancel(&order, yes, ctx)? {
        ctx.output.info("Aborted.");
        return Ok(());
    }

    let updated = shop.set_order_status(&order.id, target).await?;

    if ctx.output.is_json() {
        ctx.output.json(&updated);
        return Ok(());
    }
    ctx.output.success(&format!(
        "Order {}: {} -> {}",
        updated.order_number, order.status, updated.status
    ));
    Ok(())
}

async fn cancel(key: &str, yes: bool, ctx: &Context) -> Result<()> {
    let shop = ctx.storefront().await?;
    let order = resolve(shop, key).await?;

    if !order.status.can_cancel() {
        bail!(
            "Order {} is {} and can no longer be cancelled",
            order.order_number,
            order.status
        );
    }
    if !confirm_cancel(&order, yes, ctx)? {
        ctx.output.info("Aborted.");
        return Ok(());
    }

    let cancelled = shop.cancel_order(&order.id).await?;

    if ctx.output.is_json() {
        ctx.output.json(&cancelled);
        return Ok(());
    }
    ctx.output.success(&format!(
        "Order {} cancelled, {} item(s) returned to stock",
        cancelled.order_number,
        cancelled.item_count()
    ));
    Ok(())
}

fn confirm_cancel(order: &Order, yes: bool, ctx: &Context) -> Result<bool> {
    if yes || ctx.output.is_json() {
        return Ok(true);
    }
    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Cancel order {} ({})?",
            order.order_number,
            order.total.display()
        ))
        .default(false)
        .interact()?;
    Ok(confirmed)
}

async fn notes(key: &str, text: Option<&str>, ctx: &Context) -> Result<()> {
    let shop = ctx.storefront().await?;
    let order = resolve(shop, key).await?;
    let updated = shop.update_order_notes(&order.id, text).await?;

    if ctx.output.is_json() {
        ctx.output.json(&updated);
        return Ok(());
    }
    match &updated.notes {
        Some(notes) => ctx
            .output
            .success(&format!("Notes on {} set to: {}", updated.order_number, notes)),
        None => ctx
            .output
            .success(&format!("Notes on {} cleared", updated.order_number)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let line = parse_line("zebra-zd421:3").unwrap();
        assert_eq!(line.product_id.as_str(), "zebra-zd421");
        assert_eq!(line.quantity, 3);

        assert_eq!(parse_line("atol").unwrap().quantity, 1);
        assert!(parse_line("atol:x").is_err());
        assert!(parse_line(":2").is_err());
    }
}
