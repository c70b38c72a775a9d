//! Low-stock alert rendering.

use askama::Template;

use stockwatch_inventory::{LOW_STOCK_THRESHOLD, LowStockEntry};

/// A rendered message, ready for any sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[derive(Template)]
#[template(path = "email/low_stock.html")]
struct LowStockEmailHtml<'a> {
    greeting: &'a str,
    threshold: u32,
    items: &'a [LowStockEntry],
}

#[derive(Template)]
#[template(path = "email/low_stock.txt")]
struct LowStockEmailText<'a> {
    greeting: &'a str,
    threshold: u32,
    items: &'a [LowStockEntry],
}

/// Render the alert for one recipient. `greeting` is already resolved
/// (name or fallback).
///
/// # Errors
///
/// Returns an error if either template fails to render.
pub fn low_stock_message(
    greeting: &str,
    items: &[LowStockEntry],
) -> Result<OutgoingMessage, askama::Error> {
    let html = LowStockEmailHtml {
        greeting,
        threshold: LOW_STOCK_THRESHOLD,
        items,
    }
    .render()?;
    let text = LowStockEmailText {
        greeting,
        threshold: LOW_STOCK_THRESHOLD,
        items,
    }
    .render()?;

    Ok(OutgoingMessage {
        subject: format!("[Action Required] Low stock items ({})", items.len()),
        text,
        html,
    })
}
