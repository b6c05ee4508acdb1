//! Plain-text rendering for the terminal front end

use chrono::{DateTime, Utc};

use crate::format;
use crate::models::{ActivityEvent, Product, PurchaseOrder, SalesOrder, Supplier};
use crate::router::{Navigator, Tab};
use crate::viewmodel::DashboardPage;

/// Left-aligned columns separated by two spaces
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut out = vec![line(headers.to_vec()), rule.join("  ")];
    for row in rows {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    if rows.is_empty() {
        out.push("(no rows)".to_string());
    }
    out.join("\n")
}

pub fn products(rows: &[&Product]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|p| {
            vec![
                p.name.clone(),
                format::price(p.price),
                p.quantity.to_string(),
                p.units_sold.to_string(),
                p.stock_level().label().to_string(),
                p.id.to_string(),
            ]
        })
        .collect();
    table(&["NAME", "PRICE", "QTY", "SOLD", "STATUS", "ID"], &body)
}

pub fn sales_orders(rows: &[&SalesOrder]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|o| {
            vec![
                format!("#{}", o.order_number),
                o.customer_email.clone(),
                o.product_name.clone(),
                o.quantity.to_string(),
                o.status.label().to_string(),
                format::short_date(o.placed_at()),
            ]
        })
        .collect();
    table(&["ORDER", "CUSTOMER", "PRODUCT", "QTY", "STATUS", "DATE"], &body)
}

pub fn purchase_orders(rows: &[&PurchaseOrder]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|o| {
            vec![
                o.supplier_name.clone(),
                o.product_name.clone(),
                o.product_quantity.to_string(),
                format::price(o.product_price),
                format::price(o.total()),
                o.status.label().to_string(),
                format::short_date(o.placed_at()),
                o.id.to_string(),
            ]
        })
        .collect();
    table(
        &["SUPPLIER", "PRODUCT", "QTY", "PRICE", "TOTAL", "STATUS", "DATE", "ID"],
        &body,
    )
}

pub fn suppliers(rows: &[&Supplier]) -> String {
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|s| {
            vec![
                s.company_name.clone(),
                s.contact_person.clone(),
                s.contact_email.clone(),
                s.num_orders.to_string(),
                s.id.to_string(),
            ]
        })
        .collect();
    table(&["COMPANY", "CONTACT", "EMAIL", "ORDERS", "ID"], &body)
}

/// Header, three summary cards and the activity feed
pub fn dashboard(page: &DashboardPage, now: DateTime<Utc>) -> String {
    let mut out = vec![format!("Dashboard  {}", format::long_date(now)), String::new()];

    if let Some(error) = page.error() {
        out.push(format!("! {}", error));
        out.push(String::new());
    }

    out.push(card(
        "Inventory Summary",
        page.inventory().map(|r| {
            r.as_ref().map(|s| {
                vec![
                    ("Total Items", s.total_items.to_string()),
                    ("Low Stock", s.low_stock.to_string()),
                    ("Out of Stock", s.out_of_stock.to_string()),
                    ("Recently Added", s.recently_added.to_string()),
                ]
            })
        }),
    ));
    out.push(card(
        "Sales Summary",
        page.sales().map(|r| {
            r.as_ref().map(|s| {
                vec![
                    ("Total Orders", s.total_orders.to_string()),
                    ("Pending", s.pending_orders.to_string()),
                    ("Completed", s.completed_orders.to_string()),
                    ("Revenue", format::currency(s.revenue)),
                ]
            })
        }),
    ));
    out.push(card(
        "Purchase Summary",
        page.purchases().map(|r| {
            r.as_ref().map(|s| {
                vec![
                    ("Total Orders", s.total_orders.to_string()),
                    ("Pending", s.pending_orders.to_string()),
                    ("Completed", s.completed_orders.to_string()),
                    ("Total Spent", format::currency(s.spent)),
                ]
            })
        }),
    ));

    out.push("Recent Activity".to_string());
    match page.activity() {
        Some(Ok(events)) if events.is_empty() => out.push("  (no activity)".to_string()),
        Some(Ok(events)) => out.extend(events.iter().map(|e| activity_line(e, now))),
        Some(Err(message)) => out.push(format!("  unavailable: {}", message)),
        None => out.push("  loading...".to_string()),
    }

    out.join("\n")
}

fn card(title: &str, metrics: Option<Result<Vec<(&str, String)>, &String>>) -> String {
    let mut lines = vec![title.to_string()];
    match metrics {
        Some(Ok(metrics)) => {
            let width = metrics.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
            for (label, value) in metrics {
                lines.push(format!("  {:<width$}  {}", label, value, width = width));
            }
        }
        Some(Err(message)) => lines.push(format!("  unavailable: {}", message)),
        None => lines.push("  loading...".to_string()),
    }
    lines.push(String::new());
    lines.join("\n")
}

fn activity_line(event: &ActivityEvent, now: DateTime<Utc>) -> String {
    let when = event
        .occurred_at
        .map(|at| format::relative_time(at, now))
        .unwrap_or_default();
    let meta = event.meta();
    let mut line = format!("  {} {}", event.kind().icon(), event.title);
    if !meta.is_empty() {
        line.push_str(&format!("  ({})", meta));
    }
    if !when.is_empty() {
        line.push_str(&format!("  {}", when));
    }
    line
}

/// Sidebar: brand, tabs with the active one marked, signed-in user
pub fn sidebar(navigator: &Navigator, display_name: &str, email: Option<&str>) -> String {
    let mut out = vec!["SunFlow Inventory".to_string(), String::new()];
    let active = navigator.active_tab();
    for tab in Tab::ALL {
        let marker = if active == Some(tab) { ">" } else { " " };
        out.push(format!("{} {} {}", marker, tab.icon(), tab.label()));
    }
    out.push(String::new());
    out.push(match email {
        Some(email) => format!("{} <{}>", display_name, email),
        None => display_name.to_string(),
    });
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, Operation};
    use crate::models::SalesStatus;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_table_alignment() {
        let out = table(
            &["NAME", "QTY"],
            &[vec!["Battery".into(), "3".into()], vec!["Cable".into(), "12".into()]],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "NAME     QTY");
        assert_eq!(lines[1], "-------  ---");
        assert_eq!(lines[2], "Battery  3");
        assert_eq!(lines[3], "Cable    12");
    }

    #[test]
    fn test_empty_table() {
        let out = table(&["NAME"], &[]);
        assert!(out.ends_with("(no rows)"));
    }

    #[test]
    fn test_sales_order_row() {
        let order = SalesOrder {
            order_number: 1001,
            customer_email: "a@b.co".into(),
            product_id: None,
            product_name: "Widget".into(),
            quantity: 2,
            status: SalesStatus::Shipped,
            order_date: Some("2026-10-17T09:00:00Z".parse().unwrap()),
            created_at: None,
        };
        let out = sales_orders(&[&order]);
        assert!(out.contains("#1001"));
        assert!(out.contains("Shipped"));
        assert!(out.contains("Oct 17, 2026"));
    }

    #[tokio::test]
    async fn test_dashboard_partial_failure() {
        let backend = Arc::new(MemoryBackend::new());
        backend.seed(
            "sales_summary",
            vec![json!({ "total_orders": 87, "pending_orders": 14, "completed_orders": 73, "revenue": 42580 })],
        );
        backend.fail("purchase_summary", Operation::Select, "permission denied for view purchase_summary");
        let mut page = DashboardPage::new(backend);
        page.refresh().await;

        let now: DateTime<Utc> = "2026-10-17T12:00:00Z".parse().unwrap();
        let out = dashboard(&page, now);
        assert!(out.contains("Saturday, October 17, 2026"));
        assert!(out.contains("$42,580"));
        assert!(out.contains("! permission denied for view purchase_summary"));
        assert!(out.contains("(no activity)"));
    }

    #[test]
    fn test_sidebar_marks_active_tab() {
        let mut nav = Navigator::new();
        nav.select_tab(Tab::Inventory);
        let out = sidebar(&nav, "ana", Some("ana@sunflow.test"));
        assert!(out.contains("> 📦 Inventory"));
        assert!(out.contains("  🏠 Dashboard"));
        assert!(out.ends_with("ana <ana@sunflow.test>"));
    }
}
