mod common;

use anyhow::Result;
use common::{parse_date, session, test_service, StandardBooks};
use khata::application::AppError;
use khata::domain::{InvoiceDraft, LineItem, PaymentMode, SaleStatus};
use khata::io::InvoiceDocument;

#[tokio::test]
async fn test_invoice_totals_are_persisted() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;

    let draft = InvoiceDraft::new(Some(ravi.id))
        .with_item(LineItem::new("Cement", 10.0, Some("bag".into()), 2_500))
        .with_item(LineItem::new("Sand", 1.0, None, 10_000))
        .with_tax_rate(18.0)
        .with_transport(2_000);
    let sale = service.create_invoice(&session, &draft, parse_date("2024-04-01")).await?;

    let stored = service.get_invoice(&session, sale.invoice_number).await?;
    assert_eq!(stored.subtotal, 35_000);
    assert_eq!(stored.tax_amount, 6_300);
    assert_eq!(stored.transport_charges, 2_000);
    assert_eq!(stored.total_amount, 43_300);
    assert_eq!(stored.status, SaleStatus::Unpaid);
    assert_eq!(stored.items.len(), 2);
    assert_eq!(stored.items[0].line.name, "Cement");
    assert_eq!(stored.items[0].line.unit.as_deref(), Some("bag"));
    assert_eq!(stored.items[0].line.amount(), 25_000);

    // Apportioned shares add back up to the grand total
    let item_total: i64 = stored.items.iter().map(|i| i.total).sum();
    assert_eq!(item_total, stored.total_amount);

    let (sale, customer) = service.get_invoice_with_customer(&session, sale.invoice_number).await?;
    let document = InvoiceDocument::new(&sale, &customer);
    assert_eq!(document.amount_in_words, "Four Hundred Thirty Three Rupees Only");

    Ok(())
}

#[tokio::test]
async fn test_invoice_numbers_are_sequential_per_tenant() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, meena, _, _) = StandardBooks::create_counterparties(&service, &session).await?;

    let first = StandardBooks::invoice(&service, &session, &ravi, 1_000, parse_date("2024-01-01")).await?;
    let second = StandardBooks::invoice(&service, &session, &meena, 2_000, parse_date("2024-01-02")).await?;
    assert_eq!(first.invoice_number, 1);
    assert_eq!(second.invoice_number, 2);

    let other = khata::application::Session::start("other-shop");
    let stranger = service
        .create_customer(&other, "Stranger".into(), Default::default(), None)
        .await?;
    let theirs = StandardBooks::invoice(&service, &other, &stranger, 500, parse_date("2024-01-03")).await?;
    assert_eq!(theirs.invoice_number, 1);

    let ravis = service.list_sales(&session, Some("Ravi Kumar")).await?;
    assert_eq!(ravis.len(), 1);
    assert_eq!(ravis[0].invoice_number, 1);

    Ok(())
}

#[tokio::test]
async fn test_invalid_draft_persists_nothing() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;

    let draft = InvoiceDraft::new(Some(ravi.id))
        .with_item(LineItem::new("", 0.0, None, -5))
        .with_tax_rate(-1.0);
    match service.create_invoice(&session, &draft, parse_date("2024-01-01")).await {
        Err(AppError::Validation(errors)) => {
            assert!(errors.has_field("items[0].name"));
            assert!(errors.has_field("items[0].quantity"));
            assert!(errors.has_field("items[0].rate"));
            assert!(errors.has_field("tax_rate"));
        }
        other => panic!("expected validation error, got {:?}", other.map(|s| s.invoice_number)),
    }

    let empty = InvoiceDraft::new(Some(ravi.id));
    assert!(matches!(
        service.create_invoice(&session, &empty, parse_date("2024-01-01")).await,
        Err(AppError::Validation(_))
    ));

    assert!(service.list_sales(&session, None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_payments_move_invoice_status() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;
    let sale = StandardBooks::invoice(&service, &session, &ravi, 100_000, parse_date("2024-05-01")).await?;
    assert_eq!(sale.status, SaleStatus::Unpaid);

    let result = service
        .receive_payment(&session, "Ravi Kumar", 40_000, PaymentMode::Upi, parse_date("2024-05-02"), Some(sale.invoice_number))
        .await?;
    let invoice = result.invoice.unwrap();
    assert_eq!(invoice.status, SaleStatus::Partial);
    assert_eq!(invoice.paid_amount, 40_000);
    assert_eq!(result.payment.sale_id, Some(sale.id));

    service
        .receive_payment(&session, "Ravi Kumar", 60_000, PaymentMode::Cash, parse_date("2024-05-03"), Some(sale.invoice_number))
        .await?;
    let stored = service.get_invoice(&session, sale.invoice_number).await?;
    assert_eq!(stored.status, SaleStatus::Paid);
    assert_eq!(stored.balance_due(), 0);

    Ok(())
}

#[tokio::test]
async fn test_invoice_payment_guards() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;
    let sale = StandardBooks::invoice(&service, &session, &ravi, 10_000, parse_date("2024-05-01")).await?;

    let over = service
        .receive_payment(&session, "Ravi Kumar", 10_001, PaymentMode::Cash, parse_date("2024-05-02"), Some(sale.invoice_number))
        .await;
    assert!(matches!(over, Err(AppError::PaymentExceedsBalance { due: 10_000, offered: 10_001, .. })));

    let wrong_customer = service
        .receive_payment(&session, "Meena Stores", 100, PaymentMode::Cash, parse_date("2024-05-02"), Some(sale.invoice_number))
        .await;
    assert!(matches!(wrong_customer, Err(AppError::InvoiceCustomerMismatch { .. })));

    let missing = service
        .receive_payment(&session, "Ravi Kumar", 100, PaymentMode::Cash, parse_date("2024-05-02"), Some(99))
        .await;
    assert!(matches!(missing, Err(AppError::InvoiceNotFound(99))));

    let zero = service
        .receive_payment(&session, "Ravi Kumar", 0, PaymentMode::Cash, parse_date("2024-05-02"), None)
        .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    // Nothing above was recorded
    assert!(service.list_payments(&session, None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_deleting_linked_payment_rolls_back_invoice() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;
    let sale = StandardBooks::invoice(&service, &session, &ravi, 50_000, parse_date("2024-06-01")).await?;

    let result = service
        .receive_payment(&session, "Ravi Kumar", 50_000, PaymentMode::Upi, parse_date("2024-06-02"), Some(sale.invoice_number))
        .await?;
    assert_eq!(service.get_invoice(&session, sale.invoice_number).await?.status, SaleStatus::Paid);

    // An invoice with payments against it cannot be deleted
    match service.delete_invoice(&session, sale.invoice_number).await {
        Err(AppError::HasDependents { kind, counts, .. }) => {
            assert_eq!(kind, "invoice");
            assert_eq!(counts.payments, 1);
        }
        other => panic!("expected HasDependents, got {:?}", other.map(|s| s.invoice_number)),
    }

    service.delete_payment(&session, result.payment.id).await?;
    let stored = service.get_invoice(&session, sale.invoice_number).await?;
    assert_eq!(stored.paid_amount, 0);
    assert_eq!(stored.status, SaleStatus::Unpaid);

    service.delete_invoice(&session, sale.invoice_number).await?;
    assert!(matches!(
        service.get_invoice(&session, sale.invoice_number).await,
        Err(AppError::InvoiceNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_delete_unknown_records() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();

    let id = uuid::Uuid::new_v4();
    assert!(matches!(
        service.delete_purchase(&session, id).await,
        Err(AppError::RecordNotFound { kind: "Purchase", .. })
    ));
    assert!(matches!(
        service.delete_payment(&session, id).await,
        Err(AppError::RecordNotFound { kind: "Payment", .. })
    ));
    assert!(matches!(
        service.delete_payment_made(&session, id).await,
        Err(AppError::RecordNotFound { .. })
    ));

    Ok(())
}
