mod common;

use anyhow::Result;
use common::{parse_date, session, test_service, StandardBooks};
use khata::application::{AppError, PurchaseInput, Session};
use khata::domain::{PaymentMode, PurchaseStatus};

#[tokio::test]
async fn test_customer_balance_scenario() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;

    StandardBooks::invoice(&service, &session, &ravi, 600_000, parse_date("2024-03-01")).await?;
    StandardBooks::invoice(&service, &session, &ravi, 400_000, parse_date("2024-03-05")).await?;
    service
        .receive_payment(&session, "Ravi Kumar", 400_000, PaymentMode::Upi, parse_date("2024-03-10"), None)
        .await?;

    let account = service.customer_account(&session, "Ravi Kumar").await?;
    assert_eq!(account.balance.summary.total_billed, 1_000_000);
    assert_eq!(account.balance.summary.total_paid, 400_000);
    assert_eq!(account.balance.summary.pending, 600_000);
    assert_eq!(account.last_activity, Some(parse_date("2024-03-10")));

    // Overpaying never drives a receivable below zero
    service
        .receive_payment(&session, "Ravi Kumar", 700_000, PaymentMode::Cash, parse_date("2024-03-12"), None)
        .await?;
    let account = service.customer_account(&session, "Ravi Kumar").await?;
    assert_eq!(account.balance.summary.total_paid, 1_100_000);
    assert_eq!(account.balance.summary.pending, 0);

    Ok(())
}

#[tokio::test]
async fn test_vendor_pending_can_go_negative() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    StandardBooks::create_counterparties(&service, &session).await?;

    service
        .record_purchase(
            &session,
            PurchaseInput {
                vendor_name: "Acme Supplies".into(),
                item: "Paint".into(),
                quantity: 2.0,
                rate: 25_000,
                status: PurchaseStatus::Unpaid,
                date: parse_date("2024-02-01"),
            },
        )
        .await?;
    service
        .pay_vendor(&session, "Acme Supplies", 80_000, PaymentMode::BankTransfer, parse_date("2024-02-03"))
        .await?;

    let account = service.vendor_account(&session, "Acme Supplies").await?;
    assert_eq!(account.balance.summary.total_billed, 50_000);
    assert_eq!(account.balance.summary.total_paid, 80_000);
    assert_eq!(account.balance.summary.pending, -30_000);

    Ok(())
}

#[tokio::test]
async fn test_balance_lists_include_idle_counterparties() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;
    StandardBooks::invoice(&service, &session, &ravi, 10_000, parse_date("2024-01-01")).await?;

    let balances = service.customer_balances(&session).await?;
    assert_eq!(balances.len(), 2);
    let meena = balances.iter().find(|b| b.name == "Meena Stores").unwrap();
    assert_eq!(meena.summary.total_billed, 0);
    assert_eq!(meena.summary.pending, 0);

    // Aggregation is recomputed on every call and gives the same answer
    let again = service.customer_balances(&session).await?;
    let pending: Vec<i64> = balances.iter().map(|b| b.summary.pending).collect();
    let pending_again: Vec<i64> = again.iter().map(|b| b.summary.pending).collect();
    assert_eq!(pending, pending_again);

    Ok(())
}

#[tokio::test]
async fn test_tenants_do_not_see_each_other() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let shop = session();
    let other = Session::start("other-shop");
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &shop).await?;
    StandardBooks::invoice(&service, &shop, &ravi, 10_000, parse_date("2024-01-01")).await?;

    assert!(service.list_customers(&other).await?.is_empty());
    assert!(service.list_sales(&other, None).await?.is_empty());
    assert!(matches!(
        service.get_customer(&other, "Ravi Kumar").await,
        Err(AppError::CustomerNotFound(_))
    ));

    // Same name is free in another tenant
    service
        .create_customer(&other, "Ravi Kumar".into(), Default::default(), None)
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_signed_out_session_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let mut session = session();
    session.sign_out();

    let result = service.list_customers(&session).await;
    assert!(matches!(result, Err(AppError::SessionClosed(_))));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_and_blank_names_are_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    StandardBooks::create_counterparties(&service, &session).await?;

    let duplicate = service
        .create_customer(&session, "Ravi Kumar".into(), Default::default(), None)
        .await;
    assert!(matches!(duplicate, Err(AppError::CustomerAlreadyExists(_))));

    let blank = service.create_vendor(&session, "   ".into(), Default::default()).await;
    match blank {
        Err(AppError::Validation(errors)) => assert!(errors.has_field("name")),
        other => panic!("expected validation error, got {:?}", other.map(|v| v.name)),
    }

    Ok(())
}

#[tokio::test]
async fn test_delete_with_dependents_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let session = session();
    let (ravi, _, _, _) = StandardBooks::create_counterparties(&service, &session).await?;
    StandardBooks::invoice(&service, &session, &ravi, 10_000, parse_date("2024-01-01")).await?;
    service
        .receive_payment(&session, "Ravi Kumar", 5_000, PaymentMode::Cash, parse_date("2024-01-02"), None)
        .await?;
    service
        .pay_vendor(&session, "Globex", 1_000, PaymentMode::Cash, parse_date("2024-01-02"))
        .await?;

    match service.delete_customer(&session, "Ravi Kumar").await {
        Err(AppError::HasDependents { kind, counts, .. }) => {
            assert_eq!(kind, "customer");
            assert_eq!(counts.sales, 1);
            assert_eq!(counts.payments, 1);
        }
        other => panic!("expected HasDependents, got {:?}", other.map(|c| c.name)),
    }
    assert!(service.get_customer(&session, "Ravi Kumar").await.is_ok());

    match service.delete_vendor(&session, "Globex").await {
        Err(AppError::HasDependents { counts, .. }) => assert_eq!(counts.payments, 1),
        other => panic!("expected HasDependents, got {:?}", other.map(|v| v.name)),
    }

    // Counterparties with nothing attached delete cleanly
    service.delete_customer(&session, "Meena Stores").await?;
    service.delete_vendor(&session, "Acme Supplies").await?;
    assert_eq!(service.list_customers(&session).await?.len(), 1);
    assert_eq!(service.list_vendors(&session).await?.len(), 1);

    Ok(())
}
