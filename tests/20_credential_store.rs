mod common;

use anyhow::Result;
use chrono::Duration;
use eduportal_api::database::students::{NewStudent, StudentStore};
use eduportal_api::database::StoreError;

fn new_student(email: &str, mobile: &str) -> NewStudent {
    NewStudent {
        name: "Asha Pawar".to_string(),
        email: email.to_string(),
        mobile: mobile.to_string(),
        password: "super-secret".to_string(),
    }
}

#[tokio::test]
async fn concurrent_duplicate_registration_has_one_winner() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };
    let store = StudentStore::new(pool.clone());
    let other = StudentStore::new(pool);

    let email = common::unique_email("dup");
    let (a, b) = tokio::join!(
        store.create(new_student(&email, &common::unique_mobile())),
        other.create(new_student(&email, &common::unique_mobile())),
    );

    let outcomes = [a, b];
    assert_eq!(
        outcomes.iter().filter(|r| r.is_ok()).count(),
        1,
        "exactly one registration may win"
    );
    assert!(
        outcomes.iter().any(|r| matches!(r, Err(StoreError::Duplicate(_)))),
        "the loser must see a duplicate error"
    );
    Ok(())
}

#[tokio::test]
async fn duplicate_mobile_is_rejected() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };
    let store = StudentStore::new(pool);

    let mobile = common::unique_mobile();
    store.create(new_student(&common::unique_email("mob"), &mobile)).await?;

    let second = store.create(new_student(&common::unique_email("mob"), &mobile)).await;
    assert!(matches!(second, Err(StoreError::Duplicate(_))));
    Ok(())
}

#[tokio::test]
async fn otp_is_single_use() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };
    let store = StudentStore::new(pool);

    let email = common::unique_email("otp");
    let student = store.create(new_student(&email, &common::unique_mobile())).await?;
    store.set_otp(student.id, "123456", Duration::minutes(5)).await?;

    let winner = store.consume_otp(&email, "123456").await?;
    assert_eq!(winner, student.id);

    // The stored OTP was cleared in the same statement that read it.
    let replay = store.consume_otp(&email, "123456").await;
    assert!(matches!(replay, Err(StoreError::OtpInvalid)));
    Ok(())
}

#[tokio::test]
async fn concurrent_otp_verification_has_one_winner() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };
    let store = StudentStore::new(pool.clone());
    let other = StudentStore::new(pool);

    let email = common::unique_email("otp-race");
    let student = store.create(new_student(&email, &common::unique_mobile())).await?;
    store.set_otp(student.id, "654321", Duration::minutes(5)).await?;

    let (a, b) = tokio::join!(store.consume_otp(&email, "654321"), other.consume_otp(&email, "654321"));

    let outcomes = [a, b];
    assert_eq!(
        outcomes.iter().filter(|r| r.is_ok()).count(),
        1,
        "exactly one verification may win"
    );
    assert!(
        outcomes.iter().any(|r| matches!(r, Err(StoreError::OtpInvalid))),
        "the loser must be told the OTP is invalid"
    );
    Ok(())
}

#[tokio::test]
async fn expired_otp_is_rejected() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };
    let store = StudentStore::new(pool);

    let email = common::unique_email("otp-expired");
    let student = store.create(new_student(&email, &common::unique_mobile())).await?;
    store.set_otp(student.id, "222333", Duration::minutes(-1)).await?;

    let result = store.consume_otp(&email, "222333").await;
    assert!(matches!(result, Err(StoreError::OtpInvalid)));
    Ok(())
}

#[tokio::test]
async fn wrong_otp_is_rejected() -> Result<()> {
    let Some(pool) = common::test_pool().await? else { return Ok(()) };
    let store = StudentStore::new(pool);

    let email = common::unique_email("otp-wrong");
    let student = store.create(new_student(&email, &common::unique_mobile())).await?;
    store.set_otp(student.id, "111222", Duration::minutes(5)).await?;

    let result = store.consume_otp(&email, "999999").await;
    assert!(matches!(result, Err(StoreError::OtpInvalid)));
    Ok(())
}
