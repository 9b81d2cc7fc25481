//! Integration tests against a live PostgreSQL
//!
//! These tests verify that the migrations apply and that the repositories
//! and the booking guard behave the same on PostgreSQL as in memory.
//! They need `DATABASE_URL` to point at a reachable database.

use booking_common::{
    booking::BookingService,
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    error::{DatabaseError, DomainError},
    models::{ADMIN_ROLE, BookingStatus, DEFAULT_ROLE, FacilityInput, NewBooking, NewUser},
    repositories::{
        BOOKING_SLOT_CONSTRAINT, BookingRepository, BookingStore, FacilityRepository,
        FacilityStore, SessionRepository, USER_EMAIL_CONSTRAINT, UserRepository, UserStore,
    },
    session::{SessionMediator, SessionPolicy},
};
use chrono::{Duration, DurationRound, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

async fn pool() -> anyhow::Result<PgPool> {
    let config = DatabaseConfig::from_env()?;
    let pool = init_pool(&config).await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

fn new_user() -> NewUser {
    NewUser {
        email: format!("{}@example.com", Uuid::new_v4()),
        name: "Integration".to_string(),
        password_hash: "hash".to_string(),
    }
}

#[tokio::test]
async fn test_database_is_reachable() -> anyhow::Result<()> {
    let pool = pool().await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT COUNT(*) AS roles FROM roles WHERE name IN ('Admin', 'User')")
        .fetch_one(&pool)
        .await?;
    let roles: i64 = row.get("roles");
    assert_eq!(roles, 2, "Seeded roles are missing");

    Ok(())
}

#[tokio::test]
async fn test_users_and_sessions() -> anyhow::Result<()> {
    let pool = pool().await?;
    let users = UserRepository::new(pool.clone());

    let new = new_user();
    let profile = users.create_user(new.clone()).await?;
    assert!(profile.has_role(DEFAULT_ROLE));

    match users.create_user(new).await {
        Err(DatabaseError::UniqueViolation(constraint)) => {
            assert_eq!(constraint, USER_EMAIL_CONSTRAINT)
        }
        other => panic!("expected a unique violation, got {other:?}"),
    }

    let admin = users.assign_role(profile.id, ADMIN_ROLE).await?.expect("user exists");
    let again = users.assign_role(profile.id, ADMIN_ROLE).await?.expect("user exists");
    assert_eq!(admin.roles.len(), again.roles.len());
    assert!(users.assign_role(profile.id, "Owner").await?.is_none());

    let mediator = SessionMediator::new(
        Arc::new(SessionRepository::new(pool.clone())),
        SessionPolicy::default(),
    );
    let now = Utc::now();
    let session = mediator.start_session(profile.id, now).await?;
    let resolved = mediator.resolve_session(&session.id, now).await?.expect("active");
    assert!(resolved.user.has_role(ADMIN_ROLE));
    assert!(mediator.resolve_session(&session.id, session.active_until).await?.is_none());

    assert!(users.delete_user(profile.id).await?);
    assert!(mediator.resolve_session(&session.id, now).await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_slot_uniqueness_is_enforced_by_the_database() -> anyhow::Result<()> {
    let pool = pool().await?;
    let users = UserRepository::new(pool.clone());
    let facilities = FacilityRepository::new(pool.clone());
    let bookings = BookingRepository::new(pool.clone());

    let user = users.create_user(new_user()).await?;
    let facility = facilities
        .create_facility(FacilityInput {
            name: "Court".to_string(),
            kind: "Tennis".to_string(),
            location: "North wing".to_string(),
        })
        .await?;
    let slot = (Utc::now() + Duration::days(30)).duration_trunc(Duration::hours(1))?;

    let booking = NewBooking {
        user_id: user.id,
        facility_id: facility.id,
        date: slot,
    };
    let first = bookings.insert_booking(booking).await?;
    assert_eq!(first.status, BookingStatus::Pending);

    match bookings.insert_booking(booking).await {
        Err(DatabaseError::UniqueViolation(constraint)) => {
            assert_eq!(constraint, BOOKING_SLOT_CONSTRAINT)
        }
        other => panic!("expected a unique violation, got {other:?}"),
    }

    // Concurrent attempts through the service: exactly one more succeeds
    // once the first booking is cancelled
    bookings
        .update_booking_status(first.id, BookingStatus::Cancelled)
        .await?;
    let service = BookingService::new(Arc::new(bookings.clone()), Arc::new(facilities.clone()));
    let (a, b) = (service.clone(), service.clone());
    let (facility_id, user_id, now) = (facility.id, user.id, Utc::now());
    let (left, right) = tokio::join!(
        tokio::spawn(async move { a.create_booking(facility_id, user_id, slot, now).await }),
        tokio::spawn(async move { b.create_booking(facility_id, user_id, slot, now).await }),
    );
    let results = [left?, right?];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(DomainError::Conflict(_))))
    );

    assert!(facilities.delete_facility(facility.id).await?);
    assert!(bookings.find_booking(first.id).await?.is_none());
    users.delete_user(user.id).await?;

    Ok(())
}

#[tokio::test]
async fn test_hour_alignment_ignores_the_session_time_zone() -> anyhow::Result<()> {
    let pool = pool().await?;
    let users = UserRepository::new(pool.clone());
    let facilities = FacilityRepository::new(pool.clone());

    let user = users.create_user(new_user()).await?;
    let facility = facilities
        .create_facility(FacilityInput {
            name: "Pool".to_string(),
            kind: "Swimming".to_string(),
            location: "South wing".to_string(),
        })
        .await?;
    let slot = (Utc::now() + Duration::days(30)).duration_trunc(Duration::hours(1))?;

    // Half-hour offset: truncating in local time would move the instant
    let mut conn = pool.acquire().await?;
    sqlx::query("SET TIME ZONE 'Asia/Kolkata'")
        .execute(&mut *conn)
        .await?;

    let insert = "INSERT INTO bookings (user_id, facility_id, date) VALUES ($1, $2, $3)";
    sqlx::query(insert)
        .bind(user.id)
        .bind(facility.id)
        .bind(slot)
        .execute(&mut *conn)
        .await?;

    let misaligned = sqlx::query(insert)
        .bind(user.id)
        .bind(facility.id)
        .bind(slot + Duration::minutes(30))
        .execute(&mut *conn)
        .await;
    assert!(misaligned.is_err(), "Half-past start was accepted");

    sqlx::query("RESET TIME ZONE").execute(&mut *conn).await?;
    drop(conn);

    assert!(facilities.delete_facility(facility.id).await?);
    users.delete_user(user.id).await?;

    Ok(())
}

#[tokio::test]
async fn test_emails_are_unique_regardless_of_case() -> anyhow::Result<()> {
    let pool = pool().await?;
    let users = UserRepository::new(pool.clone());

    let new = new_user();
    let profile = users.create_user(new.clone()).await?;

    let shouting = NewUser {
        email: new.email.to_uppercase(),
        ..new.clone()
    };
    match users.create_user(shouting).await {
        Err(DatabaseError::UniqueViolation(constraint)) => {
            assert_eq!(constraint, USER_EMAIL_CONSTRAINT)
        }
        other => panic!("expected a unique violation, got {other:?}"),
    }

    let found = users
        .find_by_email(&new.email.to_uppercase())
        .await?
        .expect("lookup ignores case");
    assert_eq!(found.id, profile.id);

    users.delete_user(profile.id).await?;
    Ok(())
}
