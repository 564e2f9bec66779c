mod common;
use bookbot_auth::db::Role;
use bookbot_auth::services::{LoginResult, LogoutResult, RegisterResult, SessionResult};
use common::{Harness, new_user};

#[tokio::test]
async fn test_register_login_validate_logout() -> anyhow::Result<()> {
    let h = Harness::new().await?;

    assert_eq!(
        h.auth.register(new_user(1, "ana"), "Secr3t!").await,
        RegisterResult::Created
    );

    let LoginResult::Authenticated(auth) = h.auth.login("ana", "Secr3t!").await else {
        anyhow::bail!("login should succeed");
    };
    assert_eq!(auth.profile.identity, 1);
    assert_eq!(auth.profile.name, "Ana");
    assert_eq!(auth.profile.surname, "Lee");
    assert_eq!(auth.profile.role, Role::Follower);

    let SessionResult::Active(owner) = h.auth.validate_session(&auth.token).await else {
        anyhow::bail!("fresh token should validate");
    };
    assert_eq!(owner, auth.profile);

    assert_eq!(h.auth.logout(&auth.token).await, LogoutResult::Revoked);
    assert_eq!(
        h.auth.validate_session(&auth.token).await,
        SessionResult::Invalid
    );
    Ok(())
}

#[tokio::test]
async fn test_duplicate_identity_and_username() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.auth.register(new_user(1, "ana"), "pw1").await;

    let mut same_identity = new_user(1, "other");
    same_identity.name = "Someone".to_string();
    assert_eq!(
        h.auth.register(same_identity, "pw2").await,
        RegisterResult::AlreadyRegistered
    );

    assert_eq!(
        h.auth.register(new_user(2, "ana"), "pw3").await,
        RegisterResult::UsernameTaken
    );

    // the first registration is untouched
    let user = h.auth.profile(1).await?.expect("user 1 exists");
    assert_eq!(user.username, "ana");
    assert_eq!(user.name, "Ana");
    assert!(h.auth.profile(2).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_login_failure_is_generic() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.auth.register(new_user(1, "ana"), "right").await;

    assert_eq!(
        h.auth.login("ana", "wrong").await,
        LoginResult::InvalidCredentials
    );
    assert_eq!(
        h.auth.login("nobody", "right").await,
        LoginResult::InvalidCredentials
    );
    Ok(())
}

#[tokio::test]
async fn test_sliding_expiry() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.auth.register(new_user(1, "ana"), "pw").await;
    let LoginResult::Authenticated(auth) = h.auth.login("ana", "pw").await else {
        anyhow::bail!("login should succeed");
    };

    // each validation pushes expiry a full TTL from now
    for _ in 0..3 {
        h.clock.advance(29 * 60);
        assert!(matches!(
            h.auth.validate_session(&auth.token).await,
            SessionResult::Active(_)
        ));
    }

    h.clock.advance(30 * 60);
    assert_eq!(
        h.auth.validate_session(&auth.token).await,
        SessionResult::Invalid
    );
    Ok(())
}

#[tokio::test]
async fn test_storage_failure_is_reported() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.auth.register(new_user(1, "ana"), "pw").await;
    let LoginResult::Authenticated(auth) = h.auth.login("ana", "pw").await else {
        anyhow::bail!("login should succeed");
    };

    h.store.fail();
    assert_eq!(
        h.auth.register(new_user(2, "bob"), "pw").await,
        RegisterResult::StorageFailure
    );
    assert_eq!(h.auth.login("ana", "pw").await, LoginResult::StorageFailure);
    assert_eq!(
        h.auth.validate_session(&auth.token).await,
        SessionResult::StorageFailure
    );
    assert_eq!(h.auth.logout(&auth.token).await, LogoutResult::StorageFailure);

    h.store.heal();
    assert!(matches!(
        h.auth.validate_session(&auth.token).await,
        SessionResult::Active(_)
    ));
    Ok(())
}

#[tokio::test]
async fn test_stalled_store_times_out() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.auth.register(new_user(1, "ana"), "pw").await;

    h.store.stall();
    assert_eq!(h.auth.login("ana", "pw").await, LoginResult::StorageFailure);
    Ok(())
}

#[tokio::test]
async fn test_purge_removes_only_expired() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.auth.register(new_user(1, "ana"), "pw").await;

    let old = h.auth.sessions().issue(1).await?;
    h.clock.advance(20 * 60);
    let fresh = h.auth.sessions().issue(1).await?;
    h.clock.advance(10 * 60);

    assert_eq!(h.auth.sessions().purge_expired().await?, 1);
    assert_eq!(h.auth.validate_session(&old).await, SessionResult::Invalid);
    assert!(matches!(
        h.auth.validate_session(&fresh).await,
        SessionResult::Active(_)
    ));
    Ok(())
}
