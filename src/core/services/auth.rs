use crate::core::models::{
    profile::{Insert as ProfileInsert, Patch as ProfilePatch, Profile, Update as ProfileUpdate},
    user::{Authenticated, Insert as UserInsert, Login, Session, Signup, User},
};
use crate::core::ports::repository::{ProfileCommon, Store, UserCommon};
use crate::core::ports::tokener::{Claim, Tokener};
use crate::core::services::username::generate_username;
use crate::error::Error;
use crate::request::non_blank;
use chrono::{Duration, Utc};
use hex::ToHex;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};
use uuid::Uuid;
use validator::Validate;

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.finalize().encode_hex()
}

pub fn random_salt() -> String {
    thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect()
}

pub async fn signup<S>(store: &mut S, mut signup: Signup) -> Result<Uuid, Error>
where
    S: Store,
{
    signup.email = signup.email.trim().to_owned();
    signup.username = non_blank(signup.username);
    signup.validate()?;
    if UserCommon::get_by_email(store, &signup.email).await?.is_some() {
        return Err(Error::Conflict("email already registered".into()));
    }
    let username = signup.username.unwrap_or_else(|| generate_username(&mut thread_rng()));
    let salt = random_salt();
    let user = UserCommon::insert(
        store,
        UserInsert {
            email: signup.email,
            password: hash_password(&signup.password, &salt),
            salt,
            username,
        },
    )
    .await?;
    log::info!("user {} signed up", user.id);
    Ok(user.id)
}

pub async fn login<S, T>(store: &mut S, tokener: &T, login: Login, ttl: Duration) -> Result<Authenticated, Error>
where
    S: Store,
    T: Tokener<Claim>,
{
    login.validate()?;
    let user = UserCommon::get_by_email(store, login.email.trim()).await?.ok_or(Error::Unauthorized)?;
    if hash_password(&login.password, &user.salt) != user.password {
        return Err(Error::Unauthorized);
    }
    let profile = ensure_profile(store, &user).await?;
    let claim = Claim {
        user: user.id.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    let token = tokener.gen_token(&claim)?;
    Ok(Authenticated {
        token,
        session: Session {
            user_id: user.id,
            email: user.email,
            member_since: user.created_at,
            profile,
        },
    })
}

/// Returns the user's profile, creating it from the sign-up username on first use.
pub async fn ensure_profile<S>(store: &mut S, user: &User) -> Result<Profile, Error>
where
    S: Store,
{
    if let Some(profile) = ProfileCommon::get(store, user.id).await? {
        return Ok(profile);
    }
    ProfileCommon::insert(
        store,
        ProfileInsert {
            id: user.id,
            username: user.username.clone(),
            avatar_url: None,
        },
    )
    .await
}

pub async fn session<S>(store: &mut S, user_id: Uuid) -> Result<Session, Error>
where
    S: Store,
{
    // a valid token may outlive its account
    let user = UserCommon::get(store, user_id).await?.ok_or(Error::Unauthorized)?;
    let profile = ensure_profile(store, &user).await?;
    Ok(Session {
        user_id: user.id,
        email: user.email,
        member_since: user.created_at,
        profile,
    })
}

pub async fn update_profile<S>(store: &mut S, user_id: Uuid, update: ProfileUpdate) -> Result<Profile, Error>
where
    S: Store,
{
    let update = ProfileUpdate {
        username: update.username.trim().to_owned(),
        avatar_url: non_blank(update.avatar_url),
    };
    update.validate()?;
    session(store, user_id).await?;
    ProfileCommon::update(
        store,
        user_id,
        ProfilePatch {
            username: update.username,
            avatar_url: update.avatar_url,
        },
    )
    .await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::database::memory::MemStore;
    use crate::impls::tokener::jwt::JWT;
    use crate::core::services::username::{ADJECTIVES, NOUNS};

    fn signup_form(email: &str, username: Option<&str>) -> Signup {
        Signup {
            email: email.into(),
            username: username.map(Into::into),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
        }
    }

    fn login_form(email: &str, password: &str) -> Login {
        Login {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn test_hash_password() {
        let salt = random_salt();
        assert_eq!(salt.len(), 32);
        assert_eq!(hash_password("pw", &salt), hash_password("pw", &salt));
        assert_ne!(hash_password("pw", &salt), hash_password("pw", &random_salt()));
        assert_eq!(hash_password("pw", &salt).len(), 64);
    }

    #[tokio::test]
    async fn test_signup_and_login() {
        let mut store = MemStore::new();
        let jwt = JWT::new(b"test-secret".to_vec());
        let id = signup(&mut store, signup_form("ada@example.com", Some("ada_l"))).await.unwrap();
        let auth = login(&mut store, &jwt, login_form("ada@example.com", "hunter22"), Duration::days(1)).await.unwrap();
        assert_eq!(auth.session.user_id, id);
        assert_eq!(auth.session.profile.username, "ada_l");
        let claim: Claim = jwt.verify_token(&auth.token).unwrap();
        assert_eq!(claim.user, id.to_string());
        assert_eq!(store.state.borrow().profiles.len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let mut store = MemStore::new();
        let jwt = JWT::new(b"test-secret".to_vec());
        signup(&mut store, signup_form("ada@example.com", None)).await.unwrap();
        let res = login(&mut store, &jwt, login_form("ada@example.com", "hunter23"), Duration::days(1)).await;
        assert!(matches!(res, Err(Error::Unauthorized)));
        let res = login(&mut store, &jwt, login_form("bob@example.com", "hunter22"), Duration::days(1)).await;
        assert!(matches!(res, Err(Error::Unauthorized)));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let mut store = MemStore::new();
        signup(&mut store, signup_form("ada@example.com", None)).await.unwrap();
        let res = signup(&mut store, signup_form("ada@example.com", None)).await;
        assert!(matches!(res, Err(Error::Conflict(_))));
    }

    #[tokio::test]
    async fn test_blank_username_is_generated() {
        let mut store = MemStore::new();
        let id = signup(&mut store, signup_form("ada@example.com", Some("   "))).await.unwrap();
        let session = session(&mut store, id).await.unwrap();
        assert_eq!(session.member_since, store.state.borrow().users[0].created_at);
        let name = session.profile.username;
        assert!(ADJECTIVES.iter().any(|a| name.starts_with(a)));
        assert!(NOUNS.iter().any(|n| name.ends_with(n)));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let mut store = MemStore::new();
        let id = signup(&mut store, signup_form("ada@example.com", Some("ada_l"))).await.unwrap();
        let profile = update_profile(
            &mut store,
            id,
            ProfileUpdate {
                username: " countess ".into(),
                avatar_url: Some("https://example.com/ada.png".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(profile.username, "countess");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://example.com/ada.png"));

        let res = update_profile(
            &mut store,
            id,
            ProfileUpdate {
                username: "countess".into(),
                avatar_url: Some("not a url".into()),
            },
        )
        .await;
        assert!(matches!(res, Err(Error::ValidationError(_))));

        let profile = update_profile(
            &mut store,
            id,
            ProfileUpdate {
                username: "countess".into(),
                avatar_url: Some("  ".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(profile.avatar_url, None);
    }

    #[tokio::test]
    async fn test_session_of_unknown_user() {
        let mut store = MemStore::new();
        assert!(matches!(session(&mut store, Uuid::new_v4()).await, Err(Error::Unauthorized)));
    }
}
