//! User credential rules, password hashing and login throttling

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Duration;
use regex::Regex;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::User;

pub const MIN_NAME_LEN: usize = 5;
pub const MIN_PASSWORD_LEN: usize = 8;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"))
}

fn is_special(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Check a display name; returns the normalized (trimmed) name
pub fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    let lowered = trimmed.to_lowercase();

    if lowered.chars().count() < MIN_NAME_LEN {
        return Err(Error::Validation("Name too short".into()));
    }
    if lowered.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::Validation("No numbers allowed in name".into()));
    }
    if lowered.chars().any(|c| is_special(c) && c != '-') {
        return Err(Error::Validation(
            "No special characters allowed in name".into(),
        ));
    }
    Ok(trimmed.to_string())
}

/// Check an email address shape; returns it trimmed and lowercased
pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(Error::Validation(format!("Not an email address: {}", email)));
    }
    Ok(email)
}

/// Password strength rules
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation("Password too short".into()));
    }
    if !password.chars().any(is_special) {
        return Err(Error::Validation("Missing special character".into()));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(Error::Validation("Missing lowercase letter".into()));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(Error::Validation("Missing uppercase letter".into()));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::Validation("Missing number".into()));
    }
    Ok(())
}

/// Hash a password into an Argon2id PHC string (random salt)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::Encryption(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored PHC string
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Per-email login attempt counter
///
/// Every attempt inside the window counts; once `max_attempts` is reached the
/// email is locked until `window` has passed since the last attempt. A
/// successful login clears the counter.
pub struct LoginLimiter {
    max_attempts: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    attempts: Mutex<HashMap<String, (u32, chrono::DateTime<chrono::Utc>)>>,
}

impl LoginLimiter {
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_attempts: config.max_login_attempts,
            window: Duration::from_std(config.lockout).unwrap_or_else(|_| Duration::minutes(15)),
            clock,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt; errors if the email is currently locked out
    pub fn check(&self, email: &str) -> Result<()> {
        let now = self.clock.now();
        let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        attempts.retain(|_, (_, last)| now - *last <= self.window);

        match attempts.get_mut(email) {
            Some((count, last)) => {
                if now - *last > self.window {
                    *count = 1;
                    *last = now;
                    return Ok(());
                }
                if *count >= self.max_attempts {
                    warn!("Login rate limit hit for {}", email);
                    return Err(Error::RateLimited(email.to_string()));
                }
                *count += 1;
                *last = now;
                Ok(())
            }
            None => {
                attempts.insert(email.to_string(), (1, now));
                Ok(())
            }
        }
    }

    /// Emails with a live attempt counter
    pub fn tracked(&self) -> usize {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn reset(&self, email: &str) {
        self.attempts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(email);
    }
}

/// Register a new user after validating all fields
pub fn register(db: &Database, name: &str, email: &str, password: &str) -> Result<User> {
    let email = validate_email(email)?;
    validate_password(password)?;
    let name = validate_name(name)?;

    if db.get_user_by_email(&email)?.is_some() {
        return Err(Error::Validation("Email already registered".into()));
    }

    let hash = hash_password(password)?;
    let id = db.create_user(&name, &email, &hash)?;
    debug!("Registered user {} ({})", id, email);
    db.get_user(id)?
        .ok_or_else(|| Error::NotFound(format!("user {}", id)))
}

/// Check credentials, applying the login rate limit
pub fn login(db: &Database, limiter: &LoginLimiter, email: &str, password: &str) -> Result<User> {
    if !email.contains('@') {
        return Err(Error::Validation("This is not an email".into()));
    }
    let email = email.trim().to_lowercase();

    limiter.check(&email)?;

    let Some((user, stored)) = db.get_user_credentials(&email)? else {
        return Err(Error::Unauthorized);
    };

    if !verify_password(password, &stored) {
        return Err(Error::Unauthorized);
    }

    limiter.reset(&email);
    Ok(user)
}

/// Update name and/or email of the user identified by `email`
pub fn update_user_info(
    db: &Database,
    email: &str,
    name: Option<&str>,
    new_email: Option<&str>,
) -> Result<User> {
    let email = email.trim().to_lowercase();
    let user = db
        .get_user_by_email(&email)?
        .ok_or_else(|| Error::NotFound(format!("user {}", email)))?;

    let name = name.map(validate_name).transpose()?;
    let new_email = match new_email {
        Some(e) => {
            let e = validate_email(e)?;
            if e != user.email && db.get_user_by_email(&e)?.is_some() {
                return Err(Error::Validation("Email already registered".into()));
            }
            Some(e)
        }
        None => None,
    };

    if name.is_none() && new_email.is_none() {
        return Err(Error::Validation("No changes were provided".into()));
    }

    db.update_user(user.id, name.as_deref(), new_email.as_deref())?;
    db.get_user(user.id)?
        .ok_or_else(|| Error::NotFound(format!("user {}", user.id)))
}

/// Change a password after verifying the old one
pub fn update_password(
    db: &Database,
    email: &str,
    old_password: &str,
    new_password: &str,
    confirm: &str,
) -> Result<()> {
    let email = email.trim().to_lowercase();
    let Some((user, stored)) = db.get_user_credentials(&email)? else {
        return Err(Error::NotFound(format!("user {}", email)));
    };

    if !verify_password(old_password, &stored) {
        return Err(Error::Unauthorized);
    }
    validate_password(new_password)?;
    if new_password != confirm {
        return Err(Error::Validation(
            "The password confirmation does not match".into(),
        ));
    }

    db.set_password_hash(user.id, &hash_password(new_password)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;

    const GOOD_PASSWORD: &str = "Sup3r!secret";

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Alice Smith ").unwrap(), "Alice Smith");
        assert!(validate_name("Bob").is_err());
        assert!(validate_name("Alice99").is_err());
        assert!(validate_name("Alice@Home").is_err());
        assert!(validate_name("Mary-Jane").is_ok());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(
            validate_email(" Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert!(validate_email("alice.example.com").is_err());
        assert!(validate_email("alice@example").is_err());
    }

    #[test]
    fn test_validate_password_rules() {
        assert!(validate_password(GOOD_PASSWORD).is_ok());
        assert!(validate_password("S3!a").is_err());
        assert!(validate_password("Sup3rsecret").is_err());
        assert!(validate_password("SUP3R!SECRET").is_err());
        assert!(validate_password("sup3r!secret").is_err());
        assert!(validate_password("Super!secret").is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password(GOOD_PASSWORD).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(GOOD_PASSWORD, &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password(GOOD_PASSWORD, "not-a-phc-string"));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password(GOOD_PASSWORD).unwrap();
        let b = hash_password(GOOD_PASSWORD).unwrap();
        assert_ne!(a, b);
    }

    fn limiter(clock: Arc<ManualClock>) -> LoginLimiter {
        LoginLimiter::with_clock(&AuthConfig::default(), clock)
    }

    #[test]
    fn test_limiter_blocks_after_max_attempts() {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let limiter = limiter(clock.clone());

        for _ in 0..5 {
            limiter.check("a@b.co").unwrap();
            clock.advance(Duration::seconds(10));
        }
        assert!(matches!(
            limiter.check("a@b.co"),
            Err(Error::RateLimited(_))
        ));
        // Other emails are unaffected
        assert!(limiter.check("c@d.co").is_ok());
    }

    #[test]
    fn test_limiter_window_expires() {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let limiter = limiter(clock.clone());

        for _ in 0..5 {
            limiter.check("a@b.co").unwrap();
        }
        assert!(limiter.check("a@b.co").is_err());

        clock.advance(Duration::minutes(16));
        assert!(limiter.check("a@b.co").is_ok());
    }

    #[test]
    fn test_limiter_forgets_expired_emails() {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let limiter = limiter(clock.clone());

        for n in 0..50 {
            limiter.check(&format!("user{}@b.co", n)).unwrap();
        }
        assert_eq!(limiter.tracked(), 50);

        clock.advance(Duration::minutes(16));
        limiter.check("late@b.co").unwrap();
        assert_eq!(limiter.tracked(), 1);
    }

    #[test]
    fn test_limiter_reset() {
        let clock = Arc::new(ManualClock::new(
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        ));
        let limiter = limiter(clock);

        for _ in 0..5 {
            limiter.check("a@b.co").unwrap();
        }
        limiter.reset("a@b.co");
        assert!(limiter.check("a@b.co").is_ok());
    }

    #[test]
    fn test_register_and_login() {
        let db = Database::in_memory().unwrap();
        let user = register(&db, "Alice Smith", "alice@example.com", GOOD_PASSWORD).unwrap();
        assert_eq!(user.email, "alice@example.com");

        let limiter = LoginLimiter::new(&AuthConfig::default());
        let logged_in = login(&db, &limiter, "Alice@Example.com", GOOD_PASSWORD).unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(matches!(
            login(&db, &limiter, "alice@example.com", "Wrong!pass1"),
            Err(Error::Unauthorized)
        ));
        assert!(matches!(
            login(&db, &limiter, "nobody@example.com", GOOD_PASSWORD),
            Err(Error::Unauthorized)
        ));
        assert!(login(&db, &limiter, "not-an-email", GOOD_PASSWORD).is_err());
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let db = Database::in_memory().unwrap();
        register(&db, "Alice Smith", "alice@example.com", GOOD_PASSWORD).unwrap();
        let err = register(&db, "Alice Jones", "ALICE@example.com", GOOD_PASSWORD).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_update_user_info() {
        let db = Database::in_memory().unwrap();
        register(&db, "Alice Smith", "alice@example.com", GOOD_PASSWORD).unwrap();

        let updated =
            update_user_info(&db, "alice@example.com", Some("Alice Jones"), Some("aj@example.com"))
                .unwrap();
        assert_eq!(updated.name, "Alice Jones");
        assert_eq!(updated.email, "aj@example.com");

        assert!(update_user_info(&db, "aj@example.com", None, None).is_err());
        assert!(update_user_info(&db, "aj@example.com", Some("Al"), None).is_err());
    }

    #[test]
    fn test_update_password() {
        let db = Database::in_memory().unwrap();
        register(&db, "Alice Smith", "alice@example.com", GOOD_PASSWORD).unwrap();

        assert!(matches!(
            update_password(&db, "alice@example.com", "Wrong!pass1", "N3w!Passw0rd", "N3w!Passw0rd"),
            Err(Error::Unauthorized)
        ));
        assert!(update_password(
            &db,
            "alice@example.com",
            GOOD_PASSWORD,
            "N3w!Passw0rd",
            "N3w!Passw0rdX"
        )
        .is_err());

        update_password(&db, "alice@example.com", GOOD_PASSWORD, "N3w!Passw0rd", "N3w!Passw0rd")
            .unwrap();

        let limiter = LoginLimiter::new(&AuthConfig::default());
        assert!(login(&db, &limiter, "alice@example.com", "N3w!Passw0rd").is_ok());
        assert!(login(&db, &limiter, "alice@example.com", GOOD_PASSWORD).is_err());
    }
}
