//! # Session
//!
//! Login state persisted in the durable store: the bearer token, the
//! signed-in user and the day-level stats the POS headers show.

use std::sync::Arc;

use tracing::{info, warn};

use posflow_core::{DailyStats, User};

use crate::error::ClientResult;
use crate::product_cache::ProductCache;
use crate::storage::{keys, KeyValueStore};
use crate::token::TokenCache;

/// Durable login state.
pub struct Session {
    durable: Arc<dyn KeyValueStore>,
    tokens: Arc<TokenCache>,
    products: Arc<ProductCache>,
}

impl Session {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        tokens: Arc<TokenCache>,
        products: Arc<ProductCache>,
    ) -> Self {
        Session {
            durable,
            tokens,
            products,
        }
    }

    /// The stored user record, if any. A record that no longer parses is
    /// treated as signed out.
    pub fn current_user(&self) -> Option<User> {
        match self.durable.get_json::<User>(keys::USER) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user record is unreadable");
                None
            }
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.tokens.get_token().is_some()
    }

    /// Persists token and user and primes the token cache.
    pub fn login(&self, token: &str, user: &User) -> ClientResult<()> {
        self.durable.set_json(keys::USER, user)?;
        self.tokens.set_token(token)?;
        info!(user_id = %user.id, role = ?user.role, "Logged in");
        Ok(())
    }

    /// Forgets the credential, the user and every cached catalog copy.
    ///
    /// The in-memory tiers are cleared first and both durable keys are
    /// attempted even if one removal fails; the first storage error is
    /// returned.
    pub fn logout(&self) -> ClientResult<()> {
        self.tokens.invalidate();
        self.products.invalidate();

        let token = self.durable.remove(keys::TOKEN);
        let user = self.durable.remove(keys::USER);
        if let Err(e) = token.as_ref().and(user.as_ref()) {
            warn!(error = %e, "Logout could not clear durable storage");
        }
        token.and(user)?;

        info!("Logged out");
        Ok(())
    }

    /// Today's figures as last written by the POS; zeroed when absent.
    pub fn daily_stats(&self) -> DailyStats {
        match self.durable.get_json::<DailyStats>(keys::TODAY_STATS) {
            Ok(stats) => stats.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Stored daily stats are unreadable");
                DailyStats::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::storage::MemoryStore;
    use posflow_core::{Money, Product, Role};
    use std::time::Duration;

    /// Durable store whose removals always fail.
    struct StuckStore(MemoryStore);

    impl KeyValueStore for StuckStore {
        fn get(&self, key: &str) -> ClientResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> ClientResult<()> {
            self.0.set(key, value)
        }

        fn remove(&self, _key: &str) -> ClientResult<()> {
            Err(ClientError::Storage("disk is read-only".into()))
        }
    }

    fn lager() -> Product {
        Product {
            id: "1".into(),
            name: "Lager".into(),
            price: Money::from_major(150),
            quantity: 3,
            category: None,
            barcode: None,
        }
    }

    fn session() -> (Session, Arc<dyn KeyValueStore>, Arc<ProductCache>) {
        let durable: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenCache::new(durable.clone()));
        let products = Arc::new(ProductCache::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(5),
        ));
        (
            Session::new(durable.clone(), tokens, products.clone()),
            durable,
            products,
        )
    }

    fn cashier() -> User {
        User {
            id: "u-1".into(),
            name: "Amina".into(),
            email: None,
            role: Role::Cashier,
            business_type: None,
        }
    }

    #[test]
    fn test_login_then_logout() {
        let (session, durable, products) = session();
        assert!(!session.is_logged_in());
        assert_eq!(session.current_user(), None);

        session.login("tok", &cashier()).unwrap();
        assert!(session.is_logged_in());
        assert_eq!(session.current_user(), Some(cashier()));

        products.store(vec![lager()]);

        session.logout().unwrap();
        assert!(!session.is_logged_in());
        assert_eq!(session.current_user(), None);
        assert_eq!(durable.get(keys::TOKEN).unwrap(), None);
        assert_eq!(products.cached(), None);
    }

    #[test]
    fn test_logout_clears_memory_tiers_when_storage_fails() {
        let durable: Arc<dyn KeyValueStore> = Arc::new(StuckStore(MemoryStore::new()));
        let tokens = Arc::new(TokenCache::new(durable.clone()));
        let products = Arc::new(ProductCache::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(5),
        ));
        let session = Session::new(durable.clone(), tokens.clone(), products.clone());

        session.login("tok", &cashier()).unwrap();
        assert_eq!(tokens.get_token().as_deref(), Some("tok"));
        products.store(vec![lager()]);

        let err = session.logout().unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));
        assert_eq!(products.cached(), None);
        // The durable copy survived, so the token is read back from storage.
        assert_eq!(durable.get(keys::TOKEN).unwrap().as_deref(), Some("tok"));
    }

    #[test]
    fn test_daily_stats() {
        let (session, durable, _) = session();
        assert_eq!(session.daily_stats(), DailyStats::default());

        durable
            .set(keys::TODAY_STATS, r#"{"totalSales": 980.5, "transactionCount": 12}"#)
            .unwrap();
        let stats = session.daily_stats();
        assert_eq!(stats.total_sales.minor(), 98_050);
        assert_eq!(stats.transaction_count, 12);
    }

    #[test]
    fn test_unreadable_user_is_signed_out() {
        let (session, durable, _) = session();
        durable.set(keys::USER, "[]").unwrap();
        assert_eq!(session.current_user(), None);
    }
}
