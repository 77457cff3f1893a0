use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use crate::reset::model::Challenge;

/// One challenge slot per email. The store is the sole arbiter under
/// concurrent requests, so both writes are single atomic operations.
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Replace any pending challenge for the email with this one
    async fn put(&self, challenge: &Challenge) -> Result<(), String>;

    async fn get(&self, email: &str) -> Result<Option<Challenge>, String>;

    /// Atomically remove the challenge for `email` if it still carries
    /// `code`; `None` means another call consumed it first.
    async fn delete_if_code_matches(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<Challenge>, String>;
}

pub struct MongoOtpStore {
    collection: Collection<Challenge>,
}

impl MongoOtpStore {
    pub fn new(client: &Client) -> Self {
        let db = client.database("reset_db");
        let collection = db.collection::<Challenge>("password_resets");

        MongoOtpStore { collection }
    }
}

#[async_trait]
impl OtpStore for MongoOtpStore {
    async fn put(&self, challenge: &Challenge) -> Result<(), String> {
        self.collection
            .replace_one(doc! { "email": &challenge.email }, challenge)
            .upsert(true)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<Challenge>, String> {
        self.collection
            .find_one(doc! { "email": email })
            .await
            .map_err(|e| e.to_string())
    }

    async fn delete_if_code_matches(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<Challenge>, String> {
        self.collection
            .find_one_and_delete(doc! { "email": email, "code": code })
            .await
            .map_err(|e| e.to_string())
    }
}
