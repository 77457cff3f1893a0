use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::{Client, Collection};

use crate::identity::model::User;
use crate::utils::hashing;

/// Account lookup and credential update, kept narrow so the reset engine
/// never sees the rest of the user record.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn exists(&self, email: &str) -> Result<bool, String>;

    /// Hash and store a new credential for the account
    async fn set_password(&self, email: &str, new_password: &str) -> Result<(), String>;
}

pub struct MongoUserDirectory {
    collection: Collection<User>,
}

impl MongoUserDirectory {
    pub fn new(client: &Client) -> Self {
        let db = client.database("reset_db");
        let collection = db.collection::<User>("users");

        MongoUserDirectory { collection }
    }
}

#[async_trait]
impl IdentityDirectory for MongoUserDirectory {
    async fn exists(&self, email: &str) -> Result<bool, String> {
        let count = self
            .collection
            .count_documents(doc! { "email": email })
            .await
            .map_err(|e| e.to_string())?;
        Ok(count > 0)
    }

    async fn set_password(&self, email: &str, new_password: &str) -> Result<(), String> {
        let hashed_password = hashing::hash_password(new_password).map_err(|e| e.to_string())?;

        let result = self
            .collection
            .update_one(
                doc! { "email": email },
                doc! {
                    "$set": {
                        "password": hashed_password,
                        "updated_at": Utc::now().to_rfc3339()
                    }
                },
            )
            .await
            .map_err(|e| e.to_string())?;

        if result.matched_count == 0 {
            return Err(format!("no account found for {}", email));
        }

        Ok(())
    }
}
