//! In-memory collaborator fakes shared by the engine and handler tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::identity::service::IdentityDirectory;
use crate::reset::model::Challenge;
use crate::reset::service::Notifier;
use crate::reset::store::OtpStore;

pub struct MemStore {
    records: Mutex<HashMap<String, Challenge>>,
    pub reads: AtomicUsize,
    pub vanish_on_delete: AtomicBool,
}

impl MemStore {
    pub fn new() -> Self {
        MemStore {
            records: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            vanish_on_delete: AtomicBool::new(false),
        }
    }

    pub fn insert(&self, challenge: Challenge) {
        self.records
            .lock()
            .unwrap()
            .insert(challenge.email.clone(), challenge);
    }

    pub fn stored_code(&self, email: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(email)
            .map(|c| c.code.clone())
    }

    pub fn contains(&self, email: &str) -> bool {
        self.records.lock().unwrap().contains_key(email)
    }
}

#[async_trait]
impl OtpStore for MemStore {
    async fn put(&self, challenge: &Challenge) -> Result<(), String> {
        self.insert(challenge.clone());
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<Challenge>, String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(email).cloned())
    }

    async fn delete_if_code_matches(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Option<Challenge>, String> {
        if self.vanish_on_delete.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let mut records = self.records.lock().unwrap();
        match records.get(email) {
            Some(c) if c.code == code => Ok(records.remove(email)),
            _ => Ok(None),
        }
    }
}

pub struct MemDirectory {
    passwords: Mutex<HashMap<String, String>>,
    pub fail_updates: AtomicBool,
}

impl MemDirectory {
    pub fn with_account(email: &str, password: &str) -> Self {
        let mut passwords = HashMap::new();
        passwords.insert(email.to_string(), password.to_string());
        MemDirectory {
            passwords: Mutex::new(passwords),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn password_of(&self, email: &str) -> Option<String> {
        self.passwords.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl IdentityDirectory for MemDirectory {
    async fn exists(&self, email: &str) -> Result<bool, String> {
        Ok(self.passwords.lock().unwrap().contains_key(email))
    }

    async fn set_password(&self, email: &str, new_password: &str) -> Result<(), String> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err("directory offline".to_string());
        }
        self.passwords
            .lock()
            .unwrap()
            .insert(email.to_string(), new_password.to_string());
        Ok(())
    }
}

pub struct MemNotifier {
    sent: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

impl MemNotifier {
    pub fn new() -> Self {
        MemNotifier {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn last_code(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl Notifier for MemNotifier {
    async fn deliver(&self, email: &str, code: &str) -> Result<(), String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err("smtp unreachable".to_string());
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}
