// db/memory.rs
//
// In-process store with the same uniqueness and atomicity guarantees as the Postgres
// schema: every trait method runs under one lock and validates before it mutates.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    error::StoreError,
    ledgerdb::LedgerExt,
    query_timeout::QueryTimeout,
    questdb::{QuestExt, QUEST_COMPLETIONS_ONCE_IDX},
    referraldb::{ReferralExt, REFERRALS_NO_SELF_REFERRAL, REFERRALS_REFEREE_KEY},
    userdb::{UserExt, USERS_PKEY, USERS_REFERRAL_CODE_KEY},
};
use crate::models::{
    pointsmodel::{PointsCredit, PointsHistory},
    questmodel::{Quest, QuestAction, QuestCompletion},
    referralmodel::Referral,
    usermodel::{NewUser, User},
};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<String, User>,
    referrals: Vec<Referral>,
    quests: BTreeMap<i64, Quest>,
    completions: Vec<QuestCompletion>,
    history: Vec<PointsHistory>,
}

impl MemoryState {
    fn apply_credit(
        &mut self,
        user_id: &str,
        credit: &PointsCredit,
    ) -> Result<PointsHistory, StoreError> {
        let user = self
            .users
            .get_mut(user_id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        user.points += credit.points;
        user.updated_at = Utc::now();

        let entry = PointsHistory {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            points: credit.points,
            activity: credit.activity.clone(),
            created_at: Utc::now(),
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    fn is_invite_quest(&self, quest_id: i64) -> bool {
        self.quests
            .get(&quest_id)
            .map_or(false, |quest| quest.action == QuestAction::Invite)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every call fails the way a timed-out database call does.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout(QueryTimeout::DEFAULT_TIMEOUT));
        }
        Ok(())
    }

    pub async fn add_user(&self, external_id: &str, referral_code: &str) -> User {
        let now = Utc::now();
        let user = User {
            external_id: external_id.to_string(),
            email: None,
            username: None,
            referral_code: referral_code.to_string(),
            points: 0,
            whitelisted: false,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .users
            .insert(external_id.to_string(), user.clone());
        user
    }

    pub async fn add_quest(&self, quest: Quest) {
        self.state.lock().await.quests.insert(quest.id, quest);
    }

    pub async fn balance(&self, external_id: &str) -> i64 {
        self.state
            .lock()
            .await
            .users
            .get(external_id)
            .map_or(0, |user| user.points)
    }

    pub async fn history_sum(&self, external_id: &str) -> i64 {
        self.state
            .lock()
            .await
            .history
            .iter()
            .filter(|entry| entry.user_id == external_id)
            .map(|entry| entry.points)
            .sum()
    }

    pub async fn completions_for(&self, user_id: &str) -> Vec<QuestCompletion> {
        self.state
            .lock()
            .await
            .completions
            .iter()
            .filter(|completion| completion.user_id == user_id)
            .cloned()
            .collect()
    }

    pub async fn referral_count(&self) -> usize {
        self.state.lock().await.referrals.len()
    }
}

/// Quest fixture with a message-based activity label.
pub fn quest_fixture(id: i64, platform: &str, action: QuestAction, target: &str, points: i64) -> Quest {
    Quest {
        id,
        title: format!("Quest {}", id),
        description: None,
        platform: platform.to_string(),
        action,
        target: target.to_string(),
        points,
        message: Some(format!("Completed quest {}", id)),
        expires_at: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(&self, external_id: &str) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.users.get(external_id).cloned())
    }

    async fn get_user_by_referral_code(
        &self,
        referral_code: &str,
    ) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .users
            .values()
            .find(|user| user.referral_code == referral_code)
            .cloned())
    }

    async fn save_user(&self, new_user: &NewUser) -> Result<User, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state.users.contains_key(&new_user.external_id) {
            return Err(StoreError::UniqueViolation(USERS_PKEY.to_string()));
        }
        if state
            .users
            .values()
            .any(|user| user.referral_code == new_user.referral_code)
        {
            return Err(StoreError::UniqueViolation(USERS_REFERRAL_CODE_KEY.to_string()));
        }

        let now = Utc::now();
        let user = User {
            external_id: new_user.external_id.clone(),
            email: new_user.email.clone(),
            username: new_user.username.clone(),
            referral_code: new_user.referral_code.clone(),
            points: 0,
            whitelisted: false,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.external_id.clone(), user.clone());
        Ok(user)
    }

    async fn whitelist_user(
        &self,
        external_id: &str,
        email: &str,
    ) -> Result<Option<User>, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        Ok(state.users.get_mut(external_id).map(|user| {
            user.whitelisted = true;
            user.email = Some(email.to_string());
            user.updated_at = Utc::now();
            user.clone()
        }))
    }
}

#[async_trait]
impl ReferralExt for MemoryStore {
    async fn get_referral_by_referee(
        &self,
        referee_id: &str,
    ) -> Result<Option<Referral>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .referrals
            .iter()
            .find(|referral| referral.referee_id == referee_id)
            .cloned())
    }

    async fn get_referrals_by_referrer(
        &self,
        referrer_id: &str,
    ) -> Result<Vec<Referral>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .referrals
            .iter()
            .rev()
            .filter(|referral| referral.referrer_id == referrer_id)
            .cloned()
            .collect())
    }

    async fn count_referrals(&self, referrer_id: &str) -> Result<i64, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .referrals
            .iter()
            .filter(|referral| referral.referrer_id == referrer_id)
            .count() as i64)
    }

    async fn create_referral_with_credit(
        &self,
        referrer_id: &str,
        referee_id: &str,
        credit: &PointsCredit,
    ) -> Result<Referral, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state
            .referrals
            .iter()
            .any(|referral| referral.referee_id == referee_id)
        {
            return Err(StoreError::UniqueViolation(REFERRALS_REFEREE_KEY.to_string()));
        }
        if referrer_id == referee_id {
            return Err(StoreError::CheckViolation(REFERRALS_NO_SELF_REFERRAL.to_string()));
        }
        if !state.users.contains_key(referrer_id) || !state.users.contains_key(referee_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        let referral = Referral {
            id: Uuid::new_v4(),
            referrer_id: referrer_id.to_string(),
            referee_id: referee_id.to_string(),
            whitelist_bonus_awarded_at: None,
            created_at: Utc::now(),
        };
        state.apply_credit(referrer_id, credit)?;
        state.referrals.push(referral.clone());
        Ok(referral)
    }

    async fn claim_whitelist_bonus(
        &self,
        referee_id: &str,
        credit: &PointsCredit,
    ) -> Result<Option<Referral>, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        let Some(index) = state.referrals.iter().position(|referral| {
            referral.referee_id == referee_id && referral.whitelist_bonus_awarded_at.is_none()
        }) else {
            return Ok(None);
        };

        let referrer_id = state.referrals[index].referrer_id.clone();
        state.apply_credit(&referrer_id, credit)?;

        let referral = &mut state.referrals[index];
        referral.whitelist_bonus_awarded_at = Some(Utc::now());
        Ok(Some(referral.clone()))
    }
}

#[async_trait]
impl QuestExt for MemoryStore {
    async fn get_quest(&self, quest_id: i64) -> Result<Option<Quest>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.quests.get(&quest_id).cloned())
    }

    async fn get_active_quests(&self) -> Result<Vec<Quest>, StoreError> {
        self.check_available()?;
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .quests
            .values()
            .filter(|quest| quest.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn get_quests_by_action(&self, action: &QuestAction) -> Result<Vec<Quest>, StoreError> {
        self.check_available()?;
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .await
            .quests
            .values()
            .filter(|quest| &quest.action == action && quest.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn count_completed_invite_quests(&self, user_id: &str) -> Result<i64, StoreError> {
        self.check_available()?;
        let state = self.state.lock().await;
        Ok(state
            .completions
            .iter()
            .filter(|c| c.user_id == user_id && c.fully_completed && state.is_invite_quest(c.quest_id))
            .count() as i64)
    }

    async fn get_completed_quest_ids(&self, user_id: &str) -> Result<Vec<i64>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .completions
            .iter()
            .filter(|c| c.user_id == user_id && c.fully_completed)
            .map(|c| c.quest_id)
            .collect())
    }

    async fn has_completed_quest(&self, user_id: &str, quest_id: i64) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .completions
            .iter()
            .any(|c| c.user_id == user_id && c.quest_id == quest_id && c.fully_completed))
    }

    async fn record_quest_completion(
        &self,
        user_id: &str,
        quest_id: i64,
        fully_completed: bool,
        credit: Option<&PointsCredit>,
    ) -> Result<QuestCompletion, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if fully_completed
            && state
                .completions
                .iter()
                .any(|c| c.user_id == user_id && c.quest_id == quest_id && c.fully_completed)
        {
            return Err(StoreError::UniqueViolation(QUEST_COMPLETIONS_ONCE_IDX.to_string()));
        }
        if !state.users.contains_key(user_id) || !state.quests.contains_key(&quest_id) {
            return Err(StoreError::Database(sqlx::Error::RowNotFound));
        }

        if let Some(credit) = credit {
            state.apply_credit(user_id, credit)?;
        }
        let completion = QuestCompletion {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            quest_id,
            fully_completed,
            created_at: Utc::now(),
        };
        state.completions.push(completion.clone());
        Ok(completion)
    }
}

#[async_trait]
impl LedgerExt for MemoryStore {
    async fn credit_points(
        &self,
        user_id: &str,
        credit: &PointsCredit,
    ) -> Result<PointsHistory, StoreError> {
        self.check_available()?;
        self.state.lock().await.apply_credit(user_id, credit)
    }

    async fn get_points_history(&self, user_id: &str) -> Result<Vec<PointsHistory>, StoreError> {
        self.check_available()?;
        Ok(self
            .state
            .lock()
            .await
            .history
            .iter()
            .rev()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::join_all;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_credits_sum_to_the_deltas() {
        let store = Arc::new(MemoryStore::new());
        store.add_user("alice", "ALICE00001").await;
        store
            .credit_points("alice", &PointsCredit::new(25, "opening balance"))
            .await
            .unwrap();

        let deltas: Vec<i64> = (1..=50).map(|i| if i % 7 == 0 { -i } else { i }).collect();
        let expected: i64 = 25 + deltas.iter().sum::<i64>();

        let tasks = deltas.into_iter().map(|delta| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .credit_points("alice", &PointsCredit::new(delta, "quest"))
                    .await
            })
        });
        for result in join_all(tasks).await {
            result.unwrap().unwrap();
        }

        assert_eq!(store.balance("alice").await, expected);
        assert_eq!(store.history_sum("alice").await, expected);
    }

    #[tokio::test]
    async fn credit_to_unknown_user_leaves_no_entry() {
        let store = MemoryStore::new();
        let result = store
            .credit_points("ghost", &PointsCredit::new(10, "referral"))
            .await;

        assert!(matches!(result, Err(StoreError::Database(_))));
        assert!(store.get_points_history("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_referral_insert_credits_nobody() {
        let store = MemoryStore::new();
        store.add_user("alice", "ALICE00001").await;
        store.add_user("bob", "BOB0000001").await;
        store.add_user("carol", "CAROL00001").await;
        let credit = PointsCredit::new(100, "referral");

        store
            .create_referral_with_credit("alice", "bob", &credit)
            .await
            .unwrap();
        let duplicate = store
            .create_referral_with_credit("carol", "bob", &credit)
            .await;

        assert!(matches!(duplicate, Err(StoreError::UniqueViolation(ref c)) if c == REFERRALS_REFEREE_KEY));
        assert_eq!(store.balance("alice").await, 100);
        assert_eq!(store.balance("carol").await, 0);
        assert_eq!(store.referral_count().await, 1);
    }

    #[tokio::test]
    async fn self_referral_edge_is_rejected_like_the_check_constraint() {
        let store = MemoryStore::new();
        store.add_user("alice", "ALICE00001").await;

        let result = store
            .create_referral_with_credit("alice", "alice", &PointsCredit::new(100, "referral"))
            .await;

        assert!(matches!(result, Err(StoreError::CheckViolation(ref c)) if c == REFERRALS_NO_SELF_REFERRAL));
        assert_eq!(store.balance("alice").await, 0);
        assert_eq!(store.referral_count().await, 0);
    }

    #[tokio::test]
    async fn expired_quests_are_not_fetched_by_action() {
        let store = MemoryStore::new();
        let mut expired = quest_fixture(1, "pay3", QuestAction::Invite, "1", 50);
        expired.expires_at = Some(Utc::now() - chrono::Duration::days(1));
        store.add_quest(expired).await;
        store.add_quest(quest_fixture(2, "pay3", QuestAction::Invite, "2", 100)).await;

        let ids: Vec<i64> = store
            .get_quests_by_action(&QuestAction::Invite)
            .await
            .unwrap()
            .iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![2]);
    }
}
