pub mod error;
pub mod invite_checker;
pub mod quest_checker;
pub mod quest_service;
pub mod referral;
pub mod referral_service;
pub mod rewards_engine;
pub mod telegram_checker;
pub mod whitelist_service;
