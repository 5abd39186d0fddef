// dtos/rewarddtos.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 128, message = "External id is required"))]
    pub external_id: String,

    #[validate(email(message = "Email is invalid"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 64, message = "Username must be between 1-64 characters"))]
    pub username: Option<String>,

    #[validate(length(min = 1, max = 32, message = "Referral code must be between 1-32 characters"))]
    pub referral_code: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UseReferralDto {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_external_id: String,

    #[validate(length(min = 1, max = 32, message = "Referral code is required"))]
    pub referral_code: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistDto {
    #[validate(length(min = 1, message = "User id is required"))]
    pub external_id: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteQuestDto {
    #[validate(length(min = 1, message = "User id is required"))]
    pub external_id: String,

    #[validate(range(min = 1, message = "Quest id must be positive"))]
    pub quest_id: i64,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteQuestDto {
    #[validate(length(min = 1, message = "User id is required"))]
    pub external_id: String,
}
