use rand::Rng;

const REFERRAL_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const REFERRAL_CODE_LEN: usize = 10;

pub fn generate_referral_code() -> String {
    let mut rng = rand::rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| REFERRAL_CODE_CHARSET[rng.random_range(0..REFERRAL_CODE_CHARSET.len())] as char)
        .collect()
}
