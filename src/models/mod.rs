pub mod pointsmodel;
pub mod questmodel;
pub mod referralmodel;
pub mod usermodel;
