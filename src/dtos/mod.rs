pub mod rewarddtos;
