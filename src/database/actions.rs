pub mod labels;
pub mod recipes;
pub mod tokens;
pub mod users;
