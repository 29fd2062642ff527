pub mod board;
pub mod moderation;
