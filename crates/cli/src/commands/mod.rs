pub mod health;
pub mod interactive;
pub mod predict;
