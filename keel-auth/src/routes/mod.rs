pub mod health;
pub mod login;
pub mod logout;
pub mod me;
pub mod oauth;
pub mod refresh;
pub mod register;
