pub mod health;
pub mod invitations;
pub mod members;
pub mod migrations;
pub mod projects;
