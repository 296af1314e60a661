mod chat;
mod health;
mod helpers;
mod keys;
mod predict;
mod weather;
