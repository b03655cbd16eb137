pub mod health;
pub mod sse;
pub mod tables;

pub use tables::{
    ActionKind, ActionRequest, CreateTableRequest, JoinRequest, PlayerRequest, ViewQuery,
};
