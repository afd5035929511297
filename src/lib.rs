//! 家教平台后端
//! 账户注册与验证、访问令牌生命周期、角色授权、科目与导师登记

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
