//! LearnHub API - Backend for an online course marketplace
//!
//! This crate provides the REST API for LearnHub, enabling:
//! - Account signup and token-based signin
//! - An admin-curated category catalog with cover images
//! - Instructor-owned courses with cover images and pricing
//! - Video lessons attached to courses
//! - Learner enrollment in courses

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod routes;
pub mod state;
pub mod storage;
