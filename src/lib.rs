//! Helm AI - AI Orchestration Core for Project Management
//!
//! This crate mediates between a project-management data store and
//! interchangeable LLM backends to produce structured artifacts:
//! validation issues, improvement proposals, insights, and answers.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
